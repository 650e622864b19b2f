//! Axum server exposing the simulated job at `GET /status`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::ConfigError;
use crate::simulation::{Job, StatusSimulationEngine};
use crate::status::{JobStatus, StatusResponse};

/// Parameters of the simulated server, validated on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawServerSettings", into = "RawServerSettings")]
pub struct ServerSettings {
    completion_time: f64,
    error_rate: f64,
    port: u16,
    start_on_first_request: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawServerSettings {
    #[serde(default = "default_completion_time")]
    completion_time: f64,
    #[serde(default = "default_error_rate")]
    error_rate: f64,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default)]
    start_on_first_request: bool,
}

fn default_completion_time() -> f64 {
    10.0
}

fn default_error_rate() -> f64 {
    0.1
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            completion_time: default_completion_time(),
            error_rate: default_error_rate(),
            port: default_port(),
            start_on_first_request: false,
        }
    }
}

impl TryFrom<RawServerSettings> for ServerSettings {
    type Error = ConfigError;

    fn try_from(raw: RawServerSettings) -> Result<Self, Self::Error> {
        Ok(Self::new(raw.completion_time, raw.error_rate, raw.port)?
            .with_start_on_first_request(raw.start_on_first_request))
    }
}

impl From<ServerSettings> for RawServerSettings {
    fn from(settings: ServerSettings) -> Self {
        Self {
            completion_time: settings.completion_time,
            error_rate: settings.error_rate,
            port: settings.port,
            start_on_first_request: settings.start_on_first_request,
        }
    }
}

impl ServerSettings {
    /// `completion_time` is in seconds. Port 0 binds an ephemeral port.
    pub fn new(completion_time: f64, error_rate: f64, port: u16) -> Result<Self, ConfigError> {
        if !completion_time.is_finite() || completion_time < 0.0 {
            return Err(ConfigError::CompletionTime(completion_time));
        }
        if Duration::try_from_secs_f64(completion_time).is_err() {
            return Err(ConfigError::TooLarge {
                field: "completion_time",
                secs: completion_time,
            });
        }
        if !(0.0..=1.0).contains(&error_rate) {
            return Err(ConfigError::ErrorRate(error_rate));
        }
        Ok(Self {
            completion_time,
            error_rate,
            port,
            start_on_first_request: false,
        })
    }

    /// Starts the job clock on the first request instead of at startup.
    pub fn with_start_on_first_request(mut self, lazy: bool) -> Self {
        self.start_on_first_request = lazy;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn completion_time(&self) -> Duration {
        Duration::from_secs_f64(self.completion_time)
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn start_on_first_request(&self) -> bool {
        self.start_on_first_request
    }

    fn create_job(&self) -> Job {
        Job::unchecked(Instant::now(), self.completion_time(), self.error_rate)
    }
}

/// Shared state: the settings and the one job they describe.
pub struct AppState {
    settings: ServerSettings,
    job: OnceLock<Job>,
}

impl AppState {
    pub fn new(settings: ServerSettings) -> Self {
        let state = Self {
            settings,
            job: OnceLock::new(),
        };
        if !state.settings.start_on_first_request() {
            let job = state.job();
            tracing::info!(job_id = %job.id(), "job created at startup");
        }
        state
    }

    pub fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// The job, created on first use when lazy start is configured.
    pub fn job(&self) -> &Job {
        self.job.get_or_init(|| self.settings.create_job())
    }

    /// Whether the job clock has started.
    pub fn job_started(&self) -> bool {
        self.job.get().is_some()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(handle_status))
        .with_state(state)
}

async fn handle_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let job = state.job();
    let response = StatusSimulationEngine::query(job, Instant::now());
    match response.status {
        JobStatus::Pending => tracing::info!(
            job_id = %job.id(),
            elapsed_time = response.elapsed_time,
            "returning pending status"
        ),
        status => tracing::info!(job_id = %job.id(), %status, "returning terminal status"),
    }
    Json(response)
}

/// Binds the listener on localhost at the configured port.
pub async fn bind(settings: &ServerSettings) -> std::io::Result<TcpListener> {
    TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], settings.port()))).await
}

/// Serves `state` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "server started");
    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}

/// A server running on a background task.
pub struct RunningServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl RunningServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Stops accepting connections and waits for the task to finish.
    pub async fn shutdown(self) -> std::io::Result<()> {
        // The receiver only disappears once the task has already ended.
        let _ = self.shutdown.send(());
        self.handle.await.map_err(std::io::Error::other)?
    }
}

/// Binds and serves on a background task.
pub async fn spawn(settings: ServerSettings) -> std::io::Result<RunningServer> {
    let listener = bind(&settings).await?;
    let addr = listener.local_addr()?;
    let state = Arc::new(AppState::new(settings));
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(serve(listener, Arc::clone(&state), async move {
        let _ = rx.await;
    }));
    Ok(RunningServer {
        addr,
        state,
        shutdown: tx,
        handle,
    })
}
