use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use translation_status::cli::{Cli, Command, ServeArgs};
use translation_status::config::AppConfig;
use translation_status::server::{self, AppState, ServerSettings};
use translation_status::ui::StatusProgress;
use translation_status::{AppError, JobStatus, PollingOrchestrator, StatusPollingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = AppConfig::load(cli.config.as_deref())?;

    let code = match cli.command {
        Command::Serve(args) => {
            run_server(server_settings(&config.server, &args)?).await?;
            ExitCode::SUCCESS
        }
        Command::Poll { url, timeout } => {
            let base_url = url.unwrap_or(config.base_url);
            let polling = match timeout {
                Some(timeout) => config.polling.with_timeout(timeout).map_err(AppError::from)?,
                None => config.polling,
            };
            poll(&base_url, polling).await?
        }
        Command::Demo(args) => {
            // Ephemeral port unless one was asked for explicitly.
            let settings = server_settings(&config.server.clone().with_port(0), &args)?;
            let running = server::spawn(settings).await.map_err(AppError::from)?;
            println!("Server started on {}", running.base_url());
            let result = poll(&running.base_url(), config.polling).await;
            running.shutdown().await.map_err(AppError::from)?;
            result?
        }
    };
    Ok(code)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Applies CLI overrides on top of the configured settings.
fn server_settings(base: &ServerSettings, args: &ServeArgs) -> Result<ServerSettings, AppError> {
    let settings = ServerSettings::new(
        args.completion_time
            .unwrap_or_else(|| base.completion_time().as_secs_f64()),
        args.error_rate.unwrap_or(base.error_rate()),
        args.port.unwrap_or(base.port()),
    )?
    .with_start_on_first_request(args.lazy_start || base.start_on_first_request());
    Ok(settings)
}

async fn run_server(settings: ServerSettings) -> Result<(), AppError> {
    let listener = server::bind(&settings).await?;
    let state = Arc::new(AppState::new(settings));
    server::serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
        }
        tracing::info!("shutting down");
    })
    .await?;
    Ok(())
}

async fn poll(base_url: &str, config: StatusPollingConfig) -> Result<ExitCode, AppError> {
    let orchestrator =
        PollingOrchestrator::for_url(base_url, config)?.with_observer(StatusProgress::start(base_url));

    let result = orchestrator.poll_until_complete().await;
    match result {
        Ok(response) => {
            orchestrator.observer().finish(&response);
            Ok(if response.status == JobStatus::Completed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Err(e) => {
            orchestrator.observer().abandon();
            Err(e.into())
        }
    }
}
