mod backoff;
mod config;
mod error;
mod orchestrator;

pub use backoff::BackoffPolicy;
pub use config::StatusPollingConfig;
pub use error::{ObserverError, PollError, SessionSnapshot};
pub use orchestrator::{PollingOrchestrator, StatusObserver};
