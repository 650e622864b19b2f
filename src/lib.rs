//! Simulated video translation backend and an adaptive status polling client.
//!
//! The server side ([`simulation`], [`server`]) answers `GET /status` for a
//! single job whose status depends only on elapsed time and a fixed error
//! probability. The client side ([`client`], [`polling`]) polls that endpoint
//! with exponential backoff under a hard deadline.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod polling;
pub mod server;
pub mod simulation;
pub mod status;
pub mod ui;

pub use client::{FetchError, StatusSource, TranslationClient};
pub use error::{AppError, ConfigError};
pub use polling::{PollError, PollingOrchestrator, StatusObserver, StatusPollingConfig};
pub use status::{JobStatus, StatusResponse};
