//! Wire types shared by the simulated server and the polling client.
//!
//! [`StatusResponse`] is the JSON body of `GET /status`. The simulation
//! outcome lives in the body; the HTTP status line is 200 for all three
//! [`JobStatus`] values.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lifecycle status of the simulated translation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Completed,
    Error,
}

impl JobStatus {
    /// `completed` and `error` are terminal: no further transitions occur.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// Body of a `GET /status` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: JobStatus,
    /// Seconds since the job was created, measured when the response was built.
    pub elapsed_time: f64,
    /// Human-readable detail, set when `status` is `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn pending(elapsed: Duration) -> Self {
        Self {
            status: JobStatus::Pending,
            elapsed_time: elapsed.as_secs_f64(),
            message: None,
        }
    }

    pub fn completed(elapsed: Duration) -> Self {
        Self {
            status: JobStatus::Completed,
            elapsed_time: elapsed.as_secs_f64(),
            message: None,
        }
    }

    pub fn error(elapsed: Duration, message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Error,
            elapsed_time: elapsed.as_secs_f64(),
            message: Some(message.into()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
