mod engine;
mod job;

pub use engine::StatusSimulationEngine;
pub use job::{Job, Outcome};
