use std::time::Instant;

use super::job::{Job, Outcome};
use crate::status::StatusResponse;

const FAILURE_MESSAGE: &str = "video translation failed";

/// Computes the status of a [`Job`] from elapsed time.
///
/// Before `completion_time` the answer is always `pending`. From then on it is
/// the job's terminal outcome, decided by the first query to cross the
/// threshold and replayed for every later query.
pub struct StatusSimulationEngine;

impl StatusSimulationEngine {
    pub fn query(job: &Job, now: Instant) -> StatusResponse {
        let elapsed = now.saturating_duration_since(job.created_at());

        if elapsed < job.completion_time() {
            return StatusResponse::pending(elapsed);
        }

        match job.resolve_outcome() {
            Outcome::Completed => StatusResponse::completed(elapsed),
            Outcome::Failed => StatusResponse::error(elapsed, FAILURE_MESSAGE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::JobStatus;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    fn make_job(completion_secs: u64, error_rate: f64) -> (Job, Instant) {
        let start = Instant::now();
        let job = Job::started_at(start, Duration::from_secs(completion_secs), error_rate).unwrap();
        (job, start)
    }

    #[test]
    fn pending_before_completion_time() {
        let (job, start) = make_job(10, 0.0);

        let early = StatusSimulationEngine::query(&job, start + Duration::from_secs(1));
        let later = StatusSimulationEngine::query(&job, start + Duration::from_secs(9));

        assert_eq!(early.status, JobStatus::Pending);
        assert_eq!(later.status, JobStatus::Pending);
        assert!(later.elapsed_time >= early.elapsed_time);
        assert_eq!(early.elapsed_time, 1.0);
        assert!(job.outcome().is_none());
    }

    #[test]
    fn completes_at_threshold() {
        let (job, start) = make_job(10, 0.0);

        let resp = StatusSimulationEngine::query(&job, start + Duration::from_secs(10));

        assert_eq!(resp.status, JobStatus::Completed);
        assert_eq!(resp.elapsed_time, 10.0);
        assert!(resp.message.is_none());
    }

    #[test]
    fn error_rate_one_always_errors_with_message() {
        let (job, start) = make_job(2, 1.0);

        for secs in 2..20 {
            let resp = StatusSimulationEngine::query(&job, start + Duration::from_secs(secs));
            assert_eq!(resp.status, JobStatus::Error);
            assert_eq!(resp.message.as_deref(), Some(FAILURE_MESSAGE));
        }
    }

    #[test]
    fn terminal_status_never_flips() {
        let (job, start) = make_job(1, 0.5);

        let first = StatusSimulationEngine::query(&job, start + Duration::from_secs(1)).status;
        for secs in 2..200 {
            let resp = StatusSimulationEngine::query(&job, start + Duration::from_secs(secs));
            assert_eq!(resp.status, first);
        }
    }

    #[test]
    fn zero_completion_time_is_terminal_immediately() {
        let (job, start) = make_job(0, 1.0);

        let resp = StatusSimulationEngine::query(&job, start);
        assert_eq!(resp.status, JobStatus::Error);
        assert_eq!(resp.elapsed_time, 0.0);
    }

    #[test]
    fn query_before_creation_saturates_to_zero() {
        let start = Instant::now() + Duration::from_secs(5);
        let job = Job::started_at(start, Duration::from_secs(1), 0.0).unwrap();

        let resp = StatusSimulationEngine::query(&job, Instant::now());
        assert_eq!(resp.status, JobStatus::Pending);
        assert_eq!(resp.elapsed_time, 0.0);
    }

    #[test]
    fn concurrent_queries_at_boundary_agree() {
        for _ in 0..20 {
            let (job, start) = make_job(1, 0.5);
            let job = Arc::new(job);
            let barrier = Arc::new(Barrier::new(8));
            let at = start + Duration::from_secs(1);

            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let job = Arc::clone(&job);
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        barrier.wait();
                        StatusSimulationEngine::query(&job, at).status
                    })
                })
                .collect();

            let statuses: Vec<JobStatus> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert!(statuses.iter().all(|s| *s == statuses[0]));
            assert_eq!(Some(statuses[0]), job.outcome().map(Outcome::status));
        }
    }
}
