//! Poll cadence decisions. Each function is re-evaluated after every response.
use std::time::Duration;

use crate::{JobStatus, JobSummary};

pub const DIRECTORY_POLL_INTERVAL: Duration = Duration::from_millis(2000);
pub const DETAIL_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Delay before the next directory refresh, or `None` to suspend until an
/// explicit trigger.
pub fn directory_poll_delay(jobs: &[JobSummary]) -> Option<Duration> {
    jobs.iter()
        .any(|job| job.status().is_active())
        .then_some(DIRECTORY_POLL_INTERVAL)
}

/// Delay before re-fetching the tracked job. An unknown status (nothing
/// fetched yet) keeps polling.
pub fn detail_poll_delay(status: Option<JobStatus>) -> Option<Duration> {
    match status {
        Some(status) if status.is_terminal() => None,
        _ => Some(DETAIL_POLL_INTERVAL),
    }
}
