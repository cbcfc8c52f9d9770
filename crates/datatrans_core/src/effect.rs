use std::time::Duration;

use crate::{JobRequest, Page};

/// Monotonic id of a directory request.
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    UploadFile {
        path: String,
    },
    CreateJob(JobRequest),
    /// Write the job id to the selection store.
    PersistSelection {
        job_id: String,
    },
    /// Load one directory page after `delay`.
    FetchDirectory {
        request: RequestId,
        page: Page,
        delay: Duration,
    },
    /// Load the tracked job after `delay`. A newer generation supersedes it.
    FetchJob {
        job_id: String,
        generation: u64,
        delay: Duration,
    },
    DownloadExport {
        job_id: String,
        download_url: String,
        output_dir: String,
    },
}
