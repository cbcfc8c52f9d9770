use crate::{DetectedFormat, ExportMode, JobStatus, Preview};

/// Where the detail poller stands for the tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    Polling,
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub upload: UploadView,
    pub fields: Vec<FieldRowView>,
    pub row_limit: u32,
    pub mode: ExportMode,
    pub target_lang: String,
    pub can_start: bool,
    pub validation: Option<String>,
    pub create_pending: bool,
    pub create_error: Option<String>,
    pub last_created_job: Option<String>,
    pub directory_loaded: bool,
    pub directory_error: Option<String>,
    pub jobs: Vec<JobRowView>,
    pub tracked: Option<TrackedJobView>,
    pub download: DownloadView,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UploadView {
    pub pending: bool,
    pub error: Option<String>,
    pub file: Option<UploadedFileView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFileView {
    pub file_id: String,
    pub detected_format: DetectedFormat,
    pub preview: Preview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRowView {
    pub path: String,
    pub checked: bool,
    pub custom: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub job_id: String,
    pub status: JobStatus,
    /// `done/total`, empty until the total is known.
    pub progress_text: String,
    pub filename: String,
    pub created_at: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedJobView {
    pub job_id: String,
    pub phase: PollPhase,
    /// `None` until the first detail response arrives.
    pub status: Option<JobStatus>,
    pub progress_pct: u8,
    pub done: u64,
    pub total: u64,
    pub failed: u64,
    pub error_message: Option<String>,
    pub download_url: Option<String>,
    pub fetch_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DownloadView {
    pub pending: bool,
    pub error: Option<String>,
    pub saved_path: Option<String>,
}
