use std::collections::BTreeMap;

/// Lowest row limit accepted by the backend.
pub const ROW_LIMIT_MIN: u32 = 1;
/// Highest row limit accepted by the backend.
pub const ROW_LIMIT_MAX: u32 = 5000;
/// Row limit used until the user picks one.
pub const DEFAULT_ROW_LIMIT: u32 = 50;
/// Target language sent with every job.
pub const DEFAULT_TARGET_LANG: &str = "zh-CN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Pending and running jobs are still worth polling.
    pub fn is_active(self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// Keep the source values and add translated `*_zh` columns/fields.
    #[default]
    AddColumns,
    /// Replace the source values with their translation.
    Overwrite,
}

impl ExportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportMode::AddColumns => "add_columns",
            ExportMode::Overwrite => "overwrite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    Json,
    Jsonl,
    Csv,
    Xlsx,
}

impl DetectedFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectedFormat::Json => "json",
            DetectedFormat::Jsonl => "jsonl",
            DetectedFormat::Csv => "csv",
            DetectedFormat::Xlsx => "xlsx",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    Table {
        columns: Vec<String>,
        rows: Vec<BTreeMap<String, serde_json::Value>>,
    },
    Raw {
        value: serde_json::Value,
    },
}

/// Result of a successful upload. Replaced wholesale by the next upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub file_id: String,
    pub detected_format: DetectedFormat,
    pub field_candidates: Vec<String>,
    pub preview: Preview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub total: u64,
    pub done: u64,
    pub failed: u64,
}

impl Progress {
    /// `round(100 * done / total)` clamped to `[0, 100]`; 0 while total is unknown.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (self.done as f64 / self.total as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

/// Full job state as returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDetail {
    pub job_id: String,
    pub file_id: String,
    pub status: JobStatus,
    pub mode: ExportMode,
    pub target_lang: String,
    pub row_limit: u32,
    pub selected_fields: Vec<String>,
    pub progress: Progress,
    pub error_message: String,
    pub download_url: Option<String>,
}

/// One entry of the job directory: the job plus listing-only metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub job: JobDetail,
    pub filename: String,
    pub created_at: String,
    pub updated_at: String,
}

impl JobSummary {
    pub fn job_id(&self) -> &str {
        &self.job.job_id
    }

    pub fn status(&self) -> JobStatus {
        self.job.status
    }
}

/// Acknowledgement of a job-create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedJob {
    pub job_id: String,
    pub status: JobStatus,
}

/// Body of a job-create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub file_id: String,
    pub selected_fields: Vec<String>,
    pub row_limit: u32,
    pub mode: ExportMode,
    pub target_lang: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

/// Clamp a user-entered row limit into the accepted range.
pub fn clamp_row_limit(raw: i64) -> u32 {
    raw.clamp(i64::from(ROW_LIMIT_MIN), i64::from(ROW_LIMIT_MAX)) as u32
}
