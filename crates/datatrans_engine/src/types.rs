use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiJobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiExportMode {
    AddColumns,
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFileFormat {
    Json,
    Jsonl,
    Csv,
    Xlsx,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ApiPreview {
    Table {
        #[serde(default)]
        columns: Vec<String>,
        #[serde(default)]
        rows: Vec<BTreeMap<String, Value>>,
    },
    Json {
        #[serde(default)]
        value: Value,
    },
}

/// `POST /api/v1/files/upload`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadResponse {
    pub file_id: String,
    pub detected_format: ApiFileFormat,
    #[serde(default)]
    pub field_candidates: Vec<String>,
    pub preview: ApiPreview,
}

/// Body of `POST /api/v1/jobs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateJobPayload {
    pub file_id: String,
    pub selected_fields: Vec<String>,
    pub row_limit: u32,
    pub mode: ApiExportMode,
    pub target_lang: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateJobResponse {
    pub job_id: String,
    pub status: ApiJobStatus,
}

/// `GET /api/v1/jobs/{job_id}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub file_id: String,
    pub status: ApiJobStatus,
    pub mode: ApiExportMode,
    pub target_lang: String,
    pub row_limit: u32,
    #[serde(default)]
    pub selected_fields: Vec<String>,
    #[serde(default)]
    pub progress_total: u64,
    #[serde(default)]
    pub progress_done: u64,
    #[serde(default)]
    pub progress_failed: u64,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobListItem {
    #[serde(flatten)]
    pub job: JobStatusResponse,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// `GET /api/v1/jobs?limit&offset`, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobListResponse {
    #[serde(default)]
    pub jobs: Vec<JobListItem>,
    pub limit: u32,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedExport {
    /// Name suggested by `Content-Disposition`, if any.
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Uploaded(Result<UploadResponse, ApiError>),
    JobCreated(Result<CreateJobResponse, ApiError>),
    DirectoryLoaded {
        request: u64,
        result: Result<JobListResponse, ApiError>,
    },
    JobLoaded {
        job_id: String,
        generation: u64,
        result: Result<JobStatusResponse, ApiError>,
    },
    ExportSaved {
        job_id: String,
        result: Result<PathBuf, ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Backend messages are already meant for the user.
        match self.kind {
            FailureKind::HttpStatus(_) => write!(f, "{}", self.message),
            _ => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    LocalFile,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response"),
            FailureKind::LocalFile => write!(f, "local file error"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error("failed to build http client: {0}")]
    Client(#[from] ApiError),
}
