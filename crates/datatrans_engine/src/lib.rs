//! Datatrans engine: backend API client and effect execution.
mod client;
mod engine;
mod filename;
mod persist;
mod types;

pub use client::{error_message, ApiClient, ClientSettings, ReqwestApiClient};
pub use engine::EngineHandle;
pub use filename::{content_disposition_filename, export_filename};
pub use persist::{FileStore, PersistError, StagedFile};
pub use types::{
    ApiError, ApiExportMode, ApiFileFormat, ApiJobStatus, ApiPreview, CreateJobPayload,
    CreateJobResponse, DownloadedExport, EngineError, EngineEvent, FailureKind, JobListItem,
    JobListResponse, JobStatusResponse, UploadResponse,
};
