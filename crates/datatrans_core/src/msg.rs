use crate::{CreatedJob, ExportMode, JobDetail, JobSummary, RequestId, UploadedFile};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Session begins with whatever the selection store held.
    SessionStarted { persisted_job_id: Option<String> },
    /// User picked a file to upload.
    UploadRequested { path: String },
    /// Engine completion for an upload.
    UploadFinished(Result<UploadedFile, String>),
    /// User added a custom field path.
    CustomFieldAdded(String),
    /// User checked or unchecked a field.
    FieldToggled { path: String, checked: bool },
    SelectAllFields,
    ClearFields,
    /// Raw row-limit input; clamped on apply.
    RowLimitChanged(i64),
    ModeChanged(ExportMode),
    TargetLangChanged(String),
    /// User asked to start translating with the current selection.
    StartClicked,
    /// Engine completion for a job-create call.
    JobCreated(Result<CreatedJob, String>),
    /// User picked a job from the directory.
    JobSelected { job_id: String },
    /// User asked for a directory reload.
    RefreshClicked,
    /// Engine completion for a directory request.
    DirectoryLoaded {
        request: RequestId,
        result: Result<Vec<JobSummary>, String>,
    },
    /// Engine completion for a job detail request.
    JobDetailLoaded {
        job_id: String,
        generation: u64,
        result: Result<JobDetail, String>,
    },
    /// User asked to save the finished export of the tracked job.
    DownloadRequested { output_dir: String },
    /// Engine completion for an export download.
    DownloadFinished(Result<String, String>),
}
