//! Datatrans core: pure state machine for job tracking and field selection.
mod effect;
mod error;
mod fields;
mod job;
mod msg;
mod resolve;
mod schedule;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, RequestId};
pub use error::ValidationError;
pub use fields::FieldSelection;
pub use job::{
    clamp_row_limit, CreatedJob, DetectedFormat, ExportMode, JobDetail, JobRequest, JobStatus,
    JobSummary, Page, Preview, Progress, UploadedFile, DEFAULT_ROW_LIMIT, DEFAULT_TARGET_LANG,
    ROW_LIMIT_MAX, ROW_LIMIT_MIN,
};
pub use msg::Msg;
pub use resolve::resolve;
pub use schedule::{
    detail_poll_delay, directory_poll_delay, DETAIL_POLL_INTERVAL, DIRECTORY_POLL_INTERVAL,
};
pub use state::AppState;
pub use update::update;
pub use view_model::{
    AppViewModel, DownloadView, FieldRowView, JobRowView, PollPhase, TrackedJobView, UploadView,
    UploadedFileView,
};
