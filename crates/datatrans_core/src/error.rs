use thiserror::Error;

/// Reasons a job cannot be started from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("upload a file first")]
    NoFile,
    #[error("select at least one field")]
    NoFields,
    #[error("another request is still in progress")]
    Busy,
}
