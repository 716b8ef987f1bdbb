//! Notification error types.

use thiserror::Error;

/// Upload notification processing errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("queue error: {0}")]
    Queue(String),

    #[error("malformed notification message: {0}")]
    Malformed(String),

    #[error("unexpected object key in notification: {0}")]
    UnexpectedKey(String),

    #[error("unknown scan status: {0}")]
    UnknownScanStatus(String),

    #[error("metadata error: {0}")]
    Metadata(#[from] cabinet_metadata::MetadataError),
}

/// Result type for notification operations.
pub type NotifyResult<T> = std::result::Result<T, NotifyError>;
