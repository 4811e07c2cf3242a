//! Upload error types.

use swarmdesk_sdk::SdkError;

/// Errors produced by the upload queue and downloads.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("too many files: {count} selected, at most {max} per upload")]
    TooManyFiles { count: usize, max: usize },

    #[error("not enough stamp capacity: need {needed} bytes, {available} available")]
    InsufficientCapacity { needed: u64, available: u64 },

    #[error("stamp {0} cannot take new data")]
    StampUnusable(String),

    #[error("SDK error: {0}")]
    Sdk(#[from] SdkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] swarmdesk_transfer::TransferError),

    #[error("upload worker has stopped")]
    QueueClosed,

    #[error("cancelled")]
    Cancelled,
}
