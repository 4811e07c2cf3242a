//! Drive error types.

use swarmdesk_sdk::SdkError;

/// Errors produced by drive and stamp operations.
#[derive(Debug, thiserror::Error)]
pub enum DriveError {
    #[error("SDK error: {0}")]
    Sdk(#[from] SdkError),

    #[error("unknown drive: {0}")]
    UnknownDrive(String),

    #[error("unknown stamp: {0}")]
    UnknownStamp(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
