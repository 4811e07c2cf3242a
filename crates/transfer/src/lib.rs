//! Upload and download tracking with smoothed progress and ETA.
//!
//! [`TransferTracker`] is the single source of truth for the transfers
//! panel. It hands out progress callbacks for the SDK and keeps every
//! item's percent monotonic until the item reaches a terminal state.

mod eta;
pub mod format;
mod progress;
mod types;
mod validation;

pub use eta::EtaEstimator;
pub use format::{format_bytes, format_bytes_or_dash, format_duration_secs};
pub use progress::{ChangeCallback, TrackerConfig, TransferTracker};
pub use types::{DownloadProps, TransferChange, TransferItem, TransferKind, TransferStatus};
pub use validation::{MAX_NAME_LEN, validate_file_name};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid file name: {0}")]
    InvalidName(String),
}
