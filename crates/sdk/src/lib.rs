//! Boundary between the desktop orchestration layer and the storage SDKs.
//!
//! Holds the value types the SDKs return, the two client traits the host
//! application implements, and the tagged error every call reports.

pub mod client;
pub mod error;
pub mod events;
pub mod types;

pub use client::{DownloadProgressFn, FileManager, SdkFuture, StorageNode, UploadProgressFn};
pub use error::{SdkError, SdkErrorKind};
pub use events::FileManagerEvent;
pub use types::{
    ChainState, DownloadProgress, DriveInfo, DurationSecs, FileInfo, FileStatus, PostageBatch,
    UploadProgress, UploadRequest,
};
