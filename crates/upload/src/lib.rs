//! Upload queue, name-conflict resolution and downloads.
//!
//! This crate holds the transfer **business logic** between a desktop UI and
//! the file-manager SDK. The UI feeds files into [`UploadQueue::enqueue`],
//! answers [`ConflictRequest`]s, and renders [`UploadEvent`]s plus the shared
//! [`TransferTracker`](swarmdesk_transfer::TransferTracker).
//!
//! # Upload pipeline
//!
//! 1. **Validate**: file count, stamp capacity, names
//! 2. **Resolve**: prompt for keep-both, replace or skip on name clashes
//! 3. **Queue**: register with the tracker, abort registry and journal
//! 4. **Upload**: one at a time on the worker task

pub mod abort;
pub mod conflict;
pub mod download;
pub mod error;
pub mod journal;
pub mod queue;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use abort::{AbortHandle, AbortManager};
pub use conflict::{
    ConflictAnswer, ConflictRequest, ConflictResolution, ConflictResolver, ConflictState,
    has_conflict, suggest_unique_name,
};
pub use download::DownloadManager;
pub use error::UploadError;
pub use journal::UploadJournal;
pub use queue::UploadQueue;
pub use types::{DownloadOutput, DownloadTarget, LocalFile, QueueConfig, UploadEvent, UploadTask};
