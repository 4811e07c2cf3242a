//! Data types for the upload queue.

use std::collections::BTreeMap;
use std::path::PathBuf;

use swarmdesk_sdk::{FileInfo, UploadRequest};
use swarmdesk_transfer::TransferKind;

use crate::error::UploadError;

/// A file picked on the local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub size: u64,
    pub path: PathBuf,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, size: u64, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            size,
            path: path.into(),
        }
    }

    /// Reads name and size from the file system.
    pub async fn from_path(path: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let path = path.into();
        let meta = tokio::fs::metadata(&path).await?;
        if !meta.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            )
            .into());
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            size: meta.len(),
            path,
        })
    }
}

/// One accepted upload waiting for (or running on) the worker.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadTask {
    pub uuid: String,
    pub file: LocalFile,
    /// Name the file is stored under. Differs from `file.name` after a
    /// keep-both rename.
    pub final_name: String,
    pub is_replace: bool,
    pub replace_topic: Option<String>,
    pub replace_history: Option<String>,
    pub drive_id: String,
    pub drive_name: String,
}

impl UploadTask {
    pub fn kind(&self) -> TransferKind {
        if self.is_replace {
            TransferKind::Update
        } else {
            TransferKind::Upload
        }
    }

    /// SDK request for this task. Replacements carry the existing topic
    /// and history so the SDK appends a version.
    pub fn request(&self) -> UploadRequest {
        UploadRequest {
            drive_id: self.drive_id.clone(),
            name: self.final_name.clone(),
            path: self.file.path.clone(),
            size: self.file.size,
            topic: self.replace_topic.clone(),
            history_ref: self.replace_history.clone(),
            custom_metadata: BTreeMap::new(),
        }
    }
}

/// Tunables for [`UploadQueue`](crate::UploadQueue).
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub max_files_per_batch: usize,
    /// Conflict prompts per file before the resolver gives up.
    pub max_conflict_prompts: u32,
    pub event_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_files_per_batch: 10,
            max_conflict_prompts: 8,
            event_capacity: 256,
        }
    }
}

/// Queue activity reported to the host UI.
#[derive(Debug, Clone)]
pub enum UploadEvent {
    /// Accepted and waiting for the worker.
    Queued { uuid: String, name: String },
    /// The worker picked the task up.
    Started { uuid: String },
    Completed { uuid: String, file: FileInfo },
    /// Failed with a user-facing reason.
    Failed { uuid: String, error: String },
    Cancelled { uuid: String },
    /// Nothing left to run.
    Idle,
}

/// Where a download ends up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// Stream straight into this file.
    Disk(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutput {
    Disk(PathBuf),
    /// Bytes for the caller to save, either requested or as the fallback
    /// when the disk target could not be written.
    Memory(Vec<u8>),
}
