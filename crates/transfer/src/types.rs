use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::format::format_bytes_or_dash;

/// Lifecycle state of a tracked transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferStatus {
    #[serde(rename = "queued")]
    Queued,
    #[serde(rename = "uploading")]
    Uploading,
    #[serde(rename = "downloading")]
    Downloading,
    #[serde(rename = "finalizing")]
    Finalizing,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl TransferStatus {
    /// Done, Error and Cancelled accept no further progress.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Cancelled)
    }
}

/// What a transfer does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferKind {
    /// New file.
    #[serde(rename = "upload")]
    Upload,
    /// New version of an existing file.
    #[serde(rename = "update")]
    Update,
    #[serde(rename = "download")]
    Download,
}

/// One row in the transfers panel.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferItem {
    pub uuid: String,
    pub name: String,
    /// Human readable size, `"-"` when unknown.
    pub size: String,
    pub size_bytes: Option<u64>,
    /// 0 to 100, never decreases until the item is terminal.
    pub percent: f64,
    pub status: TransferStatus,
    pub kind: TransferKind,
    pub drive_name: Option<String>,
    pub started_at: Option<Instant>,
    pub eta_sec: Option<f64>,
    pub elapsed_sec: Option<f64>,
    pub error: Option<String>,
}

impl TransferItem {
    pub(crate) fn new(
        uuid: String,
        name: String,
        size_bytes: Option<u64>,
        kind: TransferKind,
        drive_name: Option<String>,
        status: TransferStatus,
    ) -> Self {
        Self {
            uuid,
            name,
            size: format_bytes_or_dash(size_bytes.map(|b| b as f64)),
            size_bytes,
            percent: 0.0,
            status,
            kind,
            drive_name,
            started_at: None,
            eta_sec: None,
            elapsed_sec: None,
            error: None,
        }
    }

    pub fn is_upload(&self) -> bool {
        matches!(self.kind, TransferKind::Upload | TransferKind::Update)
    }
}

/// Parameters for [`TransferTracker::track_download`](crate::TransferTracker::track_download).
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProps {
    pub uuid: String,
    pub name: String,
    /// Expected size, used for percent and ETA. Unknown sizes only finish.
    pub size_bytes: Option<u64>,
    pub drive_name: Option<String>,
}

impl DownloadProps {
    /// Props with a fresh v4 UUID.
    pub fn new(name: impl Into<String>, size_bytes: Option<u64>) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            size_bytes,
            drive_name: None,
        }
    }

    pub fn with_drive(mut self, drive_name: impl Into<String>) -> Self {
        self.drive_name = Some(drive_name.into());
        self
    }
}

/// Change notification passed to tracker observers.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferChange {
    Updated(TransferItem),
    Removed(String),
}
