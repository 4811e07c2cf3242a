use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bytes addressed by a single postage stamp bucket slot.
pub const CHUNK_SIZE: u64 = 4096;

/// Lifecycle state of a file inside a drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileStatus {
    #[default]
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "trashed")]
    Trashed,
}

/// Descriptor of one logical file as reported by the file manager.
///
/// The orchestration layer never builds these from scratch. It reads them
/// and copies the feed identifiers into replace requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub topic: String,
    pub version: u64,
    pub owner: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_metadata: BTreeMap<String, String>,
    pub file_ref: String,
    pub history_ref: String,
    pub drive_id: String,
    #[serde(default)]
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

impl FileInfo {
    /// Whether the file is visible in the drive (not in the trash).
    pub fn is_active(&self) -> bool {
        self.status == FileStatus::Active
    }
}

/// A drive: folder and trash semantics layered over a stamp-backed feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveInfo {
    pub id: String,
    pub name: String,
    pub batch_id: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub redundancy_level: u8,
}

/// A prepaid storage allocation ("stamp").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostageBatch {
    pub batch_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    pub depth: u8,
    pub bucket_depth: u8,
    pub amount: String,
    pub usable: bool,
    /// Remaining time to live, in seconds.
    pub duration_secs: u64,
    /// Fill level of the most utilised bucket.
    pub utilization: u32,
}

impl PostageBatch {
    /// Upper bound on bytes the batch can stamp.
    pub fn theoretical_bytes(&self) -> u64 {
        CHUNK_SIZE.saturating_mul(1u64.checked_shl(self.depth as u32).unwrap_or(u64::MAX))
    }

    /// Fraction of the batch already used, in `[0, 1]`.
    pub fn utilization_fraction(&self) -> f64 {
        let shift = self.depth.saturating_sub(self.bucket_depth) as u32;
        let per_bucket = 1u64.checked_shl(shift).unwrap_or(u64::MAX) as f64;
        (self.utilization as f64 / per_bucket).clamp(0.0, 1.0)
    }

    /// Bytes still available before the batch is full.
    pub fn remaining_bytes(&self) -> u64 {
        let total = self.theoretical_bytes() as f64;
        (total * (1.0 - self.utilization_fraction())).floor() as u64
    }

    /// Whether the batch can accept new uploads.
    pub fn is_usable(&self) -> bool {
        self.usable && self.duration_secs > 0
    }
}

/// Current chain state reported by the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainState {
    pub block: u64,
    pub current_price: String,
}

/// Parameters for a single upload.
///
/// Setting `topic` (and usually `history_ref`) makes the SDK publish a new
/// version of that file instead of creating a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub drive_id: String,
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub topic: Option<String>,
    pub history_ref: Option<String>,
    pub custom_metadata: BTreeMap<String, String>,
}

/// Progress reported by the SDK during an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub processed: u64,
    pub total: u64,
}

/// Progress reported by the SDK during a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes received so far.
    pub progress: u64,
    pub is_downloading: bool,
}

/// Storage duration in seconds, as accepted by the node's cost and buy calls.
pub type DurationSecs = u64;
