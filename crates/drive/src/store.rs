//! Shared stamp and drive state.
//!
//! One `DriveStore` per session holds the stamps, drives and file listings
//! the UI renders. It re-fetches on explicit refresh and whenever the file
//! manager reports a change.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use swarmdesk_sdk::{
    DriveInfo, FileInfo, FileManager, FileManagerEvent, FileStatus, PostageBatch, StorageNode,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::DriveError;
use crate::retry::{RetryConfig, retry_sdk};

/// Snapshot of everything the store knows.
#[derive(Debug, Clone, Default)]
pub struct DriveState {
    pub stamps: Vec<PostageBatch>,
    pub drives: Vec<DriveInfo>,
    pub current_drive: Option<String>,
    /// File listings keyed by drive id.
    pub files: HashMap<String, Vec<FileInfo>>,
}

pub struct DriveStore {
    fm: Arc<dyn FileManager>,
    node: Arc<dyn StorageNode>,
    retry: RetryConfig,
    state: RwLock<DriveState>,
}

impl DriveStore {
    pub fn new(fm: Arc<dyn FileManager>, node: Arc<dyn StorageNode>) -> Self {
        Self::with_retry(fm, node, RetryConfig::default())
    }

    pub fn with_retry(
        fm: Arc<dyn FileManager>,
        node: Arc<dyn StorageNode>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            fm,
            node,
            retry,
            state: RwLock::new(DriveState::default()),
        }
    }

    pub fn file_manager(&self) -> &Arc<dyn FileManager> {
        &self.fm
    }

    pub fn node(&self) -> &Arc<dyn StorageNode> {
        &self.node
    }

    /// Re-fetches stamps and drives.
    ///
    /// Keeps the current drive if it still exists, otherwise falls back to
    /// the first drive. Listings of vanished drives are dropped.
    pub async fn refresh(&self) -> Result<(), DriveError> {
        let stamps = retry_sdk(&self.retry, "get_postage_batches", || {
            self.node.get_postage_batches()
        })
        .await?;
        let drives = retry_sdk(&self.retry, "list_drives", || self.fm.list_drives()).await?;

        let mut state = self.state.write().unwrap();
        let still_there = state
            .current_drive
            .as_ref()
            .is_some_and(|id| drives.iter().any(|d| &d.id == id));
        if !still_there {
            state.current_drive = drives.first().map(|d| d.id.clone());
        }
        state
            .files
            .retain(|id, _| drives.iter().any(|d| &d.id == id));
        debug!(stamps = stamps.len(), drives = drives.len(), "drive state refreshed");
        state.stamps = stamps;
        state.drives = drives;
        Ok(())
    }

    /// Re-fetches one drive's file listing.
    pub async fn refresh_files(&self, drive_id: &str) -> Result<Vec<FileInfo>, DriveError> {
        let drive = self
            .drive(drive_id)
            .ok_or_else(|| DriveError::UnknownDrive(drive_id.to_string()))?;
        let files = retry_sdk(&self.retry, "list_files", || self.fm.list_files(&drive)).await?;
        debug!(drive = %drive.name, files = files.len(), "file list refreshed");
        self.state
            .write()
            .unwrap()
            .files
            .insert(drive_id.to_string(), files.clone());
        Ok(files)
    }

    /// Applies a file-manager change notification.
    pub async fn handle_event(&self, event: &FileManagerEvent) -> Result<(), DriveError> {
        if event.changes_drive_list() || self.drive(event.drive_id()).is_none() {
            self.refresh().await?;
            if self.drive(event.drive_id()).is_none() {
                return Ok(());
            }
        }
        self.refresh_files(event.drive_id()).await.map(|_| ())
    }

    /// Feeds SDK events into [`handle_event`](Self::handle_event) until the
    /// sender side closes.
    pub fn listen(self: Arc<Self>, mut events: mpsc::Receiver<FileManagerEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Err(e) = self.handle_event(&event).await {
                    warn!(drive = %event.drive_id(), error = %e, "refresh after event failed");
                }
            }
            debug!("file manager event stream closed");
        })
    }

    pub fn select_drive(&self, drive_id: &str) -> Result<(), DriveError> {
        let mut state = self.state.write().unwrap();
        if !state.drives.iter().any(|d| d.id == drive_id) {
            return Err(DriveError::UnknownDrive(drive_id.to_string()));
        }
        state.current_drive = Some(drive_id.to_string());
        Ok(())
    }

    pub fn current_drive(&self) -> Option<DriveInfo> {
        let state = self.state.read().unwrap();
        let id = state.current_drive.as_ref()?;
        state.drives.iter().find(|d| &d.id == id).cloned()
    }

    pub fn drive(&self, drive_id: &str) -> Option<DriveInfo> {
        let state = self.state.read().unwrap();
        state.drives.iter().find(|d| d.id == drive_id).cloned()
    }

    pub fn drives(&self) -> Vec<DriveInfo> {
        self.state.read().unwrap().drives.clone()
    }

    pub fn stamps(&self) -> Vec<PostageBatch> {
        self.state.read().unwrap().stamps.clone()
    }

    pub fn stamp(&self, batch_id: &str) -> Option<PostageBatch> {
        let state = self.state.read().unwrap();
        state.stamps.iter().find(|s| s.batch_id == batch_id).cloned()
    }

    /// Stamps that can take new data.
    pub fn usable_stamps(&self) -> Vec<PostageBatch> {
        let state = self.state.read().unwrap();
        state
            .stamps
            .iter()
            .filter(|s| s.is_usable())
            .cloned()
            .collect()
    }

    /// The stamp backing a drive.
    pub fn stamp_for_drive(&self, drive: &DriveInfo) -> Option<PostageBatch> {
        self.stamp(&drive.batch_id)
    }

    /// Cached listing of a drive, optionally filtered by status.
    pub fn files(&self, drive_id: &str, status: Option<FileStatus>) -> Vec<FileInfo> {
        let state = self.state.read().unwrap();
        state
            .files
            .get(drive_id)
            .map(|files| {
                files
                    .iter()
                    .filter(|f| status.is_none_or(|s| f.status == s))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> DriveState {
        self.state.read().unwrap().clone()
    }

    /// Creates a drive on a usable stamp, then refreshes.
    pub async fn create_drive(
        &self,
        name: &str,
        batch_id: &str,
        redundancy_level: u8,
    ) -> Result<DriveInfo, DriveError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DriveError::InvalidRequest("drive name is empty".into()));
        }
        if self.drives().iter().any(|d| d.name == name) {
            return Err(DriveError::InvalidRequest(format!(
                "a drive named {name} already exists"
            )));
        }
        let stamp = self
            .stamp(batch_id)
            .ok_or_else(|| DriveError::UnknownStamp(batch_id.to_string()))?;
        if !stamp.is_usable() {
            return Err(DriveError::InvalidRequest(format!(
                "stamp {batch_id} is not usable"
            )));
        }

        let drive = self.fm.create_drive(name, batch_id, redundancy_level).await?;
        info!(drive = %drive.name, id = %drive.id, "drive created");
        self.refresh().await?;
        Ok(drive)
    }

    /// Destroys a drive and everything in it, then refreshes.
    pub async fn destroy_drive(&self, drive: &DriveInfo) -> Result<(), DriveError> {
        self.fm.destroy_drive(drive).await?;
        info!(drive = %drive.name, id = %drive.id, "drive destroyed");
        self.refresh().await
    }

    /// Makes an older version current and refreshes its drive.
    pub async fn restore_version(&self, version: &FileInfo) -> Result<(), DriveError> {
        self.fm.restore_version(version).await?;
        info!(topic = %version.topic, version = version.version, "version restored");
        self.refresh_files(&version.drive_id).await.map(|_| ())
    }
}
