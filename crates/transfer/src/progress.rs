use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use swarmdesk_sdk::{DownloadProgress, DownloadProgressFn, UploadProgress, UploadProgressFn};
use tracing::{debug, trace};

use crate::eta::{DEFAULT_ALPHA, DEFAULT_SAMPLE_INTERVAL, EtaEstimator};
use crate::types::{DownloadProps, TransferChange, TransferItem, TransferKind, TransferStatus};

/// Observer invoked after every tracker mutation.
pub type ChangeCallback = Box<dyn Fn(&TransferChange) + Send + Sync>;

/// Tuning for progress smoothing.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Weight of the newest ETA sample.
    pub eta_alpha: f64,
    /// Minimum spacing between ETA samples.
    pub eta_sample_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            eta_alpha: DEFAULT_ALPHA,
            eta_sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

/// In-memory list of uploads and downloads for the current session.
///
/// Cheap to clone; every clone shares the same state. Components receive a
/// handle explicitly instead of reaching for a global.
#[derive(Clone, Default)]
pub struct TransferTracker {
    inner: Arc<RwLock<TrackerInner>>,
    observers: Arc<RwLock<Vec<ChangeCallback>>>,
}

#[derive(Default)]
struct TrackerInner {
    config: TrackerConfig,
    uploads: Vec<Entry>,
    downloads: Vec<Entry>,
}

struct Entry {
    item: TransferItem,
    eta: EtaEstimator,
}

impl TrackerInner {
    fn new_entry(&self, item: TransferItem) -> Entry {
        Entry {
            item,
            eta: EtaEstimator::new(self.config.eta_alpha, self.config.eta_sample_interval),
        }
    }

    fn find_mut(&mut self, uuid: &str) -> Option<&mut Entry> {
        self.uploads
            .iter_mut()
            .chain(self.downloads.iter_mut())
            .find(|e| e.item.uuid == uuid)
    }

    fn find(&self, uuid: &str) -> Option<&Entry> {
        self.uploads
            .iter()
            .chain(self.downloads.iter())
            .find(|e| e.item.uuid == uuid)
    }
}

impl TransferTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(TrackerInner {
                config,
                uploads: Vec::new(),
                downloads: Vec::new(),
            })),
            observers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Registers an observer for item changes.
    ///
    /// Observers run with the observer list read-locked. An observer that
    /// calls `on_change` deadlocks. An observer that captures a clone of this
    /// tracker forms a reference cycle, so the shared state is never freed.
    pub fn on_change(&self, callback: ChangeCallback) {
        self.observers.write().unwrap().push(callback);
    }

    /// Adds an upload in the Queued state.
    pub fn enqueue_upload(
        &self,
        uuid: &str,
        name: &str,
        size_bytes: u64,
        kind: TransferKind,
        drive_name: Option<&str>,
    ) {
        let item = TransferItem::new(
            uuid.to_string(),
            name.to_string(),
            Some(size_bytes),
            kind,
            drive_name.map(str::to_string),
            TransferStatus::Queued,
        );
        let snapshot = item.clone();
        {
            let mut inner = self.inner.write().unwrap();
            let entry = inner.new_entry(item);
            inner.uploads.retain(|e| e.item.uuid != uuid);
            inner.uploads.push(entry);
        }
        debug!(uuid = %uuid, name = %name, "upload queued");
        self.notify(TransferChange::Updated(snapshot));
    }

    /// Starts (or re-arms a queued) upload and returns the SDK progress callback.
    pub fn track_upload(
        &self,
        uuid: &str,
        name: &str,
        size_bytes: u64,
        kind: TransferKind,
        drive_name: Option<&str>,
    ) -> UploadProgressFn {
        let now = Instant::now();
        let snapshot = {
            let mut inner = self.inner.write().unwrap();
            if inner.find(uuid).is_none() {
                let item = TransferItem::new(
                    uuid.to_string(),
                    name.to_string(),
                    Some(size_bytes),
                    kind,
                    drive_name.map(str::to_string),
                    TransferStatus::Uploading,
                );
                let entry = inner.new_entry(item);
                inner.uploads.push(entry);
            }
            // A terminal item (e.g. cancelled while queued) stays as it is.
            inner
                .find_mut(uuid)
                .filter(|entry| !entry.item.status.is_terminal())
                .map(|entry| {
                    entry.item.status = TransferStatus::Uploading;
                    entry.item.started_at = Some(now);
                    entry.item.elapsed_sec = Some(0.0);
                    entry.item.eta_sec = None;
                    entry.eta.reset();
                    entry.item.clone()
                })
        };
        if let Some(item) = snapshot {
            debug!(uuid = %uuid, name = %name, "upload started");
            self.notify(TransferChange::Updated(item));
        }

        let tracker = self.clone();
        let uuid = uuid.to_string();
        Arc::new(move |p: UploadProgress| {
            tracker.apply_upload_progress(&uuid, p, Instant::now());
        })
    }

    /// Starts a download and returns the SDK progress callback.
    pub fn track_download(&self, props: DownloadProps) -> DownloadProgressFn {
        let now = Instant::now();
        let mut item = TransferItem::new(
            props.uuid.clone(),
            props.name,
            props.size_bytes,
            TransferKind::Download,
            props.drive_name,
            TransferStatus::Downloading,
        );
        item.started_at = Some(now);
        item.elapsed_sec = Some(0.0);
        let snapshot = item.clone();
        {
            let mut inner = self.inner.write().unwrap();
            let entry = inner.new_entry(item);
            inner.downloads.retain(|e| e.item.uuid != props.uuid);
            inner.downloads.push(entry);
        }
        debug!(uuid = %props.uuid, name = %snapshot.name, "download started");
        self.notify(TransferChange::Updated(snapshot));

        let tracker = self.clone();
        let uuid = props.uuid;
        Arc::new(move |p: DownloadProgress| {
            tracker.apply_download_progress(&uuid, p, Instant::now());
        })
    }

    fn apply_upload_progress(&self, uuid: &str, p: UploadProgress, now: Instant) {
        self.update(uuid, |entry| {
            let item = &mut entry.item;
            if item.status.is_terminal() {
                return false;
            }
            let started = *item.started_at.get_or_insert(now);
            item.elapsed_sec = Some(now.saturating_duration_since(started).as_secs_f64());
            if item.status == TransferStatus::Queued {
                item.status = TransferStatus::Uploading;
            }

            item.percent = item.percent.max(percent_of(p.processed, p.total));
            if p.processed >= p.total {
                item.percent = 100.0;
                item.status = TransferStatus::Done;
                item.eta_sec = Some(0.0);
            } else {
                item.eta_sec = entry.eta.sample(now, started, p.processed, p.total);
            }
            trace!(uuid = %uuid, processed = p.processed, total = p.total, "upload progress");
            true
        });
    }

    fn apply_download_progress(&self, uuid: &str, p: DownloadProgress, now: Instant) {
        self.update(uuid, |entry| {
            let item = &mut entry.item;
            if item.status.is_terminal() {
                return false;
            }
            let started = *item.started_at.get_or_insert(now);
            item.elapsed_sec = Some(now.saturating_duration_since(started).as_secs_f64());

            if !p.is_downloading {
                item.percent = 100.0;
                item.status = TransferStatus::Done;
                item.eta_sec = Some(0.0);
                return true;
            }

            if let Some(total) = item.size_bytes {
                let processed = p.progress.min(total);
                item.percent = item.percent.max(percent_of(processed, total));
                item.eta_sec = entry.eta.sample(now, started, processed, total);
            }
            trace!(uuid = %uuid, received = p.progress, "download progress");
            true
        });
    }

    /// Moves an item to `status`, which may itself be terminal. Returns
    /// `false` if the item is unknown or already terminal.
    pub fn set_status(&self, uuid: &str, status: TransferStatus) -> bool {
        self.update(uuid, |entry| {
            if entry.item.status.is_terminal() {
                return false;
            }
            entry.item.status = status;
            if status == TransferStatus::Done {
                entry.item.percent = 100.0;
                entry.item.eta_sec = Some(0.0);
            } else if status.is_terminal() {
                entry.item.eta_sec = None;
            }
            true
        })
    }

    pub fn mark_done(&self, uuid: &str) -> bool {
        self.set_status(uuid, TransferStatus::Done)
    }

    pub fn mark_cancelled(&self, uuid: &str) -> bool {
        self.set_status(uuid, TransferStatus::Cancelled)
    }

    /// Marks the item failed and records the user-facing reason.
    pub fn mark_error(&self, uuid: &str, message: &str) -> bool {
        self.update(uuid, |entry| {
            if entry.item.status.is_terminal() {
                return false;
            }
            entry.item.status = TransferStatus::Error;
            entry.item.eta_sec = None;
            entry.item.error = Some(message.to_string());
            true
        })
    }

    /// Snapshot of one item.
    pub fn get(&self, uuid: &str) -> Option<TransferItem> {
        let inner = self.inner.read().unwrap();
        inner.find(uuid).map(|e| e.item.clone())
    }

    /// Snapshot of all uploads, oldest first.
    pub fn uploads(&self) -> Vec<TransferItem> {
        let inner = self.inner.read().unwrap();
        inner.uploads.iter().map(|e| e.item.clone()).collect()
    }

    /// Snapshot of all downloads, oldest first.
    pub fn downloads(&self) -> Vec<TransferItem> {
        let inner = self.inner.read().unwrap();
        inner.downloads.iter().map(|e| e.item.clone()).collect()
    }

    /// Names of uploads still queued or running on a drive.
    pub fn in_flight_names(&self, drive_name: &str) -> Vec<String> {
        let inner = self.inner.read().unwrap();
        inner
            .uploads
            .iter()
            .filter(|e| !e.item.status.is_terminal())
            .filter(|e| e.item.drive_name.as_deref() == Some(drive_name))
            .map(|e| e.item.name.clone())
            .collect()
    }

    /// Removes one item. Returns `true` if it existed.
    pub fn dismiss(&self, uuid: &str) -> bool {
        let removed = {
            let mut inner = self.inner.write().unwrap();
            let before = inner.uploads.len() + inner.downloads.len();
            inner.uploads.retain(|e| e.item.uuid != uuid);
            inner.downloads.retain(|e| e.item.uuid != uuid);
            before != inner.uploads.len() + inner.downloads.len()
        };
        if removed {
            self.notify(TransferChange::Removed(uuid.to_string()));
        }
        removed
    }

    /// Removes every finished, failed or cancelled item.
    pub fn clear_finished(&self) -> usize {
        self.remove_where(|item| item.status.is_terminal())
    }

    pub fn clear_uploads(&self) -> usize {
        self.remove_where(TransferItem::is_upload)
    }

    pub fn clear_downloads(&self) -> usize {
        self.remove_where(|item| item.kind == TransferKind::Download)
    }

    fn remove_where(&self, pred: impl Fn(&TransferItem) -> bool) -> usize {
        let removed: Vec<String> = {
            let mut guard = self.inner.write().unwrap();
            let inner = &mut *guard;
            let mut removed = Vec::new();
            for list in [&mut inner.uploads, &mut inner.downloads] {
                list.retain(|e| {
                    let drop = pred(&e.item);
                    if drop {
                        removed.push(e.item.uuid.clone());
                    }
                    !drop
                });
            }
            removed
        };
        for uuid in &removed {
            self.notify(TransferChange::Removed(uuid.clone()));
        }
        removed.len()
    }

    fn update(&self, uuid: &str, f: impl FnOnce(&mut Entry) -> bool) -> bool {
        let snapshot = {
            let mut inner = self.inner.write().unwrap();
            match inner.find_mut(uuid) {
                Some(entry) => f(&mut *entry).then(|| entry.item.clone()),
                None => None,
            }
        };
        match snapshot {
            Some(item) => {
                self.notify(TransferChange::Updated(item));
                true
            }
            None => false,
        }
    }

    // Called without the state lock held so observers may read the tracker.
    fn notify(&self, change: TransferChange) {
        let observers = self.observers.read().unwrap();
        for cb in observers.iter() {
            cb(&change);
        }
    }
}

fn percent_of(processed: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (processed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}
