//! Scripted file manager for queue and download tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use swarmdesk_sdk::{
    DownloadProgress, DownloadProgressFn, DriveInfo, FileInfo, FileManager, FileManagerEvent,
    FileStatus, PostageBatch, SdkError, SdkErrorKind, SdkFuture, UploadProgress,
    UploadProgressFn, UploadRequest,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub(crate) fn drive() -> DriveInfo {
    DriveInfo {
        id: "d1".into(),
        name: "Documents".into(),
        batch_id: "b1".into(),
        is_admin: false,
        redundancy_level: 0,
    }
}

pub(crate) fn stamp(usable: bool) -> PostageBatch {
    PostageBatch {
        batch_id: "b1".into(),
        label: "docs".into(),
        depth: 20,
        bucket_depth: 16,
        amount: "1000".into(),
        usable,
        duration_secs: 86_400,
        utilization: 0,
    }
}

pub(crate) fn remote_file(name: &str, topic: &str) -> FileInfo {
    FileInfo {
        topic: topic.into(),
        version: 0,
        owner: "0xowner".into(),
        name: name.into(),
        custom_metadata: BTreeMap::new(),
        file_ref: format!("{topic}-ref"),
        history_ref: format!("{topic}-history"),
        drive_id: "d1".into(),
        status: FileStatus::Active,
        size: Some(10),
        modified: None,
    }
}

struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub(crate) struct MockFm {
    pub uploads: Mutex<Vec<UploadRequest>>,
    /// Remote files across drives. Uploads add to it or version it.
    pub files: Mutex<Vec<FileInfo>>,
    /// Uploads by these names fail with a capacity error.
    pub fail: Mutex<HashSet<String>>,
    /// Uploads by these names never finish on their own.
    pub hang: Mutex<HashSet<String>>,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub payload: Vec<u8>,
    pub hang_downloads: bool,
    pub fail_downloads: bool,
}

impl MockFm {
    pub fn with_payload(payload: &[u8]) -> Self {
        Self {
            payload: payload.to_vec(),
            ..Self::default()
        }
    }

    pub fn with_files(files: Vec<FileInfo>) -> Self {
        Self {
            files: Mutex::new(files),
            ..Self::default()
        }
    }

    /// Remote files of one drive, in upload order.
    pub fn listing(&self, drive_id: &str) -> Vec<FileInfo> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.drive_id == drive_id)
            .cloned()
            .collect()
    }

    pub fn upload_names(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }
}

fn unsupported<'a, T: Send + 'a>() -> SdkFuture<'a, T> {
    Box::pin(async { Err(SdkError::new(SdkErrorKind::Unknown, "unsupported")) })
}

impl FileManager for MockFm {
    fn upload(
        &self,
        request: UploadRequest,
        on_progress: UploadProgressFn,
        _cancel: CancellationToken,
    ) -> SdkFuture<'_, FileInfo> {
        Box::pin(async move {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            let _guard = ActiveGuard(&self.active);
            self.max_active.fetch_max(now, Ordering::SeqCst);
            self.uploads.lock().unwrap().push(request.clone());

            let total = request.size.max(1);
            on_progress(UploadProgress {
                processed: 0,
                total,
            });
            let hang = self.hang.lock().unwrap().contains(&request.name);
            if hang {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;

            let fail = self.fail.lock().unwrap().contains(&request.name);
            if fail {
                return Err(SdkError::new(SdkErrorKind::Capacity, "stamp is full"));
            }
            on_progress(UploadProgress {
                processed: total,
                total,
            });

            let mut files = self.files.lock().unwrap();
            let existing = request.topic.as_deref().and_then(|topic| {
                files
                    .iter_mut()
                    .find(|f| f.drive_id == request.drive_id && f.topic == topic)
            });
            if let Some(file) = existing {
                file.version += 1;
                file.name = request.name.clone();
                file.size = Some(request.size);
                return Ok(file.clone());
            }
            let topic = request
                .topic
                .clone()
                .unwrap_or_else(|| format!("topic-{}", request.name));
            let mut info = remote_file(&request.name, &topic);
            info.drive_id = request.drive_id.clone();
            info.size = Some(request.size);
            files.push(info.clone());
            Ok(info)
        })
    }

    fn download<'a>(
        &'a self,
        _file: &'a FileInfo,
        on_progress: DownloadProgressFn,
        _cancel: CancellationToken,
    ) -> SdkFuture<'a, Vec<u8>> {
        Box::pin(async move {
            let half = (self.payload.len() / 2) as u64;
            on_progress(DownloadProgress {
                progress: half,
                is_downloading: true,
            });
            if self.hang_downloads {
                std::future::pending::<()>().await;
            }
            if self.fail_downloads {
                return Err(SdkError::new(SdkErrorKind::NodeUnreachable, "refused"));
            }
            on_progress(DownloadProgress {
                progress: self.payload.len() as u64,
                is_downloading: false,
            });
            Ok(self.payload.clone())
        })
    }

    fn trash_file<'a>(&'a self, _file: &'a FileInfo) -> SdkFuture<'a, ()> {
        unsupported()
    }

    fn recover_file<'a>(&'a self, _file: &'a FileInfo) -> SdkFuture<'a, ()> {
        unsupported()
    }

    fn forget_file<'a>(&'a self, _file: &'a FileInfo) -> SdkFuture<'a, ()> {
        unsupported()
    }

    fn restore_version<'a>(&'a self, _version: &'a FileInfo) -> SdkFuture<'a, ()> {
        unsupported()
    }

    fn get_version<'a>(
        &'a self,
        _file: &'a FileInfo,
        _version: Option<u64>,
    ) -> SdkFuture<'a, FileInfo> {
        unsupported()
    }

    fn list_files<'a>(&'a self, drive: &'a DriveInfo) -> SdkFuture<'a, Vec<FileInfo>> {
        Box::pin(async move { Ok(self.listing(&drive.id)) })
    }

    fn list_drives(&self) -> SdkFuture<'_, Vec<DriveInfo>> {
        unsupported()
    }

    fn create_drive<'a>(
        &'a self,
        _name: &'a str,
        _batch_id: &'a str,
        _redundancy_level: u8,
    ) -> SdkFuture<'a, DriveInfo> {
        unsupported()
    }

    fn destroy_drive<'a>(&'a self, _drive: &'a DriveInfo) -> SdkFuture<'a, ()> {
        unsupported()
    }

    fn subscribe(&self) -> Option<mpsc::Receiver<FileManagerEvent>> {
        None
    }
}
