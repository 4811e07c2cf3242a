//! In-memory SDK clients for tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use swarmdesk_sdk::{
    ChainState, DownloadProgressFn, DriveInfo, DurationSecs, FileInfo, FileManager,
    FileManagerEvent, FileStatus, PostageBatch, SdkError, SdkErrorKind, SdkFuture, StorageNode,
    UploadProgressFn, UploadRequest,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub(crate) fn file(drive_id: &str, topic: &str, name: &str, version: u64) -> FileInfo {
    FileInfo {
        topic: topic.into(),
        version,
        owner: "0xowner".into(),
        name: name.into(),
        custom_metadata: BTreeMap::new(),
        file_ref: format!("{topic}-ref-{version}"),
        history_ref: format!("{topic}-history"),
        drive_id: drive_id.into(),
        status: FileStatus::Active,
        size: Some(100),
        modified: None,
    }
}

pub(crate) fn drive(id: &str, batch_id: &str) -> DriveInfo {
    DriveInfo {
        id: id.into(),
        name: format!("drive-{id}"),
        batch_id: batch_id.into(),
        is_admin: false,
        redundancy_level: 0,
    }
}

pub(crate) fn batch(batch_id: &str, usable: bool) -> PostageBatch {
    PostageBatch {
        batch_id: batch_id.into(),
        label: String::new(),
        depth: 20,
        bucket_depth: 16,
        amount: "1000".into(),
        usable,
        duration_secs: 86_400,
        utilization: 0,
    }
}

#[derive(Default)]
pub(crate) struct MockState {
    pub drives: Vec<DriveInfo>,
    /// Head file per topic.
    pub files: Vec<FileInfo>,
    /// All stored versions per topic.
    pub versions: HashMap<String, Vec<u64>>,
    /// Topics whose trash/recover/forget calls fail.
    pub failing: HashSet<String>,
    pub lookups: Vec<u64>,
    pub list_drive_errors: Vec<SdkError>,
    pub list_files_calls: usize,
    pub restored: Vec<u64>,
    pub events: Option<mpsc::Receiver<FileManagerEvent>>,
}

#[derive(Default)]
pub(crate) struct MockFm {
    pub state: Mutex<MockState>,
}

impl MockFm {
    pub fn with(drives: Vec<DriveInfo>, files: Vec<FileInfo>) -> Self {
        let fm = Self::default();
        {
            let mut s = fm.state.lock().unwrap();
            for f in &files {
                s.versions.insert(f.topic.clone(), (0..=f.version).collect());
            }
            s.drives = drives;
            s.files = files;
        }
        fm
    }

    fn set_status(&self, file: &FileInfo, status: Option<FileStatus>) -> Result<(), SdkError> {
        let mut s = self.state.lock().unwrap();
        if s.failing.contains(&file.topic) {
            return Err(SdkError::new(SdkErrorKind::NodeCrash, "boom"));
        }
        match status {
            Some(status) => {
                let f = s
                    .files
                    .iter_mut()
                    .find(|f| f.topic == file.topic)
                    .ok_or_else(|| SdkError::not_found(file.topic.clone()))?;
                f.status = status;
            }
            None => s.files.retain(|f| f.topic != file.topic),
        }
        Ok(())
    }
}

impl FileManager for MockFm {
    fn upload(
        &self,
        _request: UploadRequest,
        _on_progress: UploadProgressFn,
        _cancel: CancellationToken,
    ) -> SdkFuture<'_, FileInfo> {
        Box::pin(async { Err(SdkError::new(SdkErrorKind::Unknown, "unsupported")) })
    }

    fn download<'a>(
        &'a self,
        _file: &'a FileInfo,
        _on_progress: DownloadProgressFn,
        _cancel: CancellationToken,
    ) -> SdkFuture<'a, Vec<u8>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn trash_file<'a>(&'a self, file: &'a FileInfo) -> SdkFuture<'a, ()> {
        Box::pin(async move { self.set_status(file, Some(FileStatus::Trashed)) })
    }

    fn recover_file<'a>(&'a self, file: &'a FileInfo) -> SdkFuture<'a, ()> {
        Box::pin(async move { self.set_status(file, Some(FileStatus::Active)) })
    }

    fn forget_file<'a>(&'a self, file: &'a FileInfo) -> SdkFuture<'a, ()> {
        Box::pin(async move { self.set_status(file, None) })
    }

    fn restore_version<'a>(&'a self, version: &'a FileInfo) -> SdkFuture<'a, ()> {
        Box::pin(async move {
            self.state.lock().unwrap().restored.push(version.version);
            Ok(())
        })
    }

    fn get_version<'a>(
        &'a self,
        file: &'a FileInfo,
        version: Option<u64>,
    ) -> SdkFuture<'a, FileInfo> {
        Box::pin(async move {
            let mut s = self.state.lock().unwrap();
            let head = s
                .files
                .iter()
                .find(|f| f.topic == file.topic)
                .cloned()
                .ok_or_else(|| SdkError::not_found(file.topic.clone()))?;
            let Some(v) = version else {
                return Ok(head);
            };
            s.lookups.push(v);
            let exists = s
                .versions
                .get(&file.topic)
                .is_some_and(|vs| vs.contains(&v));
            if exists {
                let mut info = head;
                info.version = v;
                info.file_ref = format!("{}-ref-{v}", file.topic);
                Ok(info)
            } else {
                Err(SdkError::not_found(format!("{} v{v}", file.topic)))
            }
        })
    }

    fn list_files<'a>(&'a self, drive: &'a DriveInfo) -> SdkFuture<'a, Vec<FileInfo>> {
        Box::pin(async move {
            let mut s = self.state.lock().unwrap();
            s.list_files_calls += 1;
            Ok(s.files
                .iter()
                .filter(|f| f.drive_id == drive.id)
                .cloned()
                .collect())
        })
    }

    fn list_drives(&self) -> SdkFuture<'_, Vec<DriveInfo>> {
        Box::pin(async move {
            let mut s = self.state.lock().unwrap();
            if !s.list_drive_errors.is_empty() {
                return Err(s.list_drive_errors.remove(0));
            }
            Ok(s.drives.clone())
        })
    }

    fn create_drive<'a>(
        &'a self,
        name: &'a str,
        batch_id: &'a str,
        redundancy_level: u8,
    ) -> SdkFuture<'a, DriveInfo> {
        Box::pin(async move {
            let mut s = self.state.lock().unwrap();
            let info = DriveInfo {
                id: format!("d{}", s.drives.len() + 1),
                name: name.into(),
                batch_id: batch_id.into(),
                is_admin: false,
                redundancy_level,
            };
            s.drives.push(info.clone());
            Ok(info)
        })
    }

    fn destroy_drive<'a>(&'a self, drive: &'a DriveInfo) -> SdkFuture<'a, ()> {
        Box::pin(async move {
            let mut s = self.state.lock().unwrap();
            s.drives.retain(|d| d.id != drive.id);
            s.files.retain(|f| f.drive_id != drive.id);
            Ok(())
        })
    }

    fn subscribe(&self) -> Option<mpsc::Receiver<FileManagerEvent>> {
        self.state.lock().unwrap().events.take()
    }
}

#[derive(Default)]
pub(crate) struct MockNode {
    pub batches: Mutex<Vec<PostageBatch>>,
    pub extended: Mutex<Vec<(String, Option<u64>, Option<DurationSecs>)>>,
}

impl MockNode {
    pub fn with(batches: Vec<PostageBatch>) -> Self {
        Self {
            batches: Mutex::new(batches),
            extended: Mutex::new(Vec::new()),
        }
    }
}

impl StorageNode for MockNode {
    fn get_postage_batches(&self) -> SdkFuture<'_, Vec<PostageBatch>> {
        Box::pin(async move { Ok(self.batches.lock().unwrap().clone()) })
    }

    fn get_storage_cost(&self, size_bytes: u64, duration: DurationSecs) -> SdkFuture<'_, String> {
        Box::pin(async move { Ok((size_bytes * duration).to_string()) })
    }

    fn buy_storage<'a>(
        &'a self,
        _size_bytes: u64,
        duration: DurationSecs,
        label: &'a str,
    ) -> SdkFuture<'a, String> {
        Box::pin(async move {
            let mut batches = self.batches.lock().unwrap();
            let id = format!("b{}", batches.len() + 1);
            let mut b = batch(&id, true);
            b.label = label.into();
            b.duration_secs = duration;
            batches.push(b);
            Ok(id)
        })
    }

    fn extend_storage<'a>(
        &'a self,
        batch_id: &'a str,
        size_bytes: Option<u64>,
        duration: Option<DurationSecs>,
    ) -> SdkFuture<'a, ()> {
        Box::pin(async move {
            self.extended
                .lock()
                .unwrap()
                .push((batch_id.to_string(), size_bytes, duration));
            Ok(())
        })
    }

    fn get_chain_state(&self) -> SdkFuture<'_, ChainState> {
        Box::pin(async {
            Ok(ChainState {
                block: 42,
                current_price: "24000".into(),
            })
        })
    }
}
