//! Downloads with tracking, cancellation and a direct-to-disk path.

use std::path::Path;
use std::sync::Arc;

use swarmdesk_sdk::{DownloadProgress, FileInfo, FileManager, SdkError};
use swarmdesk_transfer::{DownloadProps, TransferStatus, TransferTracker};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use crate::abort::AbortManager;
use crate::error::UploadError;
use crate::types::{DownloadOutput, DownloadTarget};

/// Runs downloads. Unlike uploads they are independent and may overlap.
#[derive(Clone)]
pub struct DownloadManager {
    fm: Arc<dyn FileManager>,
    tracker: TransferTracker,
    aborts: AbortManager,
}

impl DownloadManager {
    pub fn new(fm: Arc<dyn FileManager>, tracker: TransferTracker, aborts: AbortManager) -> Self {
        Self {
            fm,
            tracker,
            aborts,
        }
    }

    /// Downloads the current version of `file` under a fresh uuid.
    pub async fn download(
        &self,
        file: &FileInfo,
        target: DownloadTarget,
    ) -> Result<DownloadOutput, UploadError> {
        let props = DownloadProps::new(file.name.clone(), file.size);
        self.download_with(file, props, target).await
    }

    /// Downloads with caller-supplied props, so the caller knows the uuid
    /// to [`cancel`](Self::cancel) with.
    pub async fn download_with(
        &self,
        file: &FileInfo,
        props: DownloadProps,
        target: DownloadTarget,
    ) -> Result<DownloadOutput, UploadError> {
        let uuid = props.uuid.clone();
        let handle = self.aborts.register(&uuid);
        let report = self.tracker.track_download(props);

        // Completion is signalled here, after the bytes are stored.
        let on_progress = {
            let report = Arc::clone(&report);
            Arc::new(move |p: DownloadProgress| {
                if p.is_downloading {
                    report(p);
                }
            })
        };

        let token = handle.token().clone();
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(SdkError::cancelled()),
            r = self.fm.download(file, on_progress, token.clone()) => r,
        };
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                self.aborts.remove(&uuid);
                if handle.is_user_cancelled() {
                    self.tracker.mark_cancelled(&uuid);
                    info!(uuid = %uuid, name = %file.name, "download cancelled");
                    return Err(UploadError::Cancelled);
                }
                self.tracker.mark_error(&uuid, e.user_message());
                error!(uuid = %uuid, name = %file.name, kind = ?e.kind, error = %e, "download failed");
                return Err(e.into());
            }
        };

        self.tracker.set_status(&uuid, TransferStatus::Finalizing);
        let received = bytes.len() as u64;
        let output = match target {
            DownloadTarget::Memory => DownloadOutput::Memory(bytes),
            DownloadTarget::Disk(path) => match write_file(&path, &bytes).await {
                Ok(()) => DownloadOutput::Disk(path),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "cannot write download target, returning bytes instead"
                    );
                    DownloadOutput::Memory(bytes)
                }
            },
        };
        report(DownloadProgress {
            progress: received,
            is_downloading: false,
        });
        self.aborts.remove(&uuid);
        info!(uuid = %uuid, name = %file.name, bytes = received, "download completed");
        Ok(output)
    }

    pub fn cancel(&self, uuid: &str) -> bool {
        self.aborts.cancel(uuid)
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut out = tokio::fs::File::create(path).await?;
    let written = async {
        out.write_all(bytes).await?;
        out.flush().await?;
        out.sync_all().await
    }
    .await;
    if written.is_err() {
        drop(out);
        let _ = tokio::fs::remove_file(path).await;
    }
    written
}
