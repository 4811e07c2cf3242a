//! Trash, restore and forget across a multi-file selection.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::future::join_all;
use swarmdesk_sdk::{FileInfo, SdkError};
use tracing::{info, warn};

use crate::selection::Selection;
use crate::store::DriveStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOp {
    Trash,
    Restore,
    Forget,
}

impl BulkOp {
    fn label(self) -> &'static str {
        match self {
            Self::Trash => "trash",
            Self::Restore => "restore",
            Self::Forget => "forget",
        }
    }
}

/// Per-file results of a bulk action. Entries are file names.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, SdkError)>,
}

impl BulkOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct BulkActions {
    store: Arc<DriveStore>,
}

impl BulkActions {
    pub fn new(store: Arc<DriveStore>) -> Self {
        Self { store }
    }

    pub async fn trash(&self, files: &[FileInfo], selection: &mut Selection) -> BulkOutcome {
        self.run(BulkOp::Trash, files, selection).await
    }

    pub async fn restore(&self, files: &[FileInfo], selection: &mut Selection) -> BulkOutcome {
        self.run(BulkOp::Restore, files, selection).await
    }

    pub async fn forget(&self, files: &[FileInfo], selection: &mut Selection) -> BulkOutcome {
        self.run(BulkOp::Forget, files, selection).await
    }

    /// Issues every call at once and waits for all of them to settle, then
    /// refreshes each affected drive once and clears the selection.
    pub async fn run(
        &self,
        op: BulkOp,
        files: &[FileInfo],
        selection: &mut Selection,
    ) -> BulkOutcome {
        let fm = self.store.file_manager();
        let results = join_all(files.iter().map(|file| async move {
            let result = match op {
                BulkOp::Trash => fm.trash_file(file).await,
                BulkOp::Restore => fm.recover_file(file).await,
                BulkOp::Forget => fm.forget_file(file).await,
            };
            (file, result)
        }))
        .await;

        let mut outcome = BulkOutcome::default();
        for (file, result) in results {
            match result {
                Ok(()) => outcome.succeeded.push(file.name.clone()),
                Err(e) => {
                    warn!(op = op.label(), file = %file.name, error = %e, "bulk action failed");
                    outcome.failed.push((file.name.clone(), e));
                }
            }
        }

        let drives: BTreeSet<&str> = files.iter().map(|f| f.drive_id.as_str()).collect();
        for drive_id in drives {
            if let Err(e) = self.store.refresh_files(drive_id).await {
                warn!(drive = %drive_id, error = %e, "refresh after bulk action failed");
            }
        }
        selection.clear();

        info!(
            op = op.label(),
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "bulk action finished"
        );
        outcome
    }
}
