//! SDK client traits.
//!
//! The host application implements these over the real file-manager and
//! node clients. Keeping them as traits lets the orchestration crates run
//! against in-memory mocks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::SdkError;
use crate::events::FileManagerEvent;
use crate::types::{
    ChainState, DownloadProgress, DriveInfo, DurationSecs, FileInfo, PostageBatch, UploadProgress,
    UploadRequest,
};

/// Boxed future returned by the client traits.
pub type SdkFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SdkError>> + Send + 'a>>;

/// Callback the SDK invokes while an upload streams.
pub type UploadProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Callback the SDK invokes while a download streams.
pub type DownloadProgressFn = Arc<dyn Fn(DownloadProgress) + Send + Sync>;

/// File-manager client: drive and file semantics.
pub trait FileManager: Send + Sync {
    /// Uploads a file. The SDK should stop early once `cancel` fires.
    fn upload(
        &self,
        request: UploadRequest,
        on_progress: UploadProgressFn,
        cancel: CancellationToken,
    ) -> SdkFuture<'_, FileInfo>;

    /// Downloads the current version of a file.
    fn download<'a>(
        &'a self,
        file: &'a FileInfo,
        on_progress: DownloadProgressFn,
        cancel: CancellationToken,
    ) -> SdkFuture<'a, Vec<u8>>;

    fn trash_file<'a>(&'a self, file: &'a FileInfo) -> SdkFuture<'a, ()>;

    fn recover_file<'a>(&'a self, file: &'a FileInfo) -> SdkFuture<'a, ()>;

    fn forget_file<'a>(&'a self, file: &'a FileInfo) -> SdkFuture<'a, ()>;

    /// Makes an older version the head of its feed.
    fn restore_version<'a>(&'a self, version: &'a FileInfo) -> SdkFuture<'a, ()>;

    /// Looks up a specific version of a file, or the latest one for `None`.
    fn get_version<'a>(&'a self, file: &'a FileInfo, version: Option<u64>)
    -> SdkFuture<'a, FileInfo>;

    fn list_files<'a>(&'a self, drive: &'a DriveInfo) -> SdkFuture<'a, Vec<FileInfo>>;

    fn list_drives(&self) -> SdkFuture<'_, Vec<DriveInfo>>;

    fn create_drive<'a>(
        &'a self,
        name: &'a str,
        batch_id: &'a str,
        redundancy_level: u8,
    ) -> SdkFuture<'a, DriveInfo>;

    fn destroy_drive<'a>(&'a self, drive: &'a DriveInfo) -> SdkFuture<'a, ()>;

    /// Takes the SDK's event stream. Returns `None` after the first call.
    fn subscribe(&self) -> Option<mpsc::Receiver<FileManagerEvent>>;
}

/// Node client: stamps and chain state.
pub trait StorageNode: Send + Sync {
    fn get_postage_batches(&self) -> SdkFuture<'_, Vec<PostageBatch>>;

    /// Price of a stamp with the given capacity and lifetime.
    fn get_storage_cost(&self, size_bytes: u64, duration: DurationSecs) -> SdkFuture<'_, String>;

    /// Buys a new stamp and returns its batch id.
    fn buy_storage<'a>(
        &'a self,
        size_bytes: u64,
        duration: DurationSecs,
        label: &'a str,
    ) -> SdkFuture<'a, String>;

    /// Tops up an existing stamp's capacity, lifetime, or both.
    fn extend_storage<'a>(
        &'a self,
        batch_id: &'a str,
        size_bytes: Option<u64>,
        duration: Option<DurationSecs>,
    ) -> SdkFuture<'a, ()>;

    fn get_chain_state(&self) -> SdkFuture<'_, ChainState>;
}
