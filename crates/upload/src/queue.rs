//! Serial upload queue.
//!
//! Accepted files go onto a channel drained by a single worker task, so at
//! most one upload runs at a time. A task cancelled while queued is skipped
//! without touching the SDK. A running task has its SDK call raced against
//! its cancellation token.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use swarmdesk_sdk::{DriveInfo, FileInfo, FileManager, PostageBatch, SdkError};
use swarmdesk_settings::PendingUpload;
use swarmdesk_transfer::{TransferStatus, TransferTracker, validate_file_name};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::abort::AbortManager;
use crate::conflict::{ConflictRequest, ConflictResolution, ConflictResolver, ConflictState, has_conflict};
use crate::error::UploadError;
use crate::journal::UploadJournal;
use crate::types::{LocalFile, QueueConfig, UploadEvent, UploadTask};

pub struct UploadQueue {
    tracker: TransferTracker,
    aborts: AbortManager,
    /// Uuids dispatched by this queue and not yet finished. The abort
    /// registry may also hold downloads.
    owned: Owned,
    resolver: ConflictResolver,
    journal: Option<Arc<dyn UploadJournal>>,
    config: QueueConfig,
    tasks: mpsc::UnboundedSender<UploadTask>,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
    running: Arc<AtomicBool>,
}

impl UploadQueue {
    /// Creates the queue and spawns its worker on the current runtime.
    pub fn new(
        fm: Arc<dyn FileManager>,
        tracker: TransferTracker,
        config: QueueConfig,
        journal: Option<Arc<dyn UploadJournal>>,
    ) -> Self {
        let (tasks, tasks_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::channel(config.event_capacity);
        let aborts = AbortManager::new();
        let owned = Owned::default();
        let running = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            fm,
            tracker: tracker.clone(),
            aborts: aborts.clone(),
            owned: Arc::clone(&owned),
            journal: journal.clone(),
            events: events_tx.clone(),
            running: Arc::clone(&running),
        };
        tokio::spawn(worker.run(tasks_rx));

        Self {
            tracker,
            aborts,
            owned,
            resolver: ConflictResolver::new(config.max_conflict_prompts),
            journal,
            config,
            tasks,
            events_tx,
            events_rx: Some(events_rx),
            running,
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    /// Takes the conflict prompt receiver. Can only be called once.
    ///
    /// Until it is taken, conflicting files are skipped.
    pub fn take_conflict_requests(&self) -> Option<mpsc::Receiver<ConflictRequest>> {
        self.resolver.take_requests()
    }

    pub fn conflict_state(&self) -> ConflictState {
        self.resolver.state()
    }

    pub fn tracker(&self) -> &TransferTracker {
        &self.tracker
    }

    /// The cancellation registry, for sharing with a download manager.
    pub fn aborts(&self) -> &AbortManager {
        &self.aborts
    }

    /// Whether the worker is busy with a task.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Validates a batch, resolves name conflicts, and queues the accepted
    /// files. Returns the uuids of the queued uploads.
    ///
    /// Batch-level checks (file count, stamp capacity, names) reject the
    /// whole batch. A conflict answered with cancel only skips that file.
    pub async fn enqueue(
        &self,
        files: Vec<LocalFile>,
        drive: &DriveInfo,
        stamp: &PostageBatch,
        existing: &[FileInfo],
    ) -> Result<Vec<String>, UploadError> {
        let max = self.config.max_files_per_batch;
        if files.len() > max {
            warn!(count = files.len(), max, "too many files selected");
            return Err(UploadError::TooManyFiles {
                count: files.len(),
                max,
            });
        }
        if files.is_empty() {
            return Ok(Vec::new());
        }
        if !stamp.is_usable() {
            return Err(UploadError::StampUnusable(stamp.batch_id.clone()));
        }
        let needed: u64 = files.iter().map(|f| f.size).sum();
        let available = stamp.remaining_bytes();
        if needed > available {
            warn!(needed, available, batch = %stamp.batch_id, "stamp capacity exceeded");
            return Err(UploadError::InsufficientCapacity { needed, available });
        }
        for file in &files {
            validate_file_name(&file.name)?;
        }

        let remote: Vec<&FileInfo> = existing
            .iter()
            .filter(|f| f.is_active() && f.drive_id == drive.id)
            .collect();
        let mut taken: Vec<String> = remote.iter().map(|f| f.name.clone()).collect();
        taken.extend(self.tracker.in_flight_names(&drive.name));

        let mut accepted = Vec::with_capacity(files.len());
        for file in files {
            let mut task = UploadTask {
                uuid: Uuid::new_v4().to_string(),
                final_name: file.name.clone(),
                file,
                is_replace: false,
                replace_topic: None,
                replace_history: None,
                drive_id: drive.id.clone(),
                drive_name: drive.name.clone(),
            };

            if has_conflict(&task.final_name, &taken) {
                let target = remote.iter().find(|f| f.name == task.final_name).copied();
                let resolution = self
                    .resolver
                    .resolve(&task.final_name, &taken, target.is_some())
                    .await;
                match (resolution, target) {
                    (ConflictResolution::KeepBoth { name }, _) => {
                        debug!(from = %task.final_name, to = %name, "keeping both files");
                        task.final_name = name;
                    }
                    (ConflictResolution::Replace, Some(target)) => {
                        task.is_replace = true;
                        task.replace_topic = Some(target.topic.clone());
                        task.replace_history = Some(target.history_ref.clone());
                    }
                    _ => {
                        info!(name = %task.final_name, "upload skipped after name conflict");
                        continue;
                    }
                }
            }

            if !task.is_replace {
                taken.push(task.final_name.clone());
            }
            accepted.push(task);
        }

        let mut uuids = Vec::with_capacity(accepted.len());
        for task in accepted {
            uuids.push(self.dispatch(task)?);
        }
        Ok(uuids)
    }

    fn dispatch(&self, task: UploadTask) -> Result<String, UploadError> {
        let uuid = task.uuid.clone();
        let name = task.final_name.clone();
        self.tracker.enqueue_upload(
            &uuid,
            &name,
            task.file.size,
            task.kind(),
            Some(&task.drive_name),
        );
        self.aborts.register(&uuid);
        self.owned.lock().unwrap().insert(uuid.clone());
        if let Some(journal) = &self.journal {
            let entry = PendingUpload {
                uuid: uuid.clone(),
                name: name.clone(),
                size: task.file.size,
                drive_name: task.drive_name.clone(),
                queued_at: Utc::now(),
            };
            if let Err(e) = journal.record(entry) {
                warn!(uuid = %uuid, error = %e, "failed to journal queued upload");
            }
        }

        if self.tasks.send(task).is_err() {
            error!(uuid = %uuid, "upload worker is gone");
            let err = UploadError::QueueClosed;
            self.tracker.mark_error(&uuid, &err.to_string());
            forget(&self.aborts, &self.owned, self.journal.as_deref(), &uuid);
            return Err(err);
        }
        info!(uuid = %uuid, name = %name, "upload queued");
        emit(&self.events_tx, UploadEvent::Queued {
            uuid: uuid.clone(),
            name,
        });
        Ok(uuid)
    }

    /// Cancels one upload. A queued upload turns Cancelled right away and
    /// never reaches the SDK.
    pub fn cancel(&self, uuid: &str) -> bool {
        if !self.owned.lock().unwrap().contains(uuid) || !self.aborts.cancel(uuid) {
            return false;
        }
        self.mark_if_queued(uuid);
        true
    }

    /// Cancels every queued and running upload. Returns how many were hit.
    /// Downloads sharing the abort registry are left alone.
    pub fn cancel_all(&self) -> usize {
        let uuids: Vec<String> = self.owned.lock().unwrap().iter().cloned().collect();
        let mut hit = 0;
        for uuid in &uuids {
            if self.aborts.cancel(uuid) {
                self.mark_if_queued(uuid);
                hit += 1;
            }
        }
        hit
    }

    fn mark_if_queued(&self, uuid: &str) {
        let queued = self
            .tracker
            .get(uuid)
            .is_some_and(|item| item.status == TransferStatus::Queued);
        if queued {
            self.tracker.mark_cancelled(uuid);
        }
    }
}

/// The single consumer of the task channel.
struct Worker {
    fm: Arc<dyn FileManager>,
    tracker: TransferTracker,
    aborts: AbortManager,
    owned: Owned,
    journal: Option<Arc<dyn UploadJournal>>,
    events: mpsc::Sender<UploadEvent>,
    running: Arc<AtomicBool>,
}

impl Worker {
    async fn run(self, mut tasks: mpsc::UnboundedReceiver<UploadTask>) {
        while let Some(task) = tasks.recv().await {
            self.running.store(true, Ordering::SeqCst);
            self.process(task).await;
            if tasks.is_empty() {
                self.running.store(false, Ordering::SeqCst);
                emit(&self.events, UploadEvent::Idle);
            }
        }
        self.running.store(false, Ordering::SeqCst);
        debug!("upload worker stopped");
    }

    async fn process(&self, task: UploadTask) {
        let uuid = task.uuid.clone();
        let handle = self
            .aborts
            .handle(&uuid)
            .unwrap_or_else(|| self.aborts.register(&uuid));

        if handle.is_cancelled() {
            debug!(uuid = %uuid, name = %task.final_name, "skipping cancelled upload");
            self.tracker.mark_cancelled(&uuid);
            emit(&self.events, UploadEvent::Cancelled { uuid: uuid.clone() });
            forget(&self.aborts, &self.owned, self.journal.as_deref(), &uuid);
            return;
        }

        emit(&self.events, UploadEvent::Started { uuid: uuid.clone() });
        info!(
            uuid = %uuid,
            name = %task.final_name,
            drive = %task.drive_name,
            replace = task.is_replace,
            "upload started"
        );
        let on_progress = self.tracker.track_upload(
            &uuid,
            &task.final_name,
            task.file.size,
            task.kind(),
            Some(&task.drive_name),
        );
        let token = handle.token().clone();
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(SdkError::cancelled()),
            r = self.fm.upload(task.request(), on_progress, token.clone()) => r,
        };

        match result {
            Ok(file) => {
                self.tracker.mark_done(&uuid);
                info!(uuid = %uuid, name = %file.name, topic = %file.topic, "upload completed");
                emit(&self.events, UploadEvent::Completed {
                    uuid: uuid.clone(),
                    file,
                });
            }
            Err(_) if handle.is_user_cancelled() => {
                self.tracker.mark_cancelled(&uuid);
                info!(uuid = %uuid, "upload cancelled");
                emit(&self.events, UploadEvent::Cancelled { uuid: uuid.clone() });
            }
            Err(e) => {
                let message = e.user_message();
                self.tracker.mark_error(&uuid, message);
                error!(uuid = %uuid, kind = ?e.kind, error = %e, "upload failed");
                emit(&self.events, UploadEvent::Failed {
                    uuid: uuid.clone(),
                    error: message.to_string(),
                });
            }
        }
        forget(&self.aborts, &self.owned, self.journal.as_deref(), &uuid);
    }
}

type Owned = Arc<Mutex<HashSet<String>>>;

fn forget(aborts: &AbortManager, owned: &Owned, journal: Option<&dyn UploadJournal>, uuid: &str) {
    aborts.remove(uuid);
    owned.lock().unwrap().remove(uuid);
    if let Some(journal) = journal
        && let Err(e) = journal.remove(uuid)
    {
        warn!(uuid = %uuid, error = %e, "failed to clear upload journal entry");
    }
}

/// Events are advisory; a full or closed channel never stalls the worker.
fn emit(tx: &mpsc::Sender<UploadEvent>, event: UploadEvent) {
    if let Err(e) = tx.try_send(event) {
        debug!(error = %e, "upload event dropped");
    }
}
