use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cancellation state of one transfer.
///
/// `user_cancelled` is always set before `token` fires, so whoever observes
/// the token can tell a user abort from a failure.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    token: CancellationToken,
    user_cancelled: Arc<AtomicBool>,
}

impl AbortHandle {
    fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            user_cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_user_cancelled(&self) -> bool {
        self.user_cancelled.load(Ordering::SeqCst)
    }

    fn cancel(&self) {
        self.user_cancelled.store(true, Ordering::SeqCst);
        self.token.cancel();
    }
}

/// Cancellation registry shared by uploads and downloads, keyed by uuid.
#[derive(Debug, Clone, Default)]
pub struct AbortManager {
    handles: Arc<Mutex<HashMap<String, AbortHandle>>>,
}

impl AbortManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the handle for a transfer, replacing any earlier one.
    pub fn register(&self, uuid: &str) -> AbortHandle {
        let handle = AbortHandle::new();
        self.handles
            .lock()
            .unwrap()
            .insert(uuid.to_string(), handle.clone());
        handle
    }

    pub fn handle(&self, uuid: &str) -> Option<AbortHandle> {
        self.handles.lock().unwrap().get(uuid).cloned()
    }

    /// Flags the transfer as user-cancelled, then fires its token.
    pub fn cancel(&self, uuid: &str) -> bool {
        let handle = self.handle(uuid);
        match handle {
            Some(handle) => {
                handle.cancel();
                debug!(uuid = %uuid, "transfer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancels every registered transfer. Returns their uuids.
    pub fn cancel_all(&self) -> Vec<String> {
        let handles: Vec<(String, AbortHandle)> = self
            .handles
            .lock()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (_, handle) in &handles {
            handle.cancel();
        }
        handles.into_iter().map(|(uuid, _)| uuid).collect()
    }

    pub fn remove(&self, uuid: &str) {
        self.handles.lock().unwrap().remove(uuid);
    }

    pub fn len(&self) -> usize {
        self.handles.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_sets_flag_and_token() {
        let aborts = AbortManager::new();
        let handle = aborts.register("u1");
        assert!(!handle.is_cancelled());

        assert!(aborts.cancel("u1"));
        assert!(handle.is_user_cancelled());
        assert!(handle.is_cancelled());
        assert!(!aborts.cancel("missing"));
    }

    #[test]
    fn cancel_all_and_remove() {
        let aborts = AbortManager::new();
        let a = aborts.register("a");
        let b = aborts.register("b");
        let mut ids = aborts.cancel_all();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(a.is_cancelled() && b.is_cancelled());

        aborts.remove("a");
        aborts.remove("b");
        assert!(aborts.is_empty());
    }

    #[tokio::test]
    async fn flag_is_visible_when_token_fires() {
        let aborts = AbortManager::new();
        let handle = aborts.register("u1");
        let watcher = {
            let handle = handle.clone();
            tokio::spawn(async move {
                handle.token().cancelled().await;
                handle.is_user_cancelled()
            })
        };
        aborts.cancel("u1");
        assert!(watcher.await.unwrap());
    }
}
