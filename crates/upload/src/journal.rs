use swarmdesk_settings::{PendingUpload, Preferences, SettingsError};

/// Persistent record of uploads that were accepted but have not finished.
///
/// Entries left over from an earlier session are shown to the user. They
/// are never re-queued automatically.
pub trait UploadJournal: Send + Sync {
    fn record(&self, upload: PendingUpload) -> Result<(), SettingsError>;

    fn remove(&self, uuid: &str) -> Result<(), SettingsError>;
}

impl UploadJournal for Preferences {
    fn record(&self, upload: PendingUpload) -> Result<(), SettingsError> {
        self.record_pending(upload)
    }

    fn remove(&self, uuid: &str) -> Result<(), SettingsError> {
        self.remove_pending(uuid)
    }
}
