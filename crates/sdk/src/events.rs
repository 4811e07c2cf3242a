use serde::{Deserialize, Serialize};

/// Cache-invalidation events emitted by the file manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FileManagerEvent {
    FileUploaded { drive_id: String, topic: String },
    FileTrashed { drive_id: String, topic: String },
    FileRecovered { drive_id: String, topic: String },
    FileForgotten { drive_id: String, topic: String },
    VersionRestored { drive_id: String, topic: String },
    DriveCreated { drive_id: String },
    DriveDestroyed { drive_id: String },
}

impl FileManagerEvent {
    /// Drive whose listing the event invalidates.
    pub fn drive_id(&self) -> &str {
        match self {
            Self::FileUploaded { drive_id, .. }
            | Self::FileTrashed { drive_id, .. }
            | Self::FileRecovered { drive_id, .. }
            | Self::FileForgotten { drive_id, .. }
            | Self::VersionRestored { drive_id, .. }
            | Self::DriveCreated { drive_id }
            | Self::DriveDestroyed { drive_id } => drive_id,
        }
    }

    /// Whether the set of drives itself changed.
    pub fn changes_drive_list(&self) -> bool {
        matches!(self, Self::DriveCreated { .. } | Self::DriveDestroyed { .. })
    }
}
