//! Desktop settings state: snackbar notices, persisted preferences, and
//! the journal of uploads that were queued but never finished.

pub mod notice;
pub mod paths;
pub mod preferences;

pub use notice::{Notice, NoticeKind, NoticeQueue};
pub use paths::default_preferences_path;
pub use preferences::{PendingUpload, Preferences, SortField, SortOrder, SortPreference};

/// Errors from settings persistence.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid private key: {0}")]
    InvalidKey(String),
}
