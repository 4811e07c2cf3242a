//! Persisted desktop preferences.
//!
//! Holds the signing key, the file list sort order, and the journal of
//! queued uploads. Everything is cached in memory and written back to a
//! single JSON file on each change. The file is replaced atomically through
//! a private temp file. Two processes writing the same file race; the last
//! write wins.

use std::collections::HashSet;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::SettingsError;

/// Column the file list is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Name,
    Size,
    Modified,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortPreference {
    pub field: SortField,
    pub order: SortOrder,
}

/// An upload that was queued and has not finished yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingUpload {
    pub uuid: String,
    pub name: String,
    pub size: u64,
    pub drive_name: String,
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreferencesFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    private_key: Option<String>,
    #[serde(default)]
    sort: SortPreference,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pending_uploads: Vec<PendingUpload>,
}

/// JSON-file backed preferences store.
pub struct Preferences {
    path: PathBuf,
    data: RwLock<PreferencesFile>,
    /// Serialises writers of the temp file.
    write_lock: Mutex<()>,
    /// Journal entries that were already on disk when the store was opened.
    from_previous_session: HashSet<String>,
}

impl Preferences {
    /// Opens the store, loading existing preferences from disk.
    pub fn new(path: PathBuf) -> Result<Self, SettingsError> {
        let data = load_file(&path)?;
        let from_previous_session = data
            .pending_uploads
            .iter()
            .map(|p| p.uuid.clone())
            .collect();
        Ok(Self {
            path,
            data: RwLock::new(data),
            write_lock: Mutex::new(()),
            from_previous_session,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored signing key, normalised to lowercase hex without `0x`.
    pub fn private_key(&self) -> Option<String> {
        self.data.read().unwrap().private_key.clone()
    }

    /// Stores a 32-byte hex signing key (`0x` prefix optional).
    pub fn set_private_key(&self, key: &str) -> Result<(), SettingsError> {
        let normalised = normalise_private_key(key)?;
        self.data.write().unwrap().private_key = Some(normalised);
        self.persist()
    }

    pub fn clear_private_key(&self) -> Result<(), SettingsError> {
        self.data.write().unwrap().private_key = None;
        self.persist()
    }

    pub fn sort(&self) -> SortPreference {
        self.data.read().unwrap().sort
    }

    pub fn set_sort(&self, sort: SortPreference) -> Result<(), SettingsError> {
        self.data.write().unwrap().sort = sort;
        self.persist()
    }

    /// Journals a queued upload.
    pub fn record_pending(&self, upload: PendingUpload) -> Result<(), SettingsError> {
        {
            let mut data = self.data.write().unwrap();
            data.pending_uploads.retain(|p| p.uuid != upload.uuid);
            data.pending_uploads.push(upload);
        }
        self.persist()
    }

    /// Drops a journal entry once its upload finished, failed or was cancelled.
    pub fn remove_pending(&self, uuid: &str) -> Result<(), SettingsError> {
        let removed = {
            let mut data = self.data.write().unwrap();
            let before = data.pending_uploads.len();
            data.pending_uploads.retain(|p| p.uuid != uuid);
            before != data.pending_uploads.len()
        };
        if removed {
            self.persist()?;
        }
        Ok(())
    }

    /// Every journalled upload, oldest first.
    pub fn pending_uploads(&self) -> Vec<PendingUpload> {
        self.data.read().unwrap().pending_uploads.clone()
    }

    /// Uploads queued in an earlier session that never finished.
    ///
    /// These are only reported; nothing re-queues them.
    pub fn interrupted_uploads(&self) -> Vec<PendingUpload> {
        self.data
            .read()
            .unwrap()
            .pending_uploads
            .iter()
            .filter(|p| self.from_previous_session.contains(&p.uuid))
            .cloned()
            .collect()
    }

    /// Forgets every interrupted upload.
    pub fn clear_interrupted(&self) -> Result<(), SettingsError> {
        {
            let mut data = self.data.write().unwrap();
            data.pending_uploads
                .retain(|p| !self.from_previous_session.contains(&p.uuid));
        }
        self.persist()
    }

    /// Writes the current preferences to disk.
    ///
    /// The JSON goes to a sibling temp file created with 0600 permissions,
    /// is synced, then renamed over the real file. A failed write leaves the
    /// previous file intact.
    fn persist(&self) -> Result<(), SettingsError> {
        let _writing = self.write_lock.lock().unwrap();
        let (json, pending) = {
            let data = self.data.read().unwrap();
            (serde_json::to_string_pretty(&*data)?, data.pending_uploads.len())
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = sibling(&self.path, "tmp");
        if let Err(e) = write_private(&tmp, json.as_bytes()) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        std::fs::rename(&tmp, &self.path)?;
        debug!(pending, "persisted preferences to {:?}", self.path);
        Ok(())
    }
}

fn load_file(path: &Path) -> Result<PreferencesFile, SettingsError> {
    if !path.exists() {
        return Ok(PreferencesFile::default());
    }
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str(&content) {
        Ok(data) => Ok(data),
        Err(e) => {
            // The damaged file is kept for manual recovery.
            let aside = sibling(path, "corrupt");
            std::fs::rename(path, &aside)?;
            warn!(
                path = %path.display(),
                moved_to = %aside.display(),
                error = %e,
                "unreadable preferences set aside, using defaults"
            );
            Ok(PreferencesFile::default())
        }
    }
}

/// `preferences.json` -> `preferences.json.<suffix>` in the same directory.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("preferences.json"));
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

fn normalise_private_key(key: &str) -> Result<String, SettingsError> {
    let trimmed = key.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if hex.len() != 64 {
        return Err(SettingsError::InvalidKey(format!(
            "expected 64 hex characters, got {}",
            hex.len()
        )));
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SettingsError::InvalidKey("non-hex character".into()));
    }
    Ok(hex.to_ascii_lowercase())
}

/// Creates (or truncates) `path` readable by the owner only, then writes
/// and syncs `bytes`.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    // `mode` only applies on creation; a leftover temp file keeps its own.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(bytes)?;
    file.sync_all()
}
