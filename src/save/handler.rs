//! Persistence of emitted wire documents.
//!
//! A handler keeps exactly one prior revision of each resource as backup:
//! every save replaces the previous backup with the current content.

use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tempfile::NamedTempFile;

use super::error::SaveError;
use crate::base::ResourceId;
use crate::config::EngineConfig;
use crate::model::Library;
use crate::transform::WireDocument;

/// Writes a document for a library.
pub trait SaveHandler: Send + Sync {
    /// Whether this handler has somewhere to write `library`. Asked before
    /// any lock is taken.
    fn can_save(&self, library: &Library) -> bool {
        library.location.is_some()
    }

    fn persist(&self, library: &Library, document: &WireDocument) -> Result<(), SaveError>;
}

// ============================================================================
// FILE HANDLER
// ============================================================================

/// Writes to the library's location, moving the previous file aside.
///
/// New content is staged in a sibling temporary file first; the current
/// file is only rotated to the backup once the staged copy is complete.
///
/// `.json` (or any other extension) is written as pretty JSON. `.yaml` /
/// `.yml` needs the `yaml` feature.
#[derive(Clone, Debug)]
pub struct FileSaveHandler {
    backup_suffix: String,
}

impl Default for FileSaveHandler {
    fn default() -> Self {
        Self::new(".bak")
    }
}

impl FileSaveHandler {
    pub fn new(backup_suffix: impl Into<String>) -> Self {
        Self {
            backup_suffix: backup_suffix.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.backup_suffix.clone())
    }

    /// Path of the single backup kept for `path`.
    pub fn backup_path(&self, path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(&self.backup_suffix);
        PathBuf::from(name)
    }

    fn encode(path: &Path, document: &WireDocument) -> Result<String, SaveError> {
        let yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        if yaml {
            return Self::encode_yaml(document);
        }
        document.to_json_pretty().map_err(SaveError::serialize)
    }

    #[cfg(feature = "yaml")]
    fn encode_yaml(document: &WireDocument) -> Result<String, SaveError> {
        serde_yaml::to_string(document).map_err(SaveError::serialize)
    }

    #[cfg(not(feature = "yaml"))]
    fn encode_yaml(_document: &WireDocument) -> Result<String, SaveError> {
        Err(SaveError::Serialize("YAML output requires the `yaml` feature".to_string()))
    }
}

impl SaveHandler for FileSaveHandler {
    fn persist(&self, library: &Library, document: &WireDocument) -> Result<(), SaveError> {
        let path = library
            .location
            .as_deref()
            .ok_or_else(|| SaveError::MissingLocation(library.name.to_string()))?;
        let content = Self::encode(path, document)?;

        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir)?;
        staged.write_all(content.as_bytes())?;
        staged.as_file().sync_all()?;

        let backup = self.backup_path(path);
        let rotated = path.is_file();
        if rotated {
            if backup.exists() {
                std::fs::remove_file(&backup)?;
            }
            std::fs::rename(path, &backup)?;
            tracing::trace!("[SAVE] backup {}", backup.display());
        }
        if let Err(err) = staged.persist(path) {
            if rotated {
                std::fs::rename(&backup, path)?;
            }
            return Err(err.error.into());
        }
        Ok(())
    }
}

// ============================================================================
// MEMORY HANDLER
// ============================================================================

#[derive(Clone, Debug, Default)]
struct Revisions {
    current: Option<WireDocument>,
    backup: Option<WireDocument>,
    saves: usize,
}

/// Keeps documents in memory, keyed by resource.
#[derive(Debug, Default)]
pub struct MemorySaveHandler {
    stored: Mutex<FxHashMap<ResourceId, Revisions>>,
}

impl MemorySaveHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last persisted document.
    pub fn current(&self, resource: &ResourceId) -> Option<WireDocument> {
        self.stored.lock().get(resource).and_then(|r| r.current.clone())
    }

    /// The revision before the last one.
    pub fn backup(&self, resource: &ResourceId) -> Option<WireDocument> {
        self.stored.lock().get(resource).and_then(|r| r.backup.clone())
    }

    pub fn save_count(&self, resource: &ResourceId) -> usize {
        self.stored.lock().get(resource).map_or(0, |r| r.saves)
    }

    pub fn len(&self) -> usize {
        self.stored.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.stored.lock().is_empty()
    }
}

impl SaveHandler for MemorySaveHandler {
    fn persist(&self, library: &Library, document: &WireDocument) -> Result<(), SaveError> {
        let mut stored = self.stored.lock();
        let revisions = stored.entry(library.resource_id()).or_default();
        revisions.backup = revisions.current.replace(document.clone());
        revisions.saves += 1;
        Ok(())
    }
}
