//! Engine configuration.
//!
//! ```json
//! {
//!   "lock_timeout_ms": 5000,
//!   "protected_namespaces": ["http://example.org/ns/core"],
//!   "default_dialect": "1.6",
//!   "backup_suffix": ".bak"
//! }
//! ```
//!
//! Every field is optional; missing fields take their defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::base::Dialect;
use crate::base::constants::DEFAULT_LOCK_TIMEOUT_MS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long a save waits for the write lock.
    pub lock_timeout_ms: u64,
    /// Namespaces (and everything below them) whose saves need credentials
    /// and always carry a checksum.
    pub protected_namespaces: Vec<String>,
    /// Dialect for libraries that were not loaded from a document.
    pub default_dialect: Dialect,
    /// Suffix of the single backup file kept per saved library.
    pub backup_suffix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            protected_namespaces: Vec::new(),
            default_dialect: Dialect::CURRENT,
            backup_suffix: ".bak".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("[CONFIG] loaded {}", path.display());
        Self::from_json(&text)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn protecting(mut self, namespace: impl Into<String>) -> Self {
        self.protected_namespaces.push(namespace.into());
        self
    }
}
