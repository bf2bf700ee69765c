//! Error types for saving libraries.

use thiserror::Error;

use super::lock::LockError;
use crate::model::ModelError;
use crate::transform::TransformError;

/// Fatal errors of one save. Each aborts that library's save only.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Built-in, legacy or flagged library. Raised before any lock.
    #[error("library '{0}' is read-only")]
    ReadOnly(String),

    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    /// Absent or invalid credentials; the two are not distinguished.
    #[error("access denied to namespace '{namespace}'")]
    AccessDenied { namespace: String },

    /// The save handler has nowhere to write the library.
    #[error("library '{0}' has no save location")]
    MissingLocation(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SaveError {
    pub fn access_denied(namespace: impl Into<String>) -> Self {
        Self::AccessDenied {
            namespace: namespace.into(),
        }
    }

    pub fn serialize(err: impl std::fmt::Display) -> Self {
        Self::Serialize(err.to_string())
    }

    pub fn is_lock_timeout(&self) -> bool {
        matches!(self, Self::Lock(err) if err.is_timeout())
    }
}
