//! Error types for structural model operations.

use thiserror::Error;

use super::ids::{EntityId, LibraryId};

/// Structural input errors: fatal for the current operation only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Handle does not name a live library in this model.
    #[error("unknown library: {0}")]
    UnknownLibrary(LibraryId),

    /// Handle does not name a live entity in this model.
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// A library with the same namespace and name is already loaded.
    #[error("library '{name}' is already loaded in namespace '{namespace}'")]
    DuplicateLibrary { namespace: String, name: String },

    /// Attempt to mutate the members of a read-only library.
    #[error("library '{0}' is read-only")]
    ReadOnly(String),

    /// Missing required value.
    #[error("missing required {kind}: {name}")]
    Missing { kind: &'static str, name: String },
}

impl ModelError {
    pub fn missing(kind: &'static str, name: impl Into<String>) -> Self {
        Self::Missing {
            kind,
            name: name.into(),
        }
    }
}
