//! Error types for transformation.

use thiserror::Error;

use super::node::{FactorySetId, NodeKind};
use crate::model::{EntityId, LibraryId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// No transformer registered for the pair in this factory set.
    #[error("no transformer from {from} to {to} in factory set '{factory_set}'")]
    Unavailable {
        from: NodeKind,
        to: NodeKind,
        factory_set: FactorySetId,
        /// Name of the node that could not be transformed.
        node: String,
    },

    /// A transformer returned a node of the wrong shape.
    #[error("expected {expected}, got {found}")]
    UnexpectedNode {
        expected: &'static str,
        found: &'static str,
    },

    /// Model → wire transforms need the model in the context.
    #[error("transform context carries no model")]
    MissingModel,

    #[error("unknown library: {0}")]
    UnknownLibrary(LibraryId),

    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// A wire value that cannot be represented.
    #[error("invalid {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },
}

impl TransformError {
    pub fn unexpected(expected: &'static str, found: &'static str) -> Self {
        Self::UnexpectedNode { expected, found }
    }

    pub fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }

    /// True for missing-transformer errors.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
