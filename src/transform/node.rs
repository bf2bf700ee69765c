//! Transform inputs and outputs, and the keys transformers are registered by.

use std::fmt;

use super::error::TransformError;
use super::{v14, v16};
use crate::base::Dialect;
use crate::model::{Entity, EntityDef, EntityKind, Library, LibraryDef};

// ============================================================================
// KINDS
// ============================================================================

/// Kind of a wire-tree node. Not every dialect has every kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WireKind {
    Library,
    SimpleType,
    /// Single enumeration kind with an open flag.
    Enumeration,
    ClosedEnumeration,
    OpenEnumeration,
    ValueWithAttributes,
    CoreObject,
    BusinessObject,
    ChoiceObject,
    Service,
    ExtensionPoint,
}

/// Registry key component: what a transformer consumes or produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A model library.
    Library,
    /// A model entity of the given kind.
    Entity(EntityKind),
    /// A wire-tree node.
    Wire(WireKind),
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library => f.write_str("library"),
            Self::Entity(kind) => f.write_str(kind.display()),
            Self::Wire(kind) => write!(f, "wire {kind:?}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Loading: wire tree → model definitions.
    WireToModel,
    /// Saving: model → wire tree.
    ModelToWire,
}

/// A partition of the registry: one direction of one dialect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FactorySetId {
    pub direction: Direction,
    pub dialect: Dialect,
}

impl FactorySetId {
    pub fn to_model(dialect: Dialect) -> Self {
        Self {
            direction: Direction::WireToModel,
            dialect,
        }
    }

    pub fn to_wire(dialect: Dialect) -> Self {
        Self {
            direction: Direction::ModelToWire,
            dialect,
        }
    }
}

impl fmt::Display for FactorySetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::WireToModel => write!(f, "{} -> model", self.dialect),
            Direction::ModelToWire => write!(f, "model -> {}", self.dialect),
        }
    }
}

// ============================================================================
// NODES
// ============================================================================

/// Borrowed transformer input.
#[derive(Clone, Copy, Debug)]
pub enum NodeRef<'a> {
    Library(&'a Library),
    Entity(&'a Entity),
    V14Library(&'a v14::Library),
    V14Member(&'a v14::Member),
    V16Library(&'a v16::Library),
    V16Member(&'a v16::Member),
}

impl NodeRef<'_> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Library(_) => NodeKind::Library,
            Self::Entity(e) => NodeKind::Entity(e.kind()),
            Self::V14Library(_) | Self::V16Library(_) => NodeKind::Wire(WireKind::Library),
            Self::V14Member(m) => NodeKind::Wire(v14::wire_kind(m)),
            Self::V16Member(m) => NodeKind::Wire(v16::wire_kind(m)),
        }
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Self::Library(_) => "model library",
            Self::Entity(_) => "model entity",
            Self::V14Library(_) => "1.4 library",
            Self::V14Member(_) => "1.4 member",
            Self::V16Library(_) => "1.6 library",
            Self::V16Member(_) => "1.6 member",
        }
    }

    /// Name of the node, for findings.
    pub fn name(&self) -> &str {
        match self {
            Self::Library(l) => &l.name,
            Self::Entity(e) => &e.name,
            Self::V14Library(l) => &l.name,
            Self::V14Member(m) => m.name(),
            Self::V16Library(l) => &l.name,
            Self::V16Member(m) => m.name(),
        }
    }
}

/// Owned transformer output.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    LibraryDef(LibraryDef),
    EntityDef(EntityDef),
    V14Library(v14::Library),
    V14Member(v14::Member),
    V16Library(v16::Library),
    V16Member(v16::Member),
}

impl Node {
    fn describe(&self) -> &'static str {
        match self {
            Self::LibraryDef(_) => "library definition",
            Self::EntityDef(_) => "entity definition",
            Self::V14Library(_) => "1.4 library",
            Self::V14Member(_) => "1.4 member",
            Self::V16Library(_) => "1.6 library",
            Self::V16Member(_) => "1.6 member",
        }
    }

    pub fn into_library_def(self) -> Result<LibraryDef, TransformError> {
        match self {
            Self::LibraryDef(def) => Ok(def),
            other => Err(TransformError::unexpected("library definition", other.describe())),
        }
    }

    pub fn into_entity_def(self) -> Result<EntityDef, TransformError> {
        match self {
            Self::EntityDef(def) => Ok(def),
            other => Err(TransformError::unexpected("entity definition", other.describe())),
        }
    }

    pub fn into_v14_library(self) -> Result<v14::Library, TransformError> {
        match self {
            Self::V14Library(lib) => Ok(lib),
            other => Err(TransformError::unexpected("1.4 library", other.describe())),
        }
    }

    pub fn into_v14_member(self) -> Result<v14::Member, TransformError> {
        match self {
            Self::V14Member(member) => Ok(member),
            other => Err(TransformError::unexpected("1.4 member", other.describe())),
        }
    }

    pub fn into_v16_library(self) -> Result<v16::Library, TransformError> {
        match self {
            Self::V16Library(lib) => Ok(lib),
            other => Err(TransformError::unexpected("1.6 library", other.describe())),
        }
    }

    pub fn into_v16_member(self) -> Result<v16::Member, TransformError> {
        match self {
            Self::V16Member(member) => Ok(member),
            other => Err(TransformError::unexpected("1.6 member", other.describe())),
        }
    }
}
