//! Libraries: namespaced, ordered collections of entities.

use std::path::PathBuf;
use std::sync::Arc;

use smol_str::SmolStr;

use super::entity::EntityDef;
use super::ids::{EntityId, LibraryId};
use crate::base::{Dialect, ResourceId, Version, split_prefixed};

/// Lifecycle status of a user-defined library.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LibraryStatus {
    #[default]
    Draft,
    UnderReview,
    Final,
    Obsolete,
}

impl LibraryStatus {
    /// Final and obsolete libraries are frozen content and carry a checksum.
    pub fn requires_checksum(&self) -> bool {
        matches!(self, Self::Final | Self::Obsolete)
    }
}

/// Library variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LibraryKind {
    /// Authored by users; the only kind the save pipeline writes.
    User {
        status: LibraryStatus,
        checksum: Option<String>,
    },
    /// Shipped with the engine; fixed namespace, never loaded or saved.
    BuiltIn,
    /// Imported from a foreign schema document.
    Legacy {
        schema_location: Option<String>,
        include_hints: Vec<String>,
        import_hints: Vec<String>,
    },
}

/// A `prefix → namespace` binding declared by a library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceImport {
    pub prefix: SmolStr,
    pub namespace: String,
    /// Where the imported namespace's documents may be found.
    pub file_hints: Vec<String>,
}

impl NamespaceImport {
    pub fn new(prefix: impl Into<SmolStr>, namespace: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            namespace: namespace.into(),
            file_hints: Vec::new(),
        }
    }
}

/// Detached library content: what transformers and loaders produce.
#[derive(Clone, Debug, PartialEq)]
pub struct LibraryDef {
    pub name: SmolStr,
    /// `None` for chameleon libraries.
    pub namespace: Option<String>,
    pub prefix: SmolStr,
    pub version: Option<Version>,
    pub kind: LibraryKind,
    pub imports: Vec<NamespaceImport>,
    pub includes: Vec<String>,
    pub location: Option<PathBuf>,
    pub dialect: Option<Dialect>,
    pub read_only: bool,
    pub comments: Option<String>,
    pub entities: Vec<EntityDef>,
}

impl LibraryDef {
    /// A draft user library.
    pub fn user(name: impl Into<SmolStr>, namespace: impl Into<String>, prefix: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
            prefix: prefix.into(),
            version: None,
            kind: LibraryKind::User {
                status: LibraryStatus::Draft,
                checksum: None,
            },
            imports: Vec::new(),
            includes: Vec::new(),
            location: None,
            dialect: None,
            read_only: false,
            comments: None,
            entities: Vec::new(),
        }
    }

    /// A legacy library. Pass `None` as namespace for a chameleon schema.
    pub fn legacy(name: impl Into<SmolStr>, namespace: Option<String>) -> Self {
        Self {
            kind: LibraryKind::Legacy {
                schema_location: None,
                include_hints: Vec::new(),
                import_hints: Vec::new(),
            },
            namespace,
            ..Self::user(name, "", "")
        }
    }

    pub fn with_status(mut self, status: LibraryStatus) -> Self {
        if let LibraryKind::User { status: s, .. } = &mut self.kind {
            *s = status;
        }
        self
    }

    pub fn with_import(mut self, prefix: impl Into<SmolStr>, namespace: impl Into<String>) -> Self {
        self.imports.push(NamespaceImport::new(prefix, namespace));
        self
    }

    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }
}

/// A library attached to a [`Model`](super::Model).
#[derive(Clone, Debug, PartialEq)]
pub struct Library {
    id: LibraryId,
    pub name: SmolStr,
    namespace: Option<Arc<str>>,
    pub prefix: SmolStr,
    pub version: Option<Version>,
    pub kind: LibraryKind,
    pub imports: Vec<NamespaceImport>,
    pub includes: Vec<String>,
    pub location: Option<PathBuf>,
    pub dialect: Option<Dialect>,
    read_only: bool,
    pub comments: Option<String>,
    pub(crate) members: Vec<EntityId>,
}

impl Library {
    pub(crate) fn attach(id: LibraryId, def: &LibraryDef) -> Self {
        Self {
            id,
            name: def.name.clone(),
            namespace: def.namespace.as_deref().map(Arc::from),
            prefix: def.prefix.clone(),
            version: def.version,
            kind: def.kind.clone(),
            imports: def.imports.clone(),
            includes: def.includes.clone(),
            location: def.location.clone(),
            dialect: def.dialect,
            read_only: def.read_only,
            comments: def.comments.clone(),
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> LibraryId {
        self.id
    }

    /// The library namespace; `None` for chameleon libraries.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub(crate) fn namespace_arc(&self) -> Option<&Arc<str>> {
        self.namespace.as_ref()
    }

    /// Chameleon libraries adopt the namespace of whichever library
    /// resolves against them.
    pub fn is_chameleon(&self) -> bool {
        self.namespace.is_none()
    }

    /// Member entities in insertion order.
    pub fn members(&self) -> &[EntityId] {
        &self.members
    }

    /// Built-in and legacy libraries are always read-only.
    pub fn is_read_only(&self) -> bool {
        self.read_only || !matches!(self.kind, LibraryKind::User { .. })
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn status(&self) -> Option<LibraryStatus> {
        match &self.kind {
            LibraryKind::User { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn checksum(&self) -> Option<&str> {
        match &self.kind {
            LibraryKind::User { checksum, .. } => checksum.as_deref(),
            _ => None,
        }
    }

    pub fn set_checksum(&mut self, value: Option<String>) {
        if let LibraryKind::User { checksum, .. } = &mut self.kind {
            *checksum = value;
        }
    }

    /// Lock identity of this library.
    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(self.namespace().unwrap_or_default(), self.name.clone())
    }

    /// Expand a prefix: the library's own prefix maps to its own namespace,
    /// everything else goes through the namespace imports.
    pub fn namespace_for_prefix(&self, prefix: &str) -> Option<&str> {
        if prefix == self.prefix.as_str() {
            if let Some(ns) = self.namespace() {
                return Some(ns);
            }
        }
        self.imports
            .iter()
            .find(|i| i.prefix == prefix)
            .map(|i| i.namespace.as_str())
    }

    /// The first prefix bound to `namespace`, own prefix first.
    pub fn prefix_for_namespace(&self, namespace: &str) -> Option<&str> {
        if self.namespace() == Some(namespace) && !self.prefix.is_empty() {
            return Some(self.prefix.as_str());
        }
        self.imports
            .iter()
            .find(|i| i.namespace == namespace)
            .map(|i| i.prefix.as_str())
    }

    /// The namespace a reference string targets, seen from this library.
    ///
    /// Unprefixed names target the library's own namespace. Returns `None`
    /// for an unbound prefix, or for an unprefixed name in a chameleon
    /// library.
    pub fn target_namespace<'a>(&'a self, reference: &str) -> Option<&'a str> {
        match split_prefixed(reference).0 {
            Some(prefix) => self.namespace_for_prefix(prefix),
            None => self.namespace(),
        }
    }
}
