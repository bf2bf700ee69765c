//! The [`Model`]: arena owner of every loaded library and entity.
//!
//! ## Design
//!
//! Libraries and entities live in two arenas addressed by [`LibraryId`] and
//! [`EntityId`]. References between entities are handles, never borrows, so
//! cyclic reference graphs need no shared ownership.
//!
//! ```text
//! Model
//! ├── libraries: Vec<Option<Library>>          (tombstoned on removal)
//! ├── entities:  Vec<Option<Entity>>
//! ├── by_namespace: IndexMap<canonical ns, Vec<LibraryId>>
//! ├── dirty: bool                              (structural change since last resolve)
//! └── changes: Vec<ModelChange>                (drained by consumers)
//! ```
//!
//! Structural mutations set `dirty`. Resolved handles are only trustworthy
//! after a fresh resolution pass (see [`crate::resolve`]), which clears it.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::builtin;
use super::entity::{Entity, EntityDef};
use super::error::ModelError;
use super::ids::{EntityId, LibraryId};
use super::library::{Library, LibraryDef};
use crate::base::{DefaultVersionScheme, VersionScheme};

/// A structural change recorded by the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelChange {
    LibraryAdded(LibraryId),
    LibraryRemoved(LibraryId),
    MemberAdded { library: LibraryId, entity: EntityId },
    MemberRemoved { library: LibraryId, entity: EntityId },
    MemberRenamed { entity: EntityId, old_name: SmolStr },
    MemberReparented { entity: EntityId, from: LibraryId, to: LibraryId },
}

/// The full in-memory collection of libraries for one session.
#[derive(Clone)]
pub struct Model {
    libraries: Vec<Option<Library>>,
    entities: Vec<Option<Entity>>,
    by_namespace: IndexMap<String, Vec<LibraryId>>,
    scheme: Arc<dyn VersionScheme>,
    dirty: bool,
    changes: Vec<ModelChange>,
}

impl Default for Model {
    fn default() -> Self {
        Self::with_scheme(Arc::new(DefaultVersionScheme))
    }
}

impl Model {
    /// Create an empty model using the default version scheme.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scheme(scheme: Arc<dyn VersionScheme>) -> Self {
        Self {
            libraries: Vec::new(),
            entities: Vec::new(),
            by_namespace: IndexMap::new(),
            scheme,
            dirty: false,
            changes: Vec::new(),
        }
    }

    /// Create a model pre-loaded with the built-in schema library.
    pub fn with_builtins() -> Self {
        let mut model = Self::new();
        // The built-in library is the first library of a fresh model and
        // cannot collide with anything.
        let _ = model.add_library(builtin::builtin_library());
        model
    }

    pub fn scheme(&self) -> &dyn VersionScheme {
        self.scheme.as_ref()
    }

    // ── Structural mutation ─────────────────────────────────────────

    /// Attach a library and all its entities.
    pub fn add_library(&mut self, def: LibraryDef) -> Result<LibraryId, ModelError> {
        if let Some(existing) = self.find_library(def.namespace.as_deref(), &def.name) {
            return Err(ModelError::DuplicateLibrary {
                namespace: existing.namespace().unwrap_or_default().to_string(),
                name: def.name.to_string(),
            });
        }

        let id = LibraryId::new(self.libraries.len());
        let mut library = Library::attach(id, &def);
        if library.version.is_none() {
            library.version = def
                .namespace
                .as_deref()
                .and_then(|ns| self.scheme.version_of(ns).ok());
        }
        let key = self.canonical_key(library.namespace());
        self.libraries.push(Some(library));
        self.by_namespace.entry(key).or_default().push(id);

        for entity in def.entities {
            self.attach_entity(id, entity);
        }

        self.dirty = true;
        self.changes.push(ModelChange::LibraryAdded(id));
        Ok(id)
    }

    /// Detach a library together with its entities.
    pub fn remove_library(&mut self, id: LibraryId) -> Result<Library, ModelError> {
        let library = self
            .libraries
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(ModelError::UnknownLibrary(id))?;
        for member in &library.members {
            if let Some(slot) = self.entities.get_mut(member.index()) {
                *slot = None;
            }
        }
        let key = self.canonical_key(library.namespace());
        if let Some(ids) = self.by_namespace.get_mut(&key) {
            ids.retain(|l| *l != id);
            if ids.is_empty() {
                self.by_namespace.shift_remove(&key);
            }
        }
        self.dirty = true;
        self.changes.push(ModelChange::LibraryRemoved(id));
        Ok(library)
    }

    /// Append an entity to a mutable library.
    pub fn add_entity(&mut self, library: LibraryId, def: EntityDef) -> Result<EntityId, ModelError> {
        self.writable_library(library)?;
        let id = self.attach_entity(library, def);
        self.dirty = true;
        self.changes.push(ModelChange::MemberAdded { library, entity: id });
        Ok(id)
    }

    /// Remove an entity from its (mutable) library.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<Entity, ModelError> {
        let library = self.entity(id).ok_or(ModelError::UnknownEntity(id))?.library();
        self.writable_library(library)?;
        let entity = self
            .entities
            .get_mut(id.index())
            .and_then(Option::take)
            .ok_or(ModelError::UnknownEntity(id))?;
        if let Some(Some(lib)) = self.libraries.get_mut(library.index()) {
            lib.members.retain(|m| *m != id);
        }
        self.dirty = true;
        self.changes.push(ModelChange::MemberRemoved { library, entity: id });
        Ok(entity)
    }

    /// Rename an entity, changing its symbol identity.
    pub fn rename_entity(&mut self, id: EntityId, name: impl Into<SmolStr>) -> Result<(), ModelError> {
        let library = self.entity(id).ok_or(ModelError::UnknownEntity(id))?.library();
        self.writable_library(library)?;
        let entity = self
            .entities
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(ModelError::UnknownEntity(id))?;
        let old_name = std::mem::replace(&mut entity.name, name.into());
        self.dirty = true;
        self.changes.push(ModelChange::MemberRenamed { entity: id, old_name });
        Ok(())
    }

    /// Copy an entity into another library. The copy's references keep
    /// their names and lose their handles until the next resolution pass.
    pub fn clone_entity_into(&mut self, id: EntityId, target: LibraryId) -> Result<EntityId, ModelError> {
        let mut def = self.entity(id).ok_or(ModelError::UnknownEntity(id))?.to_def();
        for (_, slot) in def.body.slots_mut() {
            slot.clear_resolved();
        }
        self.add_entity(target, def)
    }

    /// Move an entity to another library (the explicit re-parent operation).
    pub fn reparent_entity(&mut self, id: EntityId, target: LibraryId) -> Result<(), ModelError> {
        let from = self.entity(id).ok_or(ModelError::UnknownEntity(id))?.library();
        self.writable_library(from)?;
        self.writable_library(target)?;
        if from == target {
            return Ok(());
        }
        if let Some(Some(lib)) = self.libraries.get_mut(from.index()) {
            lib.members.retain(|m| *m != id);
        }
        if let Some(Some(lib)) = self.libraries.get_mut(target.index()) {
            lib.members.push(id);
        }
        if let Some(Some(entity)) = self.entities.get_mut(id.index()) {
            let def = entity.to_def();
            *entity = Entity::attach(id, target, def);
        }
        self.dirty = true;
        self.changes.push(ModelChange::MemberReparented { entity: id, from, to: target });
        Ok(())
    }

    fn attach_entity(&mut self, library: LibraryId, def: EntityDef) -> EntityId {
        let id = EntityId::new(self.entities.len());
        self.entities.push(Some(Entity::attach(id, library, def)));
        if let Some(Some(lib)) = self.libraries.get_mut(library.index()) {
            lib.members.push(id);
        }
        id
    }

    fn writable_library(&self, id: LibraryId) -> Result<&Library, ModelError> {
        let library = self.library(id).ok_or(ModelError::UnknownLibrary(id))?;
        if library.is_read_only() {
            return Err(ModelError::ReadOnly(library.name.to_string()));
        }
        Ok(library)
    }

    fn canonical_key(&self, namespace: Option<&str>) -> String {
        namespace
            .map(|ns| self.scheme.canonical_namespace(ns))
            .unwrap_or_default()
    }

    // ── Access ──────────────────────────────────────────────────────

    pub fn library(&self, id: LibraryId) -> Option<&Library> {
        self.libraries.get(id.index()).and_then(Option::as_ref)
    }

    /// Mutable library access. Marks the model dirty: imports and prefixes
    /// change how names resolve.
    pub fn library_mut(&mut self, id: LibraryId) -> Option<&mut Library> {
        let library = self.libraries.get_mut(id.index()).and_then(Option::as_mut)?;
        self.dirty = true;
        Some(library)
    }

    /// Library access for the save pipeline: a checksum does not affect
    /// resolution.
    pub(crate) fn library_mut_untracked(&mut self, id: LibraryId) -> Option<&mut Library> {
        self.libraries.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.index()).and_then(Option::as_ref)
    }

    /// Mutable entity access. Marks the model dirty.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let entity = self.entities.get_mut(id.index()).and_then(Option::as_mut)?;
        self.dirty = true;
        Some(entity)
    }

    /// Entity access for the resolver: writing handles is not a structural change.
    pub(crate) fn entity_mut_untracked(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// All live libraries in load order.
    pub fn libraries(&self) -> impl Iterator<Item = &Library> {
        self.libraries.iter().filter_map(Option::as_ref)
    }

    pub fn library_ids(&self) -> Vec<LibraryId> {
        self.libraries().map(Library::id).collect()
    }

    /// All live entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter_map(Option::as_ref)
    }

    /// Members of a library in insertion order.
    pub fn members(&self, library: LibraryId) -> impl Iterator<Item = &Entity> {
        self.library(library)
            .map(|l| l.members.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.entity(*id))
    }

    pub fn library_count(&self) -> usize {
        self.libraries().count()
    }

    pub fn entity_count(&self) -> usize {
        self.entities().count()
    }

    /// Namespace of the library owning `entity`.
    pub fn entity_namespace(&self, entity: EntityId) -> Option<&str> {
        self.entity(entity)
            .and_then(|e| self.library(e.library()))
            .and_then(Library::namespace)
    }

    /// Every version of the libraries sharing `namespace`'s canonical form.
    pub fn libraries_in(&self, namespace: &str) -> Vec<&Library> {
        let key = self.scheme.canonical_namespace(namespace);
        self.by_namespace
            .get(&key)
            .into_iter()
            .flatten()
            .filter_map(|id| self.library(*id))
            .collect()
    }

    /// Canonical namespaces in first-load order.
    pub fn canonical_namespaces(&self) -> impl Iterator<Item = &str> {
        self.by_namespace.keys().map(String::as_str)
    }

    /// Exact lookup by namespace and library name.
    pub fn find_library(&self, namespace: Option<&str>, name: &str) -> Option<&Library> {
        self.libraries()
            .find(|l| l.namespace() == namespace && l.name == name)
    }

    /// The latest loaded version of the library `name` in `namespace`'s
    /// version chain.
    pub fn latest_version(&self, namespace: &str, name: &str) -> Option<&Library> {
        self.libraries_in(namespace)
            .into_iter()
            .filter(|l| l.name == name)
            .max_by_key(|l| l.version)
    }

    /// Linear lookup of an entity by namespace and local name.
    pub fn find_entity(&self, namespace: &str, local: &str) -> Option<&Entity> {
        self.libraries()
            .filter(|l| l.namespace() == Some(namespace))
            .flat_map(|l| l.members.iter())
            .filter_map(|id| self.entity(*id))
            .find(|e| e.name == local)
    }

    // ── Dirty tracking ──────────────────────────────────────────────

    /// True when handles may be stale.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Structural changes recorded since the last drain.
    pub fn changes(&self) -> &[ModelChange] {
        &self.changes
    }

    pub fn take_changes(&mut self) -> Vec<ModelChange> {
        std::mem::take(&mut self.changes)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("libraries", &self.library_count())
            .field("entities", &self.entity_count())
            .field("namespaces", &self.by_namespace.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}
