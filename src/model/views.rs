//! Borrowed read views over [`Model`].
//!
//! Zero-copy navigation for consumers of the resolved graph: follow
//! resolved references, list members, find referrers.
//!
//! ## Usage
//!
//! ```ignore
//! use modelweave::model::views::LibraryView;
//!
//! for lib in LibraryView::all(&model) {
//!     for member in lib.members() {
//!         for (path, target) in member.references() {
//!             println!("{} {path} -> {:?}", member.name(), target.map(|t| t.name()));
//!         }
//!     }
//! }
//! ```

use super::entity::{Entity, EntityKind, EntityRef, FacetKind, RefSlot};
use super::graph::Model;
use super::ids::{EntityId, LibraryId};
use super::library::Library;

// ============================================================================
// LIBRARY VIEW
// ============================================================================

#[derive(Clone, Copy)]
pub struct LibraryView<'m> {
    pub library: &'m Library,
    pub model: &'m Model,
}

impl<'m> LibraryView<'m> {
    pub fn new(library: &'m Library, model: &'m Model) -> Self {
        Self { library, model }
    }

    pub fn from_id(id: LibraryId, model: &'m Model) -> Option<Self> {
        model.library(id).map(|library| Self { library, model })
    }

    /// Every live library in load order.
    pub fn all(model: &'m Model) -> impl Iterator<Item = LibraryView<'m>> {
        model.libraries().map(move |library| Self { library, model })
    }

    /// Every version of the libraries in `namespace`'s version chain.
    pub fn in_namespace(model: &'m Model, namespace: &str) -> Vec<LibraryView<'m>> {
        model
            .libraries_in(namespace)
            .into_iter()
            .map(|library| Self { library, model })
            .collect()
    }

    pub fn id(&self) -> LibraryId {
        self.library.id()
    }

    pub fn name(&self) -> &'m str {
        self.library.name.as_str()
    }

    pub fn namespace(&self) -> Option<&'m str> {
        self.library.namespace()
    }

    /// Members in insertion order.
    pub fn members(&self) -> impl Iterator<Item = EntityView<'m>> {
        let model = self.model;
        self.library
            .members()
            .iter()
            .filter_map(move |id| EntityView::from_id(*id, model))
    }

    pub fn member(&self, name: &str) -> Option<EntityView<'m>> {
        self.members().find(|m| m.name() == name)
    }

    /// True when a later version of this library is loaded.
    pub fn has_later_version(&self) -> bool {
        let Some(ns) = self.namespace() else {
            return false;
        };
        self.model
            .libraries_in(ns)
            .iter()
            .filter(|l| l.name == self.library.name)
            .any(|l| l.version > self.library.version)
    }
}

// ============================================================================
// ENTITY VIEW
// ============================================================================

#[derive(Clone, Copy)]
pub struct EntityView<'m> {
    pub entity: &'m Entity,
    pub model: &'m Model,
}

impl<'m> EntityView<'m> {
    pub fn new(entity: &'m Entity, model: &'m Model) -> Self {
        Self { entity, model }
    }

    pub fn from_id(id: EntityId, model: &'m Model) -> Option<Self> {
        model.entity(id).map(|entity| Self { entity, model })
    }

    pub fn id(&self) -> EntityId {
        self.entity.id()
    }

    pub fn name(&self) -> &'m str {
        self.entity.name.as_str()
    }

    pub fn kind(&self) -> EntityKind {
        self.entity.kind()
    }

    pub fn namespace(&self) -> Option<&'m str> {
        self.model.entity_namespace(self.entity.id())
    }

    pub fn library(&self) -> Option<LibraryView<'m>> {
        LibraryView::from_id(self.entity.library(), self.model)
    }

    // ── Reference navigation ────────────────────────────────────────

    /// Every reference slot with its resolved target, in declaration order.
    pub fn references(&self) -> Vec<(String, Option<RefTarget<'m>>)> {
        self.entity
            .body
            .slots()
            .into_iter()
            .map(|(path, slot)| (path, RefTarget::of(slot, self.model)))
            .collect()
    }

    /// The resolved target of the slot at `path`.
    pub fn follow(&self, path: &str) -> Option<RefTarget<'m>> {
        self.entity
            .body
            .slots()
            .into_iter()
            .find(|(p, _)| p == path)
            .and_then(|(_, slot)| RefTarget::of(slot, self.model))
    }

    /// The resolved `extends` target, if any.
    pub fn base(&self) -> Option<RefTarget<'m>> {
        self.follow("extends")
    }

    /// Entities with at least one slot resolved to this entity (any facet).
    pub fn referrers(&self) -> Vec<EntityView<'m>> {
        referrers(self.model, self.entity.id())
            .into_iter()
            .filter_map(|id| EntityView::from_id(id, self.model))
            .collect()
    }
}

/// A resolved reference target: an entity, optionally narrowed to a facet.
#[derive(Clone, Copy)]
pub struct RefTarget<'m> {
    pub entity: EntityView<'m>,
    pub facet: Option<FacetKind>,
}

impl<'m> RefTarget<'m> {
    fn of(slot: &RefSlot, model: &'m Model) -> Option<Self> {
        let EntityRef { entity, facet } = slot.resolved()?;
        EntityView::from_id(entity, model).map(|entity| Self { entity, facet })
    }

    /// The local name this target is addressed by (`Hotel_Summary` for a facet).
    pub fn name(&self) -> String {
        match self.facet {
            Some(facet) => facet.derived_name(self.entity.name()).to_string(),
            None => self.entity.name().to_string(),
        }
    }
}

/// Ids of the entities holding a slot resolved to `target`, in creation order.
pub fn referrers(model: &Model, target: EntityId) -> Vec<EntityId> {
    model
        .entities()
        .filter(|e| {
            e.body
                .slots()
                .iter()
                .any(|(_, slot)| slot.resolved().is_some_and(|r| r.entity == target))
        })
        .map(Entity::id)
        .collect()
}
