//! Derived entity factory: secondary symbol entries tied to an entity.
//!
//! Complex objects are addressable through their facets as well as their
//! own name:
//!
//! ```text
//! Hotel (core object)  ->  Hotel, Hotel_Summary, Hotel_Detail, Hotel_Simple
//! Room  (business)     ->  Room, Room_ID, Room_Summary, Room_Detail
//! Pay   (choice)       ->  Pay, Pay_Shared
//! ```
//!
//! Derived entries resolve to the originating entity narrowed to a facet,
//! so they can never outlive it.

use smol_str::SmolStr;

use crate::model::{Entity, EntityBody, EntityRef, FacetKind};

/// A secondary symbol entry produced for an originating entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedEntry {
    pub local_name: SmolStr,
    pub target: EntityRef,
}

/// Hook invoked by the symbol table for every registered entity.
pub trait DerivedEntityFactory: Send + Sync {
    /// Whether `entity` produces derived entries.
    fn is_originating(&self, entity: &Entity) -> bool;

    /// The entries to register alongside `entity`, in registration order.
    fn derive(&self, entity: &Entity) -> Vec<DerivedEntry>;
}

/// Registers nothing beyond the entities themselves.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDerivation;

impl DerivedEntityFactory for NoDerivation {
    fn is_originating(&self, _entity: &Entity) -> bool {
        false
    }

    fn derive(&self, _entity: &Entity) -> Vec<DerivedEntry> {
        Vec::new()
    }
}

/// Facet names and aliases of core, business and choice objects.
#[derive(Clone, Copy, Debug, Default)]
pub struct FacetDerivationFactory;

impl FacetDerivationFactory {
    /// Facets addressable by name for each complex kind.
    pub fn facets_of(body: &EntityBody) -> &'static [FacetKind] {
        match body {
            EntityBody::Core(_) => &[FacetKind::Summary, FacetKind::Detail, FacetKind::Simple],
            EntityBody::Business(_) => &[FacetKind::Id, FacetKind::Summary, FacetKind::Detail],
            EntityBody::Choice(_) => &[FacetKind::Shared],
            _ => &[],
        }
    }
}

impl DerivedEntityFactory for FacetDerivationFactory {
    fn is_originating(&self, entity: &Entity) -> bool {
        entity.body.as_complex().is_some()
    }

    fn derive(&self, entity: &Entity) -> Vec<DerivedEntry> {
        let Some(complex) = entity.body.as_complex() else {
            return Vec::new();
        };
        let facets = Self::facets_of(&entity.body);
        let id = entity.id();

        let mut out = Vec::with_capacity(facets.len() * (1 + complex.aliases.len()));
        for facet in facets {
            out.push(DerivedEntry {
                local_name: facet.derived_name(&entity.name),
                target: EntityRef::facet(id, *facet),
            });
        }
        for alias in &complex.aliases {
            out.push(DerivedEntry {
                local_name: alias.clone(),
                target: EntityRef::entity(id),
            });
            for facet in facets {
                out.push(DerivedEntry {
                    local_name: facet.derived_name(alias),
                    target: EntityRef::facet(id, *facet),
                });
            }
        }
        out
    }
}
