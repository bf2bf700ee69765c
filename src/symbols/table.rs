//! The symbol table: (namespace, local name) → [`EntityRef`].
//!
//! ## Build
//!
//! ```text
//! for library in load order (ascending LibraryId):
//!     for entity in insertion order:
//!         register (namespace, entity.name)
//!         register factory.derive(entity)     (same namespace)
//! ```
//!
//! The first registrant of a key wins; later registrants are recorded as
//! [`Collision`]s. Libraries without a namespace (chameleons) are kept in a
//! separate index and become visible under the namespace of whichever
//! library looks them up. The reverse does not hold: a chameleon's own
//! unprefixed references see only other chameleon entries, never the
//! namespace of a library that includes it.
//!
//! The table is a snapshot: it is rebuilt whenever a resolution pass
//! begins and never observes later model changes.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::derived::DerivedEntityFactory;
use crate::base::split_prefixed;
use crate::model::{EntityRef, Library, LibraryId, Model};

// ============================================================================
// NAME CONTEXT
// ============================================================================

/// Prefix bindings and namespace a reference is interpreted in.
///
/// Built from an attached [`Library`], or by a transformer from a wire
/// tree that has no library yet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameContext {
    namespace: Option<Arc<str>>,
    prefix: SmolStr,
    imports: Vec<(SmolStr, Arc<str>)>,
}

impl NameContext {
    pub fn new(namespace: Option<&str>, prefix: impl Into<SmolStr>) -> Self {
        Self {
            namespace: namespace.map(Arc::from),
            prefix: prefix.into(),
            imports: Vec::new(),
        }
    }

    pub fn from_library(library: &Library) -> Self {
        Self {
            namespace: library.namespace_arc().cloned(),
            prefix: library.prefix.clone(),
            imports: library
                .imports
                .iter()
                .map(|i| (i.prefix.clone(), Arc::from(i.namespace.as_str())))
                .collect(),
        }
    }

    pub fn with_import(mut self, prefix: impl Into<SmolStr>, namespace: &str) -> Self {
        self.imports.push((prefix.into(), Arc::from(namespace)));
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Own prefix first, then the import bindings.
    pub fn namespace_for_prefix(&self, prefix: &str) -> Option<&str> {
        if prefix == self.prefix.as_str() && self.namespace.is_some() {
            return self.namespace();
        }
        self.imports
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, ns)| ns.as_ref())
    }

    /// The prefix a reference into `namespace` is written with.
    ///
    /// `Some("")` for the context's own namespace (references stay
    /// unprefixed), `None` when no binding exists.
    pub fn prefix_for_namespace(&self, namespace: &str) -> Option<&str> {
        if self.namespace() == Some(namespace) {
            return Some("");
        }
        self.imports
            .iter()
            .find(|(_, ns)| ns.as_ref() == namespace)
            .map(|(p, _)| p.as_str())
    }
}

// ============================================================================
// SYMBOL TABLE
// ============================================================================

/// A registered symbol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Symbol {
    pub target: EntityRef,
    /// Library that registered the symbol.
    pub library: LibraryId,
    /// True for entries produced by the derived entity factory.
    pub derived: bool,
}

/// A rejected registration: the key was already taken.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collision {
    /// `None` for collisions between chameleon libraries.
    pub namespace: Option<Arc<str>>,
    pub local: SmolStr,
    pub kept: Symbol,
    pub rejected: Symbol,
}

#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    by_namespace: IndexMap<Arc<str>, IndexMap<SmolStr, Symbol>>,
    chameleon: IndexMap<SmolStr, Symbol>,
    contexts: FxHashMap<LibraryId, NameContext>,
    collisions: Vec<Collision>,
}

impl SymbolTable {
    /// Build a table over `libraries` of `model`.
    ///
    /// Libraries are registered in ascending id order regardless of the
    /// order given. Unknown ids are skipped.
    pub fn build(model: &Model, libraries: &[LibraryId], factory: &dyn DerivedEntityFactory) -> Self {
        let mut ids = libraries.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut table = Self::default();
        for id in ids {
            let Some(library) = model.library(id) else {
                tracing::trace!("[SYMBOLS] skipping unknown library {}", id);
                continue;
            };
            table.register_library(model, library, factory);
        }

        tracing::debug!(
            "[SYMBOLS] built table: {} namespaces, {} symbols, {} collisions",
            table.by_namespace.len(),
            table.len(),
            table.collisions.len()
        );
        table
    }

    /// Build a table over every library of `model`.
    pub fn build_all(model: &Model, factory: &dyn DerivedEntityFactory) -> Self {
        Self::build(model, &model.library_ids(), factory)
    }

    fn register_library(&mut self, model: &Model, library: &Library, factory: &dyn DerivedEntityFactory) {
        self.contexts.insert(library.id(), NameContext::from_library(library));
        let namespace = library.namespace_arc().cloned();

        for entity in model.members(library.id()) {
            let primary = Symbol {
                target: EntityRef::entity(entity.id()),
                library: library.id(),
                derived: false,
            };
            self.register(namespace.as_ref(), entity.name.clone(), primary);

            if factory.is_originating(entity) {
                for entry in factory.derive(entity) {
                    let symbol = Symbol {
                        target: entry.target,
                        library: library.id(),
                        derived: true,
                    };
                    self.register(namespace.as_ref(), entry.local_name, symbol);
                }
            }
        }
    }

    fn register(&mut self, namespace: Option<&Arc<str>>, local: SmolStr, symbol: Symbol) {
        let bucket = match namespace {
            Some(ns) => self.by_namespace.entry(ns.clone()).or_default(),
            None => &mut self.chameleon,
        };
        match bucket.get(&local) {
            Some(kept) => {
                let collision = Collision {
                    namespace: namespace.cloned(),
                    local,
                    kept: *kept,
                    rejected: symbol,
                };
                tracing::trace!(
                    "[SYMBOLS] duplicate '{}' in {:?}: keeping {:?}",
                    collision.local,
                    collision.namespace,
                    collision.kept.target
                );
                self.collisions.push(collision);
            }
            None => {
                bucket.insert(local, symbol);
            }
        }
    }

    // ── Lookup ──────────────────────────────────────────────────────

    /// Resolve a reference string as seen from `context`.
    ///
    /// Returns `None` for unknown names, unbound prefixes and libraries
    /// that are not part of this table.
    pub fn resolve(&self, name: &str, context: LibraryId) -> Option<EntityRef> {
        let ctx = self.contexts.get(&context)?;
        self.resolve_in(name, ctx)
    }

    /// Resolve a reference string against an explicit name context.
    pub fn resolve_in(&self, name: &str, ctx: &NameContext) -> Option<EntityRef> {
        self.symbol_in(name, ctx).map(|s| s.target)
    }

    /// Like [`resolve_in`](Self::resolve_in), returning the full symbol.
    pub fn symbol_in(&self, name: &str, ctx: &NameContext) -> Option<&Symbol> {
        let (prefix, local) = split_prefixed(name.trim());
        if local.is_empty() {
            return None;
        }
        let namespace = match prefix {
            Some(p) => Some(ctx.namespace_for_prefix(p)?),
            None => ctx.namespace(),
        };

        let found = namespace.and_then(|ns| self.lookup(ns, local));
        if found.is_some() {
            return found;
        }
        // Chameleon entries are visible in the context's own namespace.
        if namespace == ctx.namespace() {
            return self.chameleon.get(local);
        }
        None
    }

    /// Exact lookup by namespace and local name, no chameleon fallback.
    pub fn lookup(&self, namespace: &str, local: &str) -> Option<&Symbol> {
        self.by_namespace.get(namespace)?.get(local)
    }

    pub fn contains(&self, namespace: &str, local: &str) -> bool {
        self.lookup(namespace, local).is_some()
    }

    /// The name context registered for `library`.
    pub fn context(&self, library: LibraryId) -> Option<&NameContext> {
        self.contexts.get(&library)
    }

    /// True when `library` took part in the build.
    pub fn covers(&self, library: LibraryId) -> bool {
        self.contexts.contains_key(&library)
    }

    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// All namespaced symbols in registration order.
    pub fn symbols(&self) -> impl Iterator<Item = (&str, &str, &Symbol)> {
        self.by_namespace.iter().flat_map(|(ns, bucket)| {
            bucket
                .iter()
                .map(move |(local, symbol)| (ns.as_ref(), local.as_str(), symbol))
        })
    }

    pub fn len(&self) -> usize {
        self.by_namespace.values().map(IndexMap::len).sum::<usize>() + self.chameleon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComplexType, EntityBody, EntityDef, FacetKind, LibraryDef, SimpleType};
    use crate::symbols::{FacetDerivationFactory, NoDerivation};

    const HOTEL_NS: &str = "http://example.org/ns/hotel/v1";
    const COMMON_NS: &str = "http://example.org/ns/common/v1";

    fn simple(name: &str) -> EntityDef {
        EntityDef::new(name, EntityBody::Simple(SimpleType::new("xsd:string")))
    }

    fn fixture() -> (Model, LibraryId, LibraryId) {
        let mut model = Model::new();
        let common = model
            .add_library(LibraryDef::user("Common", COMMON_NS, "com").with_entity(simple("Code")))
            .unwrap();
        let hotel = model
            .add_library(
                LibraryDef::user("Hotel", HOTEL_NS, "htl")
                    .with_import("com", COMMON_NS)
                    .with_entity(EntityDef::new("Hotel", EntityBody::Core(ComplexType::default()))),
            )
            .unwrap();
        (model, common, hotel)
    }

    #[test]
    fn test_prefix_expansion_and_unqualified_lookup() {
        let (model, common, hotel) = fixture();
        let table = SymbolTable::build_all(&model, &FacetDerivationFactory);
        let code = model.library(common).unwrap().members()[0];
        let hotel_entity = model.library(hotel).unwrap().members()[0];

        assert_eq!(table.resolve("com:Code", hotel), Some(EntityRef::entity(code)));
        assert_eq!(table.resolve("Hotel", hotel), Some(EntityRef::entity(hotel_entity)));
        assert_eq!(table.resolve("htl:Hotel", hotel), Some(EntityRef::entity(hotel_entity)));
        assert_eq!(table.resolve("Code", hotel), None);
        assert_eq!(table.resolve("zzz:Code", hotel), None);
    }

    #[test]
    fn test_derived_facet_entries() {
        let (model, _, hotel) = fixture();
        let hotel_entity = model.library(hotel).unwrap().members()[0];

        let table = SymbolTable::build_all(&model, &FacetDerivationFactory);
        assert_eq!(
            table.resolve("Hotel_Summary", hotel),
            Some(EntityRef::facet(hotel_entity, FacetKind::Summary))
        );

        let bare = SymbolTable::build_all(&model, &NoDerivation);
        assert_eq!(bare.resolve("Hotel_Summary", hotel), None);
    }

    #[test]
    fn test_duplicate_keeps_first_registrant() {
        let mut model = Model::new();
        let first = model
            .add_library(LibraryDef::user("A", HOTEL_NS, "htl").with_entity(simple("Dup")))
            .unwrap();
        let second = model
            .add_library(LibraryDef::user("B", HOTEL_NS, "htl").with_entity(simple("Dup")))
            .unwrap();
        let kept = model.library(first).unwrap().members()[0];

        // Registration order follows library ids, not argument order.
        let table = SymbolTable::build(&model, &[second, first], &NoDerivation);
        assert_eq!(table.resolve("Dup", second), Some(EntityRef::entity(kept)));
        assert_eq!(table.collisions().len(), 1);
        assert_eq!(table.collisions()[0].rejected.library, second);
    }

    #[test]
    fn test_chameleon_fallback_uses_context_namespace() {
        let mut model = Model::new();
        let legacy = model
            .add_library(LibraryDef::legacy("Shared", None).with_entity(simple("Amount")))
            .unwrap();
        let hotel = model
            .add_library(LibraryDef::user("Hotel", HOTEL_NS, "htl").with_import("com", COMMON_NS))
            .unwrap();
        let amount = model.library(legacy).unwrap().members()[0];

        let table = SymbolTable::build_all(&model, &NoDerivation);
        assert_eq!(table.resolve("Amount", hotel), Some(EntityRef::entity(amount)));
        assert_eq!(table.resolve("htl:Amount", hotel), Some(EntityRef::entity(amount)));
        assert_eq!(table.resolve("com:Amount", hotel), None);
        assert_eq!(table.resolve("Amount", legacy), Some(EntityRef::entity(amount)));
    }

    #[test]
    fn test_chameleon_does_not_see_including_namespace() {
        let mut model = Model::new();
        let legacy = model
            .add_library(LibraryDef::legacy("Shared", None).with_entity(simple("Amount")))
            .unwrap();
        let hotel = model
            .add_library(LibraryDef::user("Hotel", HOTEL_NS, "htl").with_entity(simple("Room")))
            .unwrap();
        let room = model.library(hotel).unwrap().members()[0];

        let table = SymbolTable::build_all(&model, &NoDerivation);
        assert_eq!(table.resolve("Room", hotel), Some(EntityRef::entity(room)));
        assert_eq!(table.resolve("Room", legacy), None);
        assert_eq!(table.resolve("htl:Room", legacy), None);
    }
}
