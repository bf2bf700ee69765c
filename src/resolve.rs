//! Reference resolution: turning slot names into live handles.
//!
//! # Pass structure
//!
//! One traversal over every entity of the requested libraries:
//!
//! 1. **Discard** stale handles: all of them when the model is dirty,
//!    otherwise only those whose target entity is gone.
//! 2. **Look up** each named slot without a handle in the owning library's
//!    context ([`SymbolTable::resolve`]).
//! 3. **Check** the target kind against the slot category and write the
//!    handle. The slot name is never touched.
//!
//! Lookups go against the complete table, so declaration order and cycles
//! between entities do not matter. Everything that could not be linked is
//! reported as a [`Finding`]; only unknown library ids are fatal.

use crate::diagnostics::{Finding, Findings, codes};
use crate::model::{EntityId, EntityRef, LibraryId, Model, ModelError};
use crate::symbols::{DerivedEntityFactory, SymbolTable};

/// What happens to one slot.
#[derive(Clone, Copy, Debug)]
enum SlotOutcome {
    Keep,
    Set(EntityRef),
    Clear,
}

#[derive(Debug, Default)]
struct PassStats {
    kept: usize,
    resolved: usize,
    failed: usize,
}

/// Walks the graph and fills reference slots from a [`SymbolTable`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceResolver;

impl ReferenceResolver {
    /// Resolve every slot in `libraries` against `table`.
    pub fn resolve(
        model: &mut Model,
        libraries: &[LibraryId],
        table: &SymbolTable,
    ) -> Result<Findings, ModelError> {
        if let Some(unknown) = libraries.iter().find(|id| model.library(**id).is_none()) {
            return Err(ModelError::UnknownLibrary(*unknown));
        }
        let mut ids = libraries.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let discard_all = model.is_dirty();
        let mut findings = Findings::new();
        let mut stats = PassStats::default();

        for library in &ids {
            let members = model
                .library(*library)
                .map(|l| l.members().to_vec())
                .unwrap_or_default();
            for entity in members {
                let plan = Self::plan_entity(model, *library, entity, table, discard_all, &mut findings, &mut stats);
                if let Some(target) = model.entity_mut_untracked(entity) {
                    for ((_, slot), outcome) in target.body.slots_mut().into_iter().zip(plan) {
                        match outcome {
                            SlotOutcome::Keep => {}
                            SlotOutcome::Set(to) => slot.set_resolved(to),
                            SlotOutcome::Clear => slot.clear_resolved(),
                        }
                    }
                }
            }
        }

        Self::report_collisions(model, &ids, table, &mut findings);

        let covers_model = model
            .library_ids()
            .iter()
            .all(|id| ids.binary_search(id).is_ok());
        if covers_model {
            model.mark_clean();
        }

        tracing::debug!(
            "[RESOLVE] pass over {} libraries: {} resolved, {} kept, {} failed, {} findings",
            ids.len(),
            stats.resolved,
            stats.kept,
            stats.failed,
            findings.len()
        );
        Ok(findings)
    }

    /// Build a fresh table over the whole model and resolve everything.
    pub fn resolve_all(model: &mut Model, factory: &dyn DerivedEntityFactory) -> Findings {
        let table = SymbolTable::build_all(model, factory);
        let ids = model.library_ids();
        // Every id comes from the model itself.
        Self::resolve(model, &ids, &table).unwrap_or_default()
    }

    fn plan_entity(
        model: &Model,
        library: LibraryId,
        entity: EntityId,
        table: &SymbolTable,
        discard_all: bool,
        findings: &mut Findings,
        stats: &mut PassStats,
    ) -> Vec<SlotOutcome> {
        let Some(owner) = model.entity(entity) else {
            return Vec::new();
        };
        let library_name = model
            .library(library)
            .map(|l| l.name.clone())
            .unwrap_or_default();
        let owner_kind = owner.kind();

        let mut plan = Vec::new();
        for (path, slot) in owner.body.slots() {
            let stale = slot
                .resolved()
                .is_some_and(|r| discard_all || model.entity(r.entity).is_none());
            if slot.is_resolved() && !stale {
                stats.kept += 1;
                plan.push(SlotOutcome::Keep);
                continue;
            }
            if slot.is_empty() {
                plan.push(SlotOutcome::Clear);
                continue;
            }

            let found = table.resolve(slot.name(), library);
            tracing::trace!(
                "[RESOLVE] {}::{} {} '{}' -> {:?}",
                library_name,
                owner.name,
                path,
                slot.name(),
                found
            );

            let outcome = match found {
                None => {
                    findings.add(
                        Finding::error(
                            codes::UNRESOLVED_REFERENCE,
                            format!("unresolved reference '{}'", slot.name()),
                        )
                        .in_library(library_name.clone())
                        .on_entity(owner.name.clone())
                        .at_path(path),
                    );
                    SlotOutcome::Clear
                }
                Some(target) => {
                    let target_kind = model.entity(target.entity).map(|e| e.kind());
                    match target_kind {
                        Some(kind) if slot.category().accepts(owner_kind, kind, target.facet) => {
                            SlotOutcome::Set(target)
                        }
                        Some(kind) => {
                            findings.add(
                                Finding::error(
                                    codes::KIND_MISMATCH,
                                    format!(
                                        "'{}' is a {}, not a valid {} for a {}",
                                        slot.name(),
                                        kind.display(),
                                        slot.category().display(),
                                        owner_kind.display()
                                    ),
                                )
                                .in_library(library_name.clone())
                                .on_entity(owner.name.clone())
                                .at_path(path),
                            );
                            SlotOutcome::Clear
                        }
                        // The table was built from another snapshot.
                        None => {
                            findings.add(
                                Finding::error(
                                    codes::UNRESOLVED_REFERENCE,
                                    format!("reference '{}' points at a removed entity", slot.name()),
                                )
                                .in_library(library_name.clone())
                                .on_entity(owner.name.clone())
                                .at_path(path),
                            );
                            SlotOutcome::Clear
                        }
                    }
                }
            };
            match outcome {
                SlotOutcome::Set(_) => stats.resolved += 1,
                _ => stats.failed += 1,
            }
            plan.push(outcome);
        }
        plan
    }

    /// One finding per duplicated name. Clashes between two derived entries
    /// follow from a clash of their owners and are not repeated.
    fn report_collisions(model: &Model, ids: &[LibraryId], table: &SymbolTable, findings: &mut Findings) {
        for collision in table.collisions() {
            if collision.kept.derived && collision.rejected.derived {
                continue;
            }
            if ids.binary_search(&collision.rejected.library).is_err() {
                continue;
            }
            let library = model
                .library(collision.rejected.library)
                .map(|l| l.name.clone())
                .unwrap_or_default();
            let entity = model
                .entity(collision.rejected.target.entity)
                .map(|e| e.name.clone())
                .unwrap_or_default();
            findings.add(
                Finding::error(
                    codes::DUPLICATE_SYMBOL,
                    format!(
                        "duplicate symbol '{}' in namespace '{}'; the first definition is kept",
                        collision.local,
                        collision.namespace.as_deref().unwrap_or("<none>")
                    ),
                )
                .in_library(library)
                .on_entity(entity),
            );
        }
    }
}
