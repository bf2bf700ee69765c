//! Reference names as written on the wire.
//!
//! Saving renders each reference slot back to a string:
//!
//! 1. an unresolved slot keeps its name verbatim;
//! 2. a name that still resolves to the slot's handle in the emitting
//!    library's context is kept as written;
//! 3. otherwise the name is rebuilt from the target: local name (with a
//!    facet suffix for facet references), prefixed with the binding the
//!    emitting library has for the target's namespace.

use crate::model::{EntityRef, Model, RefSlot};
use crate::symbols::{NameContext, SymbolTable};

/// Render `slot` for emission from the library described by `names`.
pub fn render_reference(
    slot: &RefSlot,
    model: &Model,
    names: &NameContext,
    symbols: Option<&SymbolTable>,
) -> String {
    let Some(target) = slot.resolved() else {
        return slot.name().to_string();
    };
    if let Some(table) = symbols {
        if table.resolve_in(slot.name(), names) == Some(target) {
            return slot.name().to_string();
        }
    }
    qualified_name(target, model, names).unwrap_or_else(|| slot.name().to_string())
}

/// `prefix:Local` for `target` as seen from `names`; unprefixed inside the
/// context's own namespace and for chameleon targets. `None` when the
/// target is gone or its namespace has no binding.
pub fn qualified_name(target: EntityRef, model: &Model, names: &NameContext) -> Option<String> {
    let entity = model.entity(target.entity)?;
    let local = match target.facet {
        Some(facet) => facet.derived_name(&entity.name).to_string(),
        None => entity.name.to_string(),
    };
    let Some(namespace) = model.entity_namespace(target.entity) else {
        return Some(local);
    };
    match names.prefix_for_namespace(namespace)? {
        "" => Some(local),
        prefix => Some(format!("{prefix}:{local}")),
    }
}
