//! Per-run transformation state.

use smol_str::SmolStr;

use super::error::TransformError;
use super::names::render_reference;
use super::node::{FactorySetId, Node, NodeKind, NodeRef};
use super::registry::TransformerRegistry;
use crate::diagnostics::{Finding, Findings, codes};
use crate::model::{Model, RefSlot, SlotCategory};
use crate::symbols::{NameContext, SymbolTable};

/// A reference seen before its target was known.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardDeclaration {
    /// The reference exactly as written.
    pub name: String,
    /// Entity holding the reference.
    pub referenced_by: SmolStr,
}

/// Everything a transformer may consult.
///
/// Transformers read the model, never write it; recursive transforms go
/// through [`transform`](Self::transform) so that they use the same factory
/// set.
pub struct TransformContext<'a> {
    registry: &'a TransformerRegistry,
    factory_set: FactorySetId,
    model: Option<&'a Model>,
    symbols: Option<&'a SymbolTable>,
    names: NameContext,
    strict: bool,
    owner: SmolStr,
    forward_declarations: Vec<ForwardDeclaration>,
    findings: Findings,
}

impl<'a> TransformContext<'a> {
    pub fn new(registry: &'a TransformerRegistry, factory_set: FactorySetId) -> Self {
        Self {
            registry,
            factory_set,
            model: None,
            symbols: None,
            names: NameContext::default(),
            strict: false,
            owner: SmolStr::default(),
            forward_declarations: Vec::new(),
            findings: Findings::new(),
        }
    }

    pub fn with_model(mut self, model: &'a Model) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_symbols(mut self, symbols: &'a SymbolTable) -> Self {
        self.symbols = Some(symbols);
        self
    }

    pub fn with_optional_symbols(mut self, symbols: Option<&'a SymbolTable>) -> Self {
        self.symbols = symbols;
        self
    }

    /// In strict mode a member without a transformer fails the whole run;
    /// otherwise it is skipped with a finding.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn factory_set(&self) -> FactorySetId {
        self.factory_set
    }

    pub fn model(&self) -> Result<&'a Model, TransformError> {
        self.model.ok_or(TransformError::MissingModel)
    }

    pub fn symbols(&self) -> Option<&'a SymbolTable> {
        self.symbols
    }

    /// Prefix bindings of the library being transformed.
    pub fn names(&self) -> &NameContext {
        &self.names
    }

    pub fn set_names(&mut self, names: NameContext) {
        self.names = names;
    }

    /// Mark the start of an entity, for forward-declaration records.
    pub fn enter(&mut self, owner: &str) {
        self.owner = SmolStr::new(owner);
    }

    // ── Dispatch ────────────────────────────────────────────────────

    /// Transform `node` into `target` with the transformer registered for
    /// the pair in this context's factory set.
    pub fn transform(&mut self, node: NodeRef<'_>, target: NodeKind) -> Result<Node, TransformError> {
        let from = node.kind();
        let transformer = self
            .registry
            .get(from, target, self.factory_set)
            .ok_or_else(|| TransformError::Unavailable {
                from,
                to: target,
                factory_set: self.factory_set,
                node: node.name().to_string(),
            })?;
        transformer.transform(node, self)
    }

    /// Like [`transform`](Self::transform), but in non-strict mode a
    /// missing transformer yields `None` and a finding.
    pub fn transform_member(
        &mut self,
        node: NodeRef<'_>,
        target: NodeKind,
    ) -> Result<Option<Node>, TransformError> {
        match self.transform(node, target) {
            Ok(out) => Ok(Some(out)),
            Err(err) if err.is_unavailable() && !self.strict => {
                tracing::trace!("[TRANSFORM] skipping '{}': {}", node.name(), err);
                self.findings.add(
                    Finding::error(codes::TRANSFORM_UNAVAILABLE, err.to_string()).on_entity(node.name()),
                );
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Note that `what` of `owner` has no counterpart in the target dialect.
    pub fn dropped(&mut self, owner: &str, what: &str) {
        tracing::debug!("[TRANSFORM] dropping {} of '{}' for {}", what, owner, self.factory_set.dialect);
        self.findings.add(
            Finding::warning(
                codes::LOSSY_EMIT,
                format!("{what} of '{owner}' has no {} counterpart and was left out", self.factory_set.dialect),
            )
            .on_entity(owner),
        );
    }

    // ── References ──────────────────────────────────────────────────

    /// Build a slot from a wire reference, recording a forward declaration
    /// when the symbol table does not know the name yet.
    pub fn reference(&mut self, category: SlotCategory, name: &str) -> RefSlot {
        if let Some(table) = self.symbols {
            if !name.trim().is_empty() && table.resolve_in(name, &self.names).is_none() {
                self.forward_declarations.push(ForwardDeclaration {
                    name: name.to_string(),
                    referenced_by: self.owner.clone(),
                });
            }
        }
        RefSlot::new(category, name)
    }

    pub fn optional_reference(&mut self, category: SlotCategory, name: Option<&str>) -> Option<RefSlot> {
        name.map(|n| self.reference(category, n))
    }

    /// Render a slot for emission; see [`render_reference`].
    pub fn render(&self, slot: &RefSlot) -> Result<String, TransformError> {
        Ok(render_reference(slot, self.model()?, &self.names, self.symbols))
    }

    pub fn render_optional(&self, slot: Option<&RefSlot>) -> Result<Option<String>, TransformError> {
        slot.map(|s| self.render(s)).transpose()
    }

    // ── Results ─────────────────────────────────────────────────────

    pub fn forward_declarations(&self) -> &[ForwardDeclaration] {
        &self.forward_declarations
    }

    pub fn findings(&self) -> &Findings {
        &self.findings
    }

    /// Consume the context, returning what was recorded.
    pub fn finish(self) -> (Vec<ForwardDeclaration>, Findings) {
        (self.forward_declarations, self.findings)
    }
}
