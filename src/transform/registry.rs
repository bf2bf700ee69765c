//! The transformer registry.
//!
//! ## Keys
//!
//! ```text
//! (source NodeKind, target NodeKind, FactorySetId { direction, dialect })
//!     -> Arc<dyn Transformer>
//! ```
//!
//! Lookup is by exact key only. A pair without a transformer in the
//! requested factory set means the node cannot be expressed in that
//! dialect (e.g. a choice object saved as `1.4`).

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::context::{ForwardDeclaration, TransformContext};
use super::document::WireDocument;
use super::error::TransformError;
use super::node::{FactorySetId, Node, NodeKind, NodeRef, WireKind};
use super::{v14, v16};
use crate::base::Dialect;
use crate::diagnostics::Findings;
use crate::model::{LibraryDef, LibraryId, Model};
use crate::symbols::SymbolTable;

/// Converts one node into another.
pub trait Transformer: Send + Sync {
    fn transform(&self, source: NodeRef<'_>, ctx: &mut TransformContext<'_>) -> Result<Node, TransformError>;
}

impl<F> Transformer for F
where
    F: Fn(NodeRef<'_>, &mut TransformContext<'_>) -> Result<Node, TransformError> + Send + Sync,
{
    fn transform(&self, source: NodeRef<'_>, ctx: &mut TransformContext<'_>) -> Result<Node, TransformError> {
        self(source, ctx)
    }
}

type Key = (NodeKind, NodeKind, FactorySetId);

/// Result of loading a wire document.
#[derive(Clone, Debug)]
pub struct LoadOutcome {
    pub library: LibraryDef,
    pub forward_declarations: Vec<ForwardDeclaration>,
    pub findings: Findings,
}

/// Result of emitting a library.
#[derive(Clone, Debug)]
pub struct EmitOutcome {
    pub document: WireDocument,
    pub findings: Findings,
}

#[derive(Clone, Default)]
pub struct TransformerRegistry {
    transformers: FxHashMap<Key, Arc<dyn Transformer>>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with both directions of every shipped dialect.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        v14::register(&mut registry);
        v16::register(&mut registry);
        registry
    }

    /// Register a transformer, returning the one it replaced.
    pub fn register(
        &mut self,
        from: NodeKind,
        to: NodeKind,
        factory_set: FactorySetId,
        transformer: Arc<dyn Transformer>,
    ) -> Option<Arc<dyn Transformer>> {
        self.transformers.insert((from, to, factory_set), transformer)
    }

    pub fn get(&self, from: NodeKind, to: NodeKind, factory_set: FactorySetId) -> Option<Arc<dyn Transformer>> {
        self.transformers.get(&(from, to, factory_set)).cloned()
    }

    pub fn contains(&self, from: NodeKind, to: NodeKind, factory_set: FactorySetId) -> bool {
        self.transformers.contains_key(&(from, to, factory_set))
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    // ── Whole-document operations ───────────────────────────────────

    /// Transform a wire document into a detached library definition.
    ///
    /// With a symbol table, references it cannot resolve are reported as
    /// forward declarations. Members without a transformer are skipped
    /// with a finding.
    pub fn load_document(
        &self,
        document: &WireDocument,
        symbols: Option<&SymbolTable>,
    ) -> Result<LoadOutcome, TransformError> {
        let factory_set = FactorySetId::to_model(document.dialect());
        let mut ctx = TransformContext::new(self, factory_set).with_optional_symbols(symbols);
        let library = ctx.transform(document.as_node(), NodeKind::Library)?.into_library_def()?;
        let (forward_declarations, findings) = ctx.finish();
        tracing::debug!(
            "[TRANSFORM] loaded '{}' ({}): {} members, {} forward declarations",
            library.name,
            document.dialect(),
            library.entities.len(),
            forward_declarations.len()
        );
        Ok(LoadOutcome {
            library,
            forward_declarations,
            findings,
        })
    }

    /// Emit `library` of `model` in `dialect`.
    ///
    /// In strict mode any member the dialect cannot express fails the
    /// emission; otherwise it is left out with a finding.
    pub fn emit_library(
        &self,
        model: &Model,
        library: LibraryId,
        dialect: Dialect,
        symbols: Option<&SymbolTable>,
        strict: bool,
    ) -> Result<EmitOutcome, TransformError> {
        let lib = model
            .library(library)
            .ok_or(TransformError::UnknownLibrary(library))?;
        let mut ctx = TransformContext::new(self, FactorySetId::to_wire(dialect))
            .with_model(model)
            .with_optional_symbols(symbols)
            .strict(strict);
        let node = ctx.transform(NodeRef::Library(lib), NodeKind::Wire(WireKind::Library))?;
        let document = match dialect {
            Dialect::V1_4 => WireDocument::V14(node.into_v14_library()?),
            Dialect::V1_6 => WireDocument::V16(node.into_v16_library()?),
        };
        let (_, findings) = ctx.finish();
        Ok(EmitOutcome { document, findings })
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("transformers", &self.transformers.len())
            .finish()
    }
}
