//! # modelweave
//!
//! Multi-dialect domain model engine: libraries of typed entities whose
//! references are bound through a namespace-aware symbol table, loaded from
//! and saved to versioned wire dialects.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! host       → One-call compile session and save access
//!   ↓
//! save       → Lock → resolve → transform → checksum → access → validate → persist
//!   ↓
//! loader     → Reading dialect documents, missing sources as findings
//!   ↓
//! validate   → Structural rules over libraries and documents
//!   ↓
//! transform  → Transformer registry, v1.4 / v1.6 wire trees
//!   ↓
//! resolve    → Reference resolver (slot name → entity handle)
//!   ↓
//! symbols    → Symbol table snapshot, derived facet entries
//!   ↓
//! model      → Arena model: libraries, entities, reference slots, views
//!   ↓
//! base       → Primitives (QName, ResourceId, Version, Dialect)
//! ```

// ============================================================================
// MODULES (dependency order: base → model → symbols → resolve → transform → save → host)
// ============================================================================

/// Foundation types: QName, ResourceId, Version, Dialect
pub mod base;

/// Severity-tagged findings and their codes
pub mod diagnostics;

/// Engine configuration
pub mod config;

/// Arena model of libraries and entities
pub mod model;

/// Symbol table and derived entity factories
pub mod symbols;

/// Reference resolution
pub mod resolve;

/// Transformers between wire dialects and the model
pub mod transform;

/// Structural validation
pub mod validate;

/// Loading wire documents
pub mod loader;

/// The save pipeline and its services
pub mod save;

/// Compile session over a model
pub mod host;

// Re-export foundation types
pub use base::{Dialect, QName, ResourceId, Version, VersionScheme};

// Re-export the main entry points
pub use config::EngineConfig;
pub use diagnostics::{Finding, Findings, Severity};
pub use host::ModelHost;
pub use model::{EntityId, LibraryId, Model, ModelError};
pub use resolve::ReferenceResolver;
pub use save::{SaveError, SavePipeline};
pub use symbols::SymbolTable;
pub use transform::{TransformError, TransformerRegistry, WireDocument};
