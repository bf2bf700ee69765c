//! Transformation between wire trees and the model.
//!
//! ```text
//!   WireDocument ──load_document──▶ LibraryDef ──Model::add_library──▶ Model
//!        ▲                                                              │
//!        └────────────────────────── emit_library ─────────────────────┘
//! ```
//!
//! Every step is one [`Transformer`] looked up in the
//! [`TransformerRegistry`] by `(source kind, target kind, factory set)`.
//! A factory set is a direction plus a dialect, so the same entity kind can
//! be transformed differently per dialect, or not at all.
//!
//! Loading never touches the model; the produced [`LibraryDef`] carries
//! unresolved reference slots until the resolver binds them. Emission reads
//! the model and renders every reference back to a name that still resolves
//! from the emitted library.
//!
//! [`LibraryDef`]: crate::model::LibraryDef

mod context;
mod document;
mod error;
pub mod names;
mod node;
mod registry;
pub mod v14;
pub mod v16;

pub use context::{ForwardDeclaration, TransformContext};
pub use document::WireDocument;
pub use error::TransformError;
pub use node::{Direction, FactorySetId, Node, NodeKind, NodeRef, WireKind};
pub use registry::{EmitOutcome, LoadOutcome, Transformer, TransformerRegistry};
