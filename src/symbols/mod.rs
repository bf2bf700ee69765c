//! Symbol indexing: the snapshot table used by resolution and transformation.

mod derived;
mod table;

pub use derived::{DerivedEntityFactory, DerivedEntry, FacetDerivationFactory, NoDerivation};
pub use table::{Collision, NameContext, Symbol, SymbolTable};
