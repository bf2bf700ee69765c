//! The unified entity graph.
//!
//! ```text
//! Model
//!   └── Library*          (user / built-in / legacy, ordered members)
//!         └── Entity*     (kind-tagged body with reference slots)
//! ```
//!
//! Libraries and entities are addressed by [`LibraryId`] and [`EntityId`].
//! Reference slots hold a name string and, once resolved, an [`EntityRef`].

pub mod builtin;
mod entity;
mod error;
mod graph;
mod ids;
mod library;
pub mod views;

pub use entity::{
    Attribute, ComplexType, Element, EntityBody, EntityDef, EntityKind, EntityRef, EnumValue,
    Enumeration, ExtensionPoint, Facet, FacetKind, Indicator, MemberSet, Operation, RefSlot,
    Service, SimpleType, SlotCategory, ValueWithAttributes, XsdType, Entity,
};
pub use error::ModelError;
pub use graph::{Model, ModelChange};
pub use ids::{EntityId, LibraryId};
pub use library::{Library, LibraryDef, LibraryKind, LibraryStatus, NamespaceImport};
pub use views::{EntityView, LibraryView, RefTarget};
