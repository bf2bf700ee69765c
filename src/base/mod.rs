//! Foundation types for the modelweave engine.
//!
//! This module provides fundamental types used throughout the engine:
//! - [`QName`] - (namespace, local name) identity of a model entity
//! - [`ResourceId`] - (namespace, resource name) identity used for locking
//! - [`Version`], [`VersionScheme`] - namespace ↔ version mapping
//! - [`Dialect`] - wire-schema dialect identifiers
//! - Domain constants (built-in namespaces, separators)
//!
//! This module has NO dependencies on other modelweave modules.

pub mod constants;
mod dialect;
mod qname;
mod version;

pub use dialect::Dialect;
pub use qname::{QName, ResourceId, split_prefixed};
pub use version::{DefaultVersionScheme, Version, VersionError, VersionScheme};
