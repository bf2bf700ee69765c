//! The built-in XML-schema library.
//!
//! Every model created with [`Model::with_builtins`](super::Model::with_builtins)
//! carries this library first, so user libraries can reference `xsd:string`
//! and friends without loading anything.

use super::entity::{EntityBody, EntityDef, XsdType};
use super::library::{LibraryDef, LibraryKind};
use crate::base::constants::{XSD_NAMESPACE, XSD_PREFIX};

/// Name of the built-in library.
pub const BUILTIN_LIBRARY_NAME: &str = "XMLSchema";

const SIMPLE_TYPES: &[&str] = &[
    "string",
    "normalizedString",
    "token",
    "boolean",
    "decimal",
    "integer",
    "int",
    "long",
    "short",
    "byte",
    "positiveInteger",
    "nonNegativeInteger",
    "double",
    "float",
    "date",
    "dateTime",
    "time",
    "duration",
    "gYear",
    "anyURI",
    "base64Binary",
    "language",
    "ID",
    "IDREF",
    "IDREFS",
    "NMTOKEN",
];

const COMPLEX_TYPES: &[&str] = &["anyType"];

/// Definition of the built-in library.
pub fn builtin_library() -> LibraryDef {
    let mut def = LibraryDef::user(BUILTIN_LIBRARY_NAME, XSD_NAMESPACE, XSD_PREFIX);
    def.kind = LibraryKind::BuiltIn;
    def.read_only = true;
    def.entities = SIMPLE_TYPES
        .iter()
        .map(|name| (name, false))
        .chain(COMPLEX_TYPES.iter().map(|name| (name, true)))
        .map(|(name, complex)| EntityDef::new(*name, EntityBody::Xsd(XsdType { complex })))
        .collect();
    def
}

/// True when `namespace` is the built-in library's namespace.
pub fn is_builtin_namespace(namespace: &str) -> bool {
    namespace == XSD_NAMESPACE
}
