//! Domain constants shared across the engine.

/// Namespace of the built-in XML schema library.
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Prefix conventionally bound to [`XSD_NAMESPACE`].
pub const XSD_PREFIX: &str = "xsd";

/// Separator between a namespace prefix and a local name (`pfx:Local`).
pub const PREFIX_SEPARATOR: char = ':';

/// Separator between an entity name and a derived facet suffix (`Hotel_Summary`).
pub const FACET_SEPARATOR: char = '_';

/// Default lock acquisition timeout in milliseconds.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;
