//! Qualified names and resource identities.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

use super::constants::PREFIX_SEPARATOR;

/// A namespace-qualified entity name.
///
/// Two entities with the same `QName` in one symbol-table snapshot are a
/// duplicate-symbol conflict.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    namespace: Arc<str>,
    local: SmolStr,
}

impl QName {
    /// Create a qualified name.
    pub fn new(namespace: impl Into<Arc<str>>, local: impl Into<SmolStr>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// The namespace URI.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The local name.
    pub fn local(&self) -> &str {
        &self.local
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local)
    }
}

/// Identity of a persisted resource: the unit of mutual exclusion.
///
/// Independent of in-memory object identity: two `Library` instances that
/// name the same logical resource share one `ResourceId`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    pub namespace: Arc<str>,
    pub name: SmolStr,
}

impl ResourceId {
    pub fn new(namespace: impl Into<Arc<str>>, name: impl Into<SmolStr>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.namespace, self.name)
    }
}

/// Split a reference string into `(prefix, local)`.
///
/// `"htl:Hotel"` → `(Some("htl"), "Hotel")`, `"Hotel"` → `(None, "Hotel")`.
/// An empty prefix (`":Hotel"`) is treated as unprefixed.
pub fn split_prefixed(name: &str) -> (Option<&str>, &str) {
    match name.split_once(PREFIX_SEPARATOR) {
        Some(("", local)) => (None, local),
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_prefixed() {
        assert_eq!(split_prefixed("htl:Hotel"), (Some("htl"), "Hotel"));
        assert_eq!(split_prefixed("Hotel"), (None, "Hotel"));
        assert_eq!(split_prefixed(":Hotel"), (None, "Hotel"));
    }

    #[test]
    fn test_qname_display() {
        let qn = QName::new("http://example.org/ns/v1", "Hotel");
        assert_eq!(qn.to_string(), "{http://example.org/ns/v1}Hotel");
        assert_eq!(qn.local(), "Hotel");
    }

    #[test]
    fn test_resource_id_equality_ignores_instance() {
        let a = ResourceId::new("X", "Y");
        let b = ResourceId::new(String::from("X"), "Y");
        assert_eq!(a, b);
    }
}
