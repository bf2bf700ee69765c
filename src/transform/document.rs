//! Dialect-tagged wire documents.
//!
//! On disk a document is a JSON object whose `Dialect` field selects the
//! wire tree:
//!
//! ```json
//! { "Dialect": "1.6", "Name": "Hotel", "Namespace": "http://...", "Members": [] }
//! ```

use serde::{Deserialize, Serialize};

use super::node::NodeRef;
use super::{v14, v16};
use crate::base::Dialect;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Dialect")]
pub enum WireDocument {
    #[serde(rename = "1.4")]
    V14(v14::Library),
    #[serde(rename = "1.6")]
    V16(v16::Library),
}

impl WireDocument {
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::V14(_) => Dialect::V1_4,
            Self::V16(_) => Dialect::V1_6,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::V14(lib) => &lib.name,
            Self::V16(lib) => &lib.name,
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            Self::V14(lib) => &lib.namespace,
            Self::V16(lib) => &lib.namespace,
        }
    }

    pub fn prefix(&self) -> &str {
        match self {
            Self::V14(lib) => &lib.prefix,
            Self::V16(lib) => &lib.prefix,
        }
    }

    /// Member names in document order.
    pub fn member_names(&self) -> Vec<&str> {
        match self {
            Self::V14(lib) => lib.members.iter().map(v14::Member::name).collect(),
            Self::V16(lib) => lib.members.iter().map(v16::Member::name).collect(),
        }
    }

    pub fn checksum(&self) -> Option<&str> {
        match self {
            Self::V14(_) => None,
            Self::V16(lib) => lib.checksum.as_deref(),
        }
    }

    /// Whether this dialect can carry a checksum.
    pub fn supports_checksum(&self) -> bool {
        matches!(self, Self::V16(_))
    }

    /// Set or clear the checksum. Returns false when the dialect has no
    /// checksum field.
    pub fn set_checksum(&mut self, checksum: Option<String>) -> bool {
        match self {
            Self::V14(_) => false,
            Self::V16(lib) => {
                lib.checksum = checksum;
                true
            }
        }
    }

    /// The root node for transformation.
    pub fn as_node(&self) -> NodeRef<'_> {
        match self {
            Self::V14(lib) => NodeRef::V14Library(lib),
            Self::V16(lib) => NodeRef::V16Library(lib),
        }
    }

    /// Canonical encoding: compact JSON without the checksum. Checksums
    /// are computed over these bytes.
    pub fn canonical_bytes(&self) -> serde_json::Result<Vec<u8>> {
        let mut stripped = self.clone();
        stripped.set_checksum(None);
        serde_json::to_vec(&stripped)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(input: &str) -> serde_json::Result<Self> {
        serde_json::from_str(input)
    }
}
