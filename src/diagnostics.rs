//! Findings: severity-tagged, non-fatal problems reported by resolution,
//! validation, loading and transformation.
//!
//! Findings are data returned to the caller. They never abort the pass
//! that produced them and the graph stays usable.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;

// ============================================================================
// FINDING TYPES
// ============================================================================

/// Severity level of a finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        })
    }
}

/// A single finding with the location it was raised at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    /// Stable code from [`codes`].
    pub code: &'static str,
    pub message: Arc<str>,
    /// Name of the library the finding belongs to.
    pub library: Option<SmolStr>,
    /// Local name of the entity the finding belongs to.
    pub entity: Option<SmolStr>,
    /// Slot or member path inside the entity (`Summary/@code`).
    pub path: Option<String>,
}

impl Finding {
    fn new(severity: Severity, code: &'static str, message: impl Into<Arc<str>>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            library: None,
            entity: None,
            path: None,
        }
    }

    pub fn error(code: &'static str, message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn warning(code: &'static str, message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn info(code: &'static str, message: impl Into<Arc<str>>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    pub fn in_library(mut self, library: impl Into<SmolStr>) -> Self {
        self.library = Some(library.into());
        self
    }

    pub fn on_entity(mut self, entity: impl Into<SmolStr>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        match (&self.library, &self.entity, &self.path) {
            (Some(l), Some(e), Some(p)) => write!(f, " ({l}::{e} {p})"),
            (Some(l), Some(e), None) => write!(f, " ({l}::{e})"),
            (Some(l), None, _) => write!(f, " ({l})"),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// FINDING CODES
// ============================================================================

/// Stable finding codes.
///
/// ## Code Ranges
///
/// - **E0001-E0099**: errors (resolution, structure, loading)
/// - **W0001-W0099**: warnings
/// - **I0001-I0099**: informational
pub mod codes {
    /// Reference name not found in the symbol table.
    pub const UNRESOLVED_REFERENCE: &str = "E0001";
    /// Reference found, but its target kind does not fit the slot.
    pub const KIND_MISMATCH: &str = "E0002";
    /// Two entities registered under the same (namespace, local name).
    pub const DUPLICATE_SYMBOL: &str = "E0003";
    /// No transformer for an entity in the requested dialect.
    pub const TRANSFORM_UNAVAILABLE: &str = "E0004";
    /// Empty or malformed entity or member name.
    pub const INVALID_IDENTIFIER: &str = "E0005";
    /// Two members with the same name in one facet or message.
    pub const DUPLICATE_MEMBER: &str = "E0006";
    /// Wire tree without a target namespace.
    pub const MISSING_NAMESPACE: &str = "E0007";
    /// Wire tree without a prefix.
    pub const MISSING_PREFIX: &str = "E0008";
    /// Loader input could not be found.
    pub const MISSING_SOURCE: &str = "E0009";
    /// Loader input could not be read or decoded.
    pub const LOAD_FAILED: &str = "E0010";

    /// Final library depends on an entity of a draft library.
    pub const DRAFT_DEPENDENCY: &str = "W0001";
    /// `extends` chain loops back on itself.
    pub const EXTENSION_CYCLE: &str = "W0002";
    /// Content the target dialect cannot carry was left out of the output.
    pub const LOSSY_EMIT: &str = "W0003";

    /// Reference seen before its target during transformation.
    pub const FORWARD_DECLARATION: &str = "I0001";
}

// ============================================================================
// FINDINGS COLLECTOR
// ============================================================================

/// Ordered collection of findings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Findings {
    items: Vec<Finding>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, finding: Finding) {
        self.items.push(finding);
    }

    pub fn merge(&mut self, other: Findings) {
        self.items.extend(other.items);
    }

    /// Attribute every finding without a library to `library`.
    pub fn attach_library(&mut self, library: &SmolStr) {
        for finding in self.items.iter_mut().filter(|f| f.library.is_none()) {
            finding.library = Some(library.clone());
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Finding> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Keep only findings attributed to `library`.
    pub fn retain_library(&mut self, library: &str) {
        self.items.retain(|f| f.library.as_deref() == Some(library));
    }

    /// Findings carrying `code`.
    pub fn with_code(&self, code: &str) -> Vec<&Finding> {
        self.items.iter().filter(|f| f.code == code).collect()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.items.iter().filter(|f| f.severity == severity).count()
    }

    pub fn into_vec(self) -> Vec<Finding> {
        self.items
    }
}

impl From<Vec<Finding>> for Findings {
    fn from(items: Vec<Finding>) -> Self {
        Self { items }
    }
}

impl IntoIterator for Findings {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Findings {
    type Item = &'a Finding;
    type IntoIter = std::slice::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Extend<Finding> for Findings {
    fn extend<T: IntoIterator<Item = Finding>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_severity() {
        let mut findings = Findings::new();
        findings.add(Finding::error(codes::UNRESOLVED_REFERENCE, "x"));
        findings.add(Finding::warning(codes::EXTENSION_CYCLE, "y"));
        findings.add(Finding::info(codes::FORWARD_DECLARATION, "z"));
        assert_eq!(findings.error_count(), 1);
        assert_eq!(findings.warning_count(), 1);
        assert!(findings.has_errors());
        assert_eq!(findings.with_code(codes::EXTENSION_CYCLE).len(), 1);
    }

    #[test]
    fn test_display_includes_location() {
        let finding = Finding::error(codes::UNRESOLVED_REFERENCE, "unresolved reference 'X'")
            .in_library("Hotel")
            .on_entity("Room")
            .at_path("Summary/@code");
        assert_eq!(
            finding.to_string(),
            "error[E0001]: unresolved reference 'X' (Hotel::Room Summary/@code)"
        );
    }
}
