//! Structural validation of libraries and wire documents.
//!
//! Runs after resolution. Checks here never change the model and never
//! fail; everything they find is a [`Finding`].
//!
//! | Rule                               | Code                     | Severity |
//! |------------------------------------|--------------------------|----------|
//! | empty or malformed identifier      | `INVALID_IDENTIFIER`     | error    |
//! | member name repeated in one set    | `DUPLICATE_MEMBER`       | error    |
//! | final library uses a draft entity  | `DRAFT_DEPENDENCY`       | warning  |
//! | extension chain loops              | `EXTENSION_CYCLE`        | warning  |
//! | document without namespace         | `MISSING_NAMESPACE`      | error    |
//! | document without prefix            | `MISSING_PREFIX`         | error    |

use rustc_hash::FxHashSet;

use crate::diagnostics::{Finding, Findings, codes};
use crate::model::{Entity, EntityBody, EntityId, LibraryId, LibraryStatus, MemberSet, Model, RefSlot};
use crate::transform::WireDocument;

/// Whether `name` is a usable local name: an identifier that may also
/// contain `-` and `.` after the first character.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || unicode_ident::is_xid_start(first))
        && chars.all(|c| c == '-' || c == '.' || unicode_ident::is_xid_continue(c))
}

// ============================================================================
// MODEL CHECKER
// ============================================================================

/// Runs the structural rules over libraries of a model.
pub struct ModelChecker<'a> {
    model: &'a Model,
    findings: Findings,
}

impl<'a> ModelChecker<'a> {
    pub fn new(model: &'a Model) -> Self {
        Self {
            model,
            findings: Findings::new(),
        }
    }

    /// Check every user library.
    pub fn check_all(&mut self) {
        let model = self.model;
        for id in model.library_ids() {
            if model.library(id).is_some_and(|l| l.status().is_some()) {
                self.check_library(id);
            }
        }
    }

    /// Check one library. Unknown ids are ignored.
    pub fn check_library(&mut self, id: LibraryId) {
        let model = self.model;
        let Some(library) = model.library(id) else {
            return;
        };
        let library_name = library.name.clone();
        if !is_valid_identifier(&library.name) {
            self.findings.add(
                Finding::error(
                    codes::INVALID_IDENTIFIER,
                    format!("library name '{}' is not a valid identifier", library.name),
                )
                .in_library(library_name.clone()),
            );
        }

        let is_final = library.status() == Some(LibraryStatus::Final);
        for entity in model.members(id) {
            self.check_identifier(&library_name, entity);
            self.check_members(&library_name, entity);
            if is_final {
                self.check_draft_dependencies(&library_name, entity);
            }
            self.check_extension_cycle(&library_name, entity);
        }
    }

    pub fn findings(&self) -> &Findings {
        &self.findings
    }

    pub fn finish(self) -> Findings {
        self.findings
    }

    // ── Rules ───────────────────────────────────────────────────────

    fn check_identifier(&mut self, library: &str, entity: &Entity) {
        if !is_valid_identifier(&entity.name) {
            self.findings.add(
                Finding::error(
                    codes::INVALID_IDENTIFIER,
                    format!("'{}' is not a valid identifier", entity.name),
                )
                .in_library(library)
                .on_entity(entity.name.clone()),
            );
        }
    }

    fn check_members(&mut self, library: &str, entity: &Entity) {
        let mut sets: Vec<(String, &MemberSet)> = Vec::new();
        match &entity.body {
            EntityBody::Core(c) | EntityBody::Business(c) | EntityBody::Choice(c) => {
                sets.extend(c.facets.iter().map(|f| (f.kind.suffix().to_string(), &f.members)));
            }
            EntityBody::Service(s) => {
                for op in &s.operations {
                    sets.push((format!("{}/request", op.name), &op.request));
                    sets.push((format!("{}/response", op.name), &op.response));
                    if let Some(n) = &op.notification {
                        sets.push((format!("{}/notification", op.name), n));
                    }
                }
            }
            EntityBody::ExtensionPoint(x) => sets.push(("members".to_string(), &x.members)),
            EntityBody::ValueWithAttributes(v) => {
                let mut seen = FxHashSet::default();
                let names = v
                    .attributes
                    .iter()
                    .map(|a| a.name.as_str())
                    .chain(v.indicators.iter().map(|i| i.name.as_str()));
                for name in names {
                    self.check_member_name(library, entity, "", name, &mut seen);
                }
            }
            EntityBody::Simple(_) | EntityBody::Enumeration(_) | EntityBody::Xsd(_) => {}
        }

        for (path, set) in sets {
            let mut seen = FxHashSet::default();
            for name in set.member_names() {
                self.check_member_name(library, entity, &path, name, &mut seen);
            }
        }
    }

    fn check_member_name<'n>(
        &mut self,
        library: &str,
        entity: &Entity,
        path: &str,
        name: &'n str,
        seen: &mut FxHashSet<&'n str>,
    ) {
        let at = if path.is_empty() {
            name.to_string()
        } else {
            format!("{path}/{name}")
        };
        if !is_valid_identifier(name) {
            self.findings.add(
                Finding::error(codes::INVALID_IDENTIFIER, format!("member name '{name}' is not a valid identifier"))
                    .in_library(library)
                    .on_entity(entity.name.clone())
                    .at_path(at.clone()),
            );
        }
        if !seen.insert(name) {
            self.findings.add(
                Finding::error(codes::DUPLICATE_MEMBER, format!("member '{name}' is declared more than once"))
                    .in_library(library)
                    .on_entity(entity.name.clone())
                    .at_path(at),
            );
        }
    }

    fn check_draft_dependencies(&mut self, library: &str, entity: &Entity) {
        let model = self.model;
        for (path, slot) in entity.body.slots() {
            let Some(target) = slot.resolved() else {
                continue;
            };
            let Some(target_library) = model
                .entity(target.entity)
                .and_then(|t| model.library(t.library()))
            else {
                continue;
            };
            if target_library.id() != entity.library() && target_library.status() == Some(LibraryStatus::Draft) {
                self.findings.add(
                    Finding::warning(
                        codes::DRAFT_DEPENDENCY,
                        format!(
                            "final library references '{}' from draft library '{}'",
                            slot.name(),
                            target_library.name
                        ),
                    )
                    .in_library(library)
                    .on_entity(entity.name.clone())
                    .at_path(path),
                );
            }
        }
    }

    fn check_extension_cycle(&mut self, library: &str, entity: &Entity) {
        let model = self.model;
        let start = entity.id();
        let mut seen = FxHashSet::default();
        let mut current = base_of(entity);
        while let Some(next) = current {
            if next == start {
                self.findings.add(
                    Finding::warning(
                        codes::EXTENSION_CYCLE,
                        format!("'{}' extends itself through its base chain", entity.name),
                    )
                    .in_library(library)
                    .on_entity(entity.name.clone()),
                );
                return;
            }
            // A loop that does not pass through `start` is reported on its own members.
            if !seen.insert(next) {
                return;
            }
            current = model.entity(next).and_then(base_of);
        }
    }
}

/// The entity a type derives from: `extends` for enumerations and complex
/// types, the parent for simple types.
fn base_of(entity: &Entity) -> Option<EntityId> {
    let slot: Option<&RefSlot> = match &entity.body {
        EntityBody::Simple(s) => Some(&s.parent),
        EntityBody::Enumeration(e) => e.extends.as_ref(),
        EntityBody::Core(c) | EntityBody::Business(c) | EntityBody::Choice(c) => c.extends.as_ref(),
        _ => None,
    };
    slot.and_then(RefSlot::resolved).map(|r| r.entity)
}

// ============================================================================
// DOCUMENT CHECKS
// ============================================================================

/// Checks on an emitted wire document.
pub fn check_document(document: &WireDocument) -> Findings {
    let mut findings = Findings::new();
    if document.namespace().trim().is_empty() {
        findings.add(
            Finding::error(codes::MISSING_NAMESPACE, "document has no namespace").in_library(document.name()),
        );
    }
    if document.prefix().trim().is_empty() {
        findings.add(Finding::error(codes::MISSING_PREFIX, "document has no prefix").in_library(document.name()));
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ComplexType, Element, EntityDef, Facet, FacetKind, LibraryDef, SimpleType,
    };
    use crate::resolve::ReferenceResolver;
    use crate::symbols::FacetDerivationFactory;
    use crate::transform::v16;

    #[test]
    fn test_identifier_rules() {
        assert!(is_valid_identifier("Hotel"));
        assert!(is_valid_identifier("_internal"));
        assert!(is_valid_identifier("room-type.v2"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2Hotel"));
        assert!(!is_valid_identifier("Ho tel"));
    }

    #[test]
    fn test_duplicate_member_in_facet() {
        let mut model = Model::new();
        let hotel = ComplexType::default().with_facet(
            Facet::new(FacetKind::Summary)
                .with_element(Element::new("Name", "xsd:string"))
                .with_element(Element::new("Name", "xsd:string")),
        );
        let lib = model
            .add_library(
                LibraryDef::user("Hotel", "http://example.org/hotel/v1", "htl")
                    .with_entity(EntityDef::new("Hotel", EntityBody::Business(hotel))),
            )
            .unwrap();
        let mut checker = ModelChecker::new(&model);
        checker.check_library(lib);
        let findings = checker.finish();
        assert_eq!(findings.with_code(codes::DUPLICATE_MEMBER).len(), 1);
    }

    #[test]
    fn test_extension_cycle_is_warning() {
        let mut model = Model::new();
        model
            .add_library(
                LibraryDef::user("Loop", "http://example.org/loop/v1", "lp")
                    .with_entity(EntityDef::new("A", EntityBody::Core(ComplexType::default().extending("B"))))
                    .with_entity(EntityDef::new("B", EntityBody::Core(ComplexType::default().extending("A")))),
            )
            .unwrap();
        ReferenceResolver::resolve_all(&mut model, &FacetDerivationFactory);
        let mut checker = ModelChecker::new(&model);
        checker.check_all();
        let findings = checker.finish();
        assert_eq!(findings.with_code(codes::EXTENSION_CYCLE).len(), 2);
        assert!(!findings.has_errors());
    }

    #[test]
    fn test_final_library_using_draft_entity() {
        let mut model = Model::new();
        model
            .add_library(
                LibraryDef::user("Common", "http://example.org/common/v1", "cmn")
                    .with_entity(EntityDef::new("Code", EntityBody::Simple(SimpleType::new("xsd:string")))),
            )
            .unwrap();
        let fin = model
            .add_library(
                LibraryDef::user("Hotel", "http://example.org/hotel/v1", "htl")
                    .with_status(LibraryStatus::Final)
                    .with_import("cmn", "http://example.org/common/v1")
                    .with_entity(EntityDef::new("RoomCode", EntityBody::Simple(SimpleType::new("cmn:Code")))),
            )
            .unwrap();
        ReferenceResolver::resolve_all(&mut model, &FacetDerivationFactory);
        let mut checker = ModelChecker::new(&model);
        checker.check_library(fin);
        assert_eq!(checker.findings().with_code(codes::DRAFT_DEPENDENCY).len(), 1);
    }

    #[test]
    fn test_document_without_prefix() {
        let doc = WireDocument::V16(v16::Library {
            name: "Hotel".into(),
            namespace: "http://example.org/hotel/v1".into(),
            ..Default::default()
        });
        let findings = check_document(&doc);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings.with_code(codes::MISSING_PREFIX).len(), 1);
    }
}
