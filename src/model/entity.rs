//! Entities: the named members of a library.
//!
//! ## Structure
//!
//! ```text
//! Entity
//! ├── name / documentation
//! ├── library: LibraryId            (owning library, fixed except re-parent)
//! └── body: EntityBody              (closed set of kinds)
//!     └── RefSlot*                  (name string + resolved EntityRef)
//! ```
//!
//! Reference slots keep the name exactly as it was written (`"htl:Hotel"`)
//! even after resolution, so diagnostics and re-serialization never depend
//! on the resolved handle.

use smol_str::SmolStr;

use super::ids::{EntityId, LibraryId};
use crate::base::constants::FACET_SEPARATOR;

// ============================================================================
// KINDS
// ============================================================================

/// The kind tag of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    SimpleType,
    Enumeration,
    ValueWithAttributes,
    CoreObject,
    BusinessObject,
    ChoiceObject,
    Service,
    ExtensionPoint,
    /// XML-schema simple type (built-in and legacy libraries).
    XsdSimple,
    /// XML-schema complex type (legacy libraries).
    XsdComplex,
}

impl EntityKind {
    /// Returns true for complex structural types that own sub-facets.
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            Self::CoreObject | Self::BusinessObject | Self::ChoiceObject
        )
    }

    /// Returns true for kinds usable as an attribute or simple value type.
    pub fn is_simple_value(&self) -> bool {
        matches!(
            self,
            Self::SimpleType | Self::Enumeration | Self::ValueWithAttributes | Self::XsdSimple
        )
    }

    /// Human-readable kind name used in findings.
    pub fn display(&self) -> &'static str {
        match self {
            Self::SimpleType => "simple type",
            Self::Enumeration => "enumeration",
            Self::ValueWithAttributes => "value with attributes",
            Self::CoreObject => "core object",
            Self::BusinessObject => "business object",
            Self::ChoiceObject => "choice object",
            Self::Service => "service",
            Self::ExtensionPoint => "extension point",
            Self::XsdSimple => "schema simple type",
            Self::XsdComplex => "schema complex type",
        }
    }
}

/// A sub-facet of a complex type.
///
/// Facets are addressable by derived names (`Hotel_Summary`) registered by
/// the derived entity factory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FacetKind {
    Id,
    Summary,
    Detail,
    Shared,
    Simple,
}

impl FacetKind {
    /// Suffix used in derived names.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Id => "ID",
            Self::Summary => "Summary",
            Self::Detail => "Detail",
            Self::Shared => "Shared",
            Self::Simple => "Simple",
        }
    }

    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "ID" => Some(Self::Id),
            "Summary" => Some(Self::Summary),
            "Detail" => Some(Self::Detail),
            "Shared" => Some(Self::Shared),
            "Simple" => Some(Self::Simple),
            _ => None,
        }
    }

    /// The derived local name for this facet of `owner`.
    pub fn derived_name(&self, owner: &str) -> SmolStr {
        SmolStr::from(format!("{owner}{FACET_SEPARATOR}{}", self.suffix()))
    }

    /// Facets that carry attributes/elements (everything but `Simple`).
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Simple)
    }
}

// ============================================================================
// REFERENCES
// ============================================================================

/// Target of a resolved reference: an entity, optionally narrowed to one
/// of its derived facets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub entity: EntityId,
    pub facet: Option<FacetKind>,
}

impl EntityRef {
    pub fn entity(entity: EntityId) -> Self {
        Self {
            entity,
            facet: None,
        }
    }

    pub fn facet(entity: EntityId, facet: FacetKind) -> Self {
        Self {
            entity,
            facet: Some(facet),
        }
    }
}

/// What a reference slot is allowed to point at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotCategory {
    /// Parent of a simple type: simple types only.
    ParentType,
    /// Attribute type, value-with-attributes parent, core simple facet.
    AttributeType,
    /// Element type: complex types, their facets, and value types.
    ElementType,
    /// `extends` of a complex type or enumeration: same kind as the owner.
    Extension,
    /// Target of an extension point: a structural facet.
    ExtensionPoint,
}

impl SlotCategory {
    /// Whether a target of `target_kind` (narrowed to `facet`) may fill this
    /// slot on an entity of `owner_kind`.
    pub fn accepts(
        &self,
        owner_kind: EntityKind,
        target_kind: EntityKind,
        facet: Option<FacetKind>,
    ) -> bool {
        match self {
            Self::ParentType => {
                facet.is_none()
                    && matches!(target_kind, EntityKind::SimpleType | EntityKind::XsdSimple)
            }
            Self::AttributeType => match facet {
                None => target_kind.is_simple_value(),
                Some(FacetKind::Simple) => target_kind == EntityKind::CoreObject,
                Some(_) => false,
            },
            Self::ElementType => match facet {
                None => {
                    target_kind.is_complex()
                        || matches!(
                            target_kind,
                            EntityKind::ValueWithAttributes
                                | EntityKind::XsdComplex
                                | EntityKind::XsdSimple
                        )
                }
                Some(f) => f.is_structural() && target_kind.is_complex(),
            },
            Self::Extension => facet.is_none() && target_kind == owner_kind,
            Self::ExtensionPoint => {
                matches!(facet, Some(f) if f.is_structural()) && target_kind.is_complex()
            }
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            Self::ParentType => "parent type",
            Self::AttributeType => "attribute type",
            Self::ElementType => "element type",
            Self::Extension => "extension",
            Self::ExtensionPoint => "extension point target",
        }
    }
}

/// A by-name reference to another entity.
///
/// The name string is retained after resolution; only the resolver writes
/// the handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefSlot {
    name: String,
    category: SlotCategory,
    resolved: Option<EntityRef>,
}

impl RefSlot {
    pub fn new(category: SlotCategory, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category,
            resolved: None,
        }
    }

    /// The reference exactly as written.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> SlotCategory {
        self.category
    }

    pub fn resolved(&self) -> Option<EntityRef> {
        self.resolved
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// True when the slot names nothing (an empty reference).
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
    }

    /// Point the slot at a different name. Drops any resolved handle.
    pub fn retarget(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.resolved = None;
    }

    pub(crate) fn set_resolved(&mut self, target: EntityRef) {
        self.resolved = Some(target);
    }

    pub(crate) fn clear_resolved(&mut self) {
        self.resolved = None;
    }
}

// ============================================================================
// MEMBERS
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub name: SmolStr,
    pub type_ref: RefSlot,
    pub mandatory: bool,
    pub documentation: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<SmolStr>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_ref: RefSlot::new(SlotCategory::AttributeType, type_name),
            mandatory: false,
            documentation: None,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: SmolStr,
    pub type_ref: RefSlot,
    pub mandatory: bool,
    /// Maximum occurrences; `0` means unbounded.
    pub repeat: u32,
    pub documentation: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<SmolStr>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_ref: RefSlot::new(SlotCategory::ElementType, type_name),
            mandatory: false,
            repeat: 1,
            documentation: None,
        }
    }

    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat;
        self
    }
}

/// A boolean flag member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Indicator {
    pub name: SmolStr,
    pub publish_as_element: bool,
}

impl Indicator {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            publish_as_element: false,
        }
    }
}

/// Attributes, elements and indicators of a facet or message.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemberSet {
    pub attributes: Vec<Attribute>,
    pub elements: Vec<Element>,
    pub indicators: Vec<Indicator>,
}

impl MemberSet {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.elements.is_empty() && self.indicators.is_empty()
    }

    /// Names of all members, in declaration order (attributes, elements, indicators).
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .map(|a| a.name.as_str())
            .chain(self.elements.iter().map(|e| e.name.as_str()))
            .chain(self.indicators.iter().map(|i| i.name.as_str()))
    }

    fn collect<'a>(&'a self, path: &str, out: &mut Vec<(String, &'a RefSlot)>) {
        for a in &self.attributes {
            out.push((format!("{path}/@{}", a.name), &a.type_ref));
        }
        for e in &self.elements {
            out.push((format!("{path}/{}", e.name), &e.type_ref));
        }
    }

    fn collect_mut<'a>(&'a mut self, path: &str, out: &mut Vec<(String, &'a mut RefSlot)>) {
        for a in &mut self.attributes {
            out.push((format!("{path}/@{}", a.name), &mut a.type_ref));
        }
        for e in &mut self.elements {
            out.push((format!("{path}/{}", e.name), &mut e.type_ref));
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Facet {
    pub kind: FacetKind,
    pub members: MemberSet,
}

impl Facet {
    pub fn new(kind: FacetKind) -> Self {
        Self {
            kind,
            members: MemberSet::default(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.members.attributes.push(attribute);
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.members.elements.push(element);
        self
    }

    pub fn with_indicator(mut self, indicator: Indicator) -> Self {
        self.members.indicators.push(indicator);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumValue {
    pub literal: SmolStr,
    pub label: Option<String>,
}

impl EnumValue {
    pub fn new(literal: impl Into<SmolStr>) -> Self {
        Self {
            literal: literal.into(),
            label: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub name: SmolStr,
    pub request: MemberSet,
    pub response: MemberSet,
    pub notification: Option<MemberSet>,
}

impl Operation {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            request: MemberSet::default(),
            response: MemberSet::default(),
            notification: None,
        }
    }
}

// ============================================================================
// BODIES
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct SimpleType {
    pub parent: RefSlot,
    pub pattern: Option<String>,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub list: bool,
}

impl SimpleType {
    pub fn new(parent: impl Into<String>) -> Self {
        Self {
            parent: RefSlot::new(SlotCategory::ParentType, parent),
            pattern: None,
            min_length: None,
            max_length: None,
            list: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enumeration {
    pub open: bool,
    pub extends: Option<RefSlot>,
    pub values: Vec<EnumValue>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ValueWithAttributes {
    pub parent: RefSlot,
    pub attributes: Vec<Attribute>,
    pub indicators: Vec<Indicator>,
}

/// Core, business and choice objects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComplexType {
    pub extends: Option<RefSlot>,
    /// Simple facet type (core objects only).
    pub simple_type: Option<RefSlot>,
    pub facets: Vec<Facet>,
    /// Alternate names; each is registered as a derived symbol.
    pub aliases: Vec<SmolStr>,
}

impl ComplexType {
    pub fn facet(&self, kind: FacetKind) -> Option<&Facet> {
        self.facets.iter().find(|f| f.kind == kind)
    }

    pub fn facet_mut(&mut self, kind: FacetKind) -> Option<&mut Facet> {
        self.facets.iter_mut().find(|f| f.kind == kind)
    }

    pub fn with_facet(mut self, facet: Facet) -> Self {
        self.facets.push(facet);
        self
    }

    pub fn extending(mut self, name: impl Into<String>) -> Self {
        self.extends = Some(RefSlot::new(SlotCategory::Extension, name));
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Service {
    pub operations: Vec<Operation>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExtensionPoint {
    pub extends: RefSlot,
    pub members: MemberSet,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XsdType {
    pub complex: bool,
}

/// Kind-specific content of an entity.
#[derive(Clone, Debug, PartialEq)]
pub enum EntityBody {
    Simple(SimpleType),
    Enumeration(Enumeration),
    ValueWithAttributes(ValueWithAttributes),
    Core(ComplexType),
    Business(ComplexType),
    Choice(ComplexType),
    Service(Service),
    ExtensionPoint(ExtensionPoint),
    Xsd(XsdType),
}

impl EntityBody {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Simple(_) => EntityKind::SimpleType,
            Self::Enumeration(_) => EntityKind::Enumeration,
            Self::ValueWithAttributes(_) => EntityKind::ValueWithAttributes,
            Self::Core(_) => EntityKind::CoreObject,
            Self::Business(_) => EntityKind::BusinessObject,
            Self::Choice(_) => EntityKind::ChoiceObject,
            Self::Service(_) => EntityKind::Service,
            Self::ExtensionPoint(_) => EntityKind::ExtensionPoint,
            Self::Xsd(x) if x.complex => EntityKind::XsdComplex,
            Self::Xsd(_) => EntityKind::XsdSimple,
        }
    }

    /// The complex-type payload of core, business and choice objects.
    pub fn as_complex(&self) -> Option<&ComplexType> {
        match self {
            Self::Core(c) | Self::Business(c) | Self::Choice(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_complex_mut(&mut self) -> Option<&mut ComplexType> {
        match self {
            Self::Core(c) | Self::Business(c) | Self::Choice(c) => Some(c),
            _ => None,
        }
    }

    /// All reference slots with a readable path, in declaration order.
    pub fn slots(&self) -> Vec<(String, &RefSlot)> {
        let mut out = Vec::new();
        match self {
            Self::Simple(s) => out.push(("parent".to_string(), &s.parent)),
            Self::Enumeration(e) => {
                if let Some(ext) = &e.extends {
                    out.push(("extends".to_string(), ext));
                }
            }
            Self::ValueWithAttributes(v) => {
                out.push(("parent".to_string(), &v.parent));
                for a in &v.attributes {
                    out.push((format!("@{}", a.name), &a.type_ref));
                }
            }
            Self::Core(c) | Self::Business(c) | Self::Choice(c) => {
                if let Some(ext) = &c.extends {
                    out.push(("extends".to_string(), ext));
                }
                if let Some(simple) = &c.simple_type {
                    out.push(("Simple".to_string(), simple));
                }
                for facet in &c.facets {
                    facet.members.collect(facet.kind.suffix(), &mut out);
                }
            }
            Self::Service(s) => {
                for op in &s.operations {
                    op.request.collect(&format!("{}/request", op.name), &mut out);
                    op.response.collect(&format!("{}/response", op.name), &mut out);
                    if let Some(n) = &op.notification {
                        n.collect(&format!("{}/notification", op.name), &mut out);
                    }
                }
            }
            Self::ExtensionPoint(x) => {
                out.push(("extends".to_string(), &x.extends));
                x.members.collect("members", &mut out);
            }
            Self::Xsd(_) => {}
        }
        out
    }

    /// Mutable counterpart of [`slots`](Self::slots), same order and paths.
    pub fn slots_mut(&mut self) -> Vec<(String, &mut RefSlot)> {
        let mut out = Vec::new();
        match self {
            Self::Simple(s) => out.push(("parent".to_string(), &mut s.parent)),
            Self::Enumeration(e) => {
                if let Some(ext) = &mut e.extends {
                    out.push(("extends".to_string(), ext));
                }
            }
            Self::ValueWithAttributes(v) => {
                out.push(("parent".to_string(), &mut v.parent));
                for a in &mut v.attributes {
                    out.push((format!("@{}", a.name), &mut a.type_ref));
                }
            }
            Self::Core(c) | Self::Business(c) | Self::Choice(c) => {
                if let Some(ext) = &mut c.extends {
                    out.push(("extends".to_string(), ext));
                }
                if let Some(simple) = &mut c.simple_type {
                    out.push(("Simple".to_string(), simple));
                }
                for facet in &mut c.facets {
                    let path = facet.kind.suffix();
                    facet.members.collect_mut(path, &mut out);
                }
            }
            Self::Service(s) => {
                for op in &mut s.operations {
                    let name = op.name.clone();
                    op.request.collect_mut(&format!("{name}/request"), &mut out);
                    op.response.collect_mut(&format!("{name}/response"), &mut out);
                    if let Some(n) = &mut op.notification {
                        n.collect_mut(&format!("{name}/notification"), &mut out);
                    }
                }
            }
            Self::ExtensionPoint(x) => {
                out.push(("extends".to_string(), &mut x.extends));
                x.members.collect_mut("members", &mut out);
            }
            Self::Xsd(_) => {}
        }
        out
    }
}

// ============================================================================
// ENTITY
// ============================================================================

/// Detached entity content, produced by transformers before the entity is
/// attached to a library.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityDef {
    pub name: SmolStr,
    pub documentation: Option<String>,
    pub body: EntityBody,
}

impl EntityDef {
    pub fn new(name: impl Into<SmolStr>, body: EntityBody) -> Self {
        Self {
            name: name.into(),
            documentation: None,
            body,
        }
    }

    pub fn with_documentation(mut self, doc: impl Into<String>) -> Self {
        self.documentation = Some(doc.into());
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.body.kind()
    }
}

/// A named member of a library, owned by the [`Model`](super::Model) arena.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    id: EntityId,
    library: LibraryId,
    pub name: SmolStr,
    pub documentation: Option<String>,
    pub body: EntityBody,
}

impl Entity {
    pub(crate) fn attach(id: EntityId, library: LibraryId, def: EntityDef) -> Self {
        Self {
            id,
            library,
            name: def.name,
            documentation: def.documentation,
            body: def.body,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The owning library.
    pub fn library(&self) -> LibraryId {
        self.library
    }

    pub fn kind(&self) -> EntityKind {
        self.body.kind()
    }

    /// Detach the content, e.g. for cloning into another library.
    pub fn to_def(&self) -> EntityDef {
        EntityDef {
            name: self.name.clone(),
            documentation: self.documentation.clone(),
            body: self.body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotel() -> EntityBody {
        EntityBody::Core(
            ComplexType::default()
                .with_facet(
                    Facet::new(FacetKind::Summary)
                        .with_attribute(Attribute::new("code", "xsd:string"))
                        .with_element(Element::new("Address", "adr:Address")),
                )
                .extending("Lodging"),
        )
    }

    #[test]
    fn test_slot_paths_in_declaration_order() {
        let body = hotel();
        let paths: Vec<_> = body.slots().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["extends", "Summary/@code", "Summary/Address"]);
    }

    #[test]
    fn test_slots_mut_matches_slots() {
        let mut body = hotel();
        let names: Vec<String> = body.slots().iter().map(|(_, s)| s.name().to_string()).collect();
        let mut_names: Vec<String> = body
            .slots_mut()
            .iter()
            .map(|(_, s)| s.name().to_string())
            .collect();
        assert_eq!(names, mut_names);
    }

    #[test]
    fn test_retarget_drops_resolution() {
        let mut slot = RefSlot::new(SlotCategory::ElementType, "A");
        slot.set_resolved(EntityRef::entity(EntityId::new(0)));
        slot.retarget("B");
        assert_eq!(slot.name(), "B");
        assert!(!slot.is_resolved());
    }

    #[test]
    fn test_category_accepts() {
        use EntityKind::*;
        assert!(SlotCategory::ParentType.accepts(SimpleType, XsdSimple, None));
        assert!(!SlotCategory::ParentType.accepts(SimpleType, CoreObject, None));
        assert!(SlotCategory::ElementType.accepts(CoreObject, CoreObject, Some(FacetKind::Summary)));
        assert!(!SlotCategory::ElementType.accepts(CoreObject, CoreObject, Some(FacetKind::Simple)));
        assert!(SlotCategory::AttributeType.accepts(ValueWithAttributes, CoreObject, Some(FacetKind::Simple)));
        assert!(SlotCategory::Extension.accepts(BusinessObject, BusinessObject, None));
        assert!(!SlotCategory::Extension.accepts(BusinessObject, CoreObject, None));
        assert!(SlotCategory::ExtensionPoint.accepts(ExtensionPoint, CoreObject, Some(FacetKind::Detail)));
        assert!(!SlotCategory::ExtensionPoint.accepts(ExtensionPoint, CoreObject, None));
    }

    #[test]
    fn test_derived_facet_name() {
        assert_eq!(FacetKind::Summary.derived_name("Hotel"), "Hotel_Summary");
        assert_eq!(FacetKind::from_suffix("ID"), Some(FacetKind::Id));
    }
}
