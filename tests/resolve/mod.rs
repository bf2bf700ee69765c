//! Reference resolution over whole models.

use modelweave::base::constants::XSD_NAMESPACE;
use modelweave::diagnostics::codes;
use modelweave::model::{
    Attribute, ComplexType, Element, EntityBody, EntityDef, EntityRef, EnumValue, Enumeration,
    Facet, FacetKind, LibraryDef, LibraryStatus,
};
use modelweave::symbols::FacetDerivationFactory;
use modelweave::{Model, ReferenceResolver, SymbolTable};

use crate::helpers::model_helpers::{model_with, simple, simple_library};

const NS: &str = "http://example.org/ns/hotel/v1";
const OTHER_NS: &str = "http://example.org/ns/common/v1";

fn parent_of(model: &Model, namespace: &str, name: &str) -> Option<EntityRef> {
    let entity = model.find_entity(namespace, name)?;
    match &entity.body {
        EntityBody::Simple(s) => s.parent.resolved(),
        _ => None,
    }
}

fn id_of(model: &Model, namespace: &str, name: &str) -> modelweave::EntityId {
    model.find_entity(namespace, name).expect("entity should exist").id()
}

#[test]
fn test_mutual_cycle_resolves() {
    let mut model = model_with(vec![
        LibraryDef::user("Hotel", NS, "htl")
            .with_entity(simple("A", "B"))
            .with_entity(simple("B", "A")),
    ]);
    let findings = ReferenceResolver::resolve_all(&mut model, &FacetDerivationFactory);

    assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    assert_eq!(parent_of(&model, NS, "A").map(|r| r.entity), Some(id_of(&model, NS, "B")));
    assert_eq!(parent_of(&model, NS, "B").map(|r| r.entity), Some(id_of(&model, NS, "A")));
}

#[test]
fn test_self_reference_resolves_to_itself() {
    let mut model = model_with(vec![LibraryDef::user("Hotel", NS, "htl").with_entity(simple("A", "A"))]);
    let findings = ReferenceResolver::resolve_all(&mut model, &FacetDerivationFactory);

    assert!(findings.is_empty());
    assert_eq!(parent_of(&model, NS, "A").map(|r| r.entity), Some(id_of(&model, NS, "A")));
}

#[test]
fn test_declaration_order_does_not_matter() {
    let mut model = model_with(vec![
        LibraryDef::user("Hotel", NS, "htl")
            .with_import("xsd", XSD_NAMESPACE)
            .with_entity(simple("Early", "Late"))
            .with_entity(simple("Late", "xsd:string"))
            .with_entity(simple("Broken", "Missing")),
    ]);
    let findings = ReferenceResolver::resolve_all(&mut model, &FacetDerivationFactory);

    let unresolved = findings.with_code(codes::UNRESOLVED_REFERENCE);
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].entity.as_deref(), Some("Broken"));
    assert!(parent_of(&model, NS, "Early").is_some());
    assert!(parent_of(&model, NS, "Broken").is_none());
}

#[test]
fn test_unresolved_reference_keeps_slot_name() {
    let mut model = model_with(vec![LibraryDef::user("Hotel", NS, "htl").with_entity(simple("A", "cmn:Nowhere"))]);
    ReferenceResolver::resolve_all(&mut model, &FacetDerivationFactory);

    let entity = model.find_entity(NS, "A").unwrap();
    let EntityBody::Simple(s) = &entity.body else {
        panic!("expected simple type");
    };
    assert_eq!(s.parent.name(), "cmn:Nowhere");
    assert!(!s.parent.is_resolved());
}

#[test]
fn test_duplicate_symbol_keeps_first() {
    let mut model = model_with(vec![
        LibraryDef::user("First", NS, "htl").with_entity(simple("Code", "Code")),
        LibraryDef::user("Second", NS, "htl").with_entity(simple("Code", "Code")),
    ]);
    let findings = ReferenceResolver::resolve_all(&mut model, &FacetDerivationFactory);

    let duplicates = findings.with_code(codes::DUPLICATE_SYMBOL);
    assert_eq!(duplicates.len(), 1);
    assert_eq!(duplicates[0].library.as_deref(), Some("Second"));

    let first = model.library_ids()[1];
    let kept = model.members(first).next().unwrap().id();
    let table = SymbolTable::build_all(&model, &FacetDerivationFactory);
    assert_eq!(table.resolve("Code", first).map(|r| r.entity), Some(kept));
    assert_eq!(table.collisions().len(), 1);
}

#[test]
fn test_kind_mismatch_is_reported() {
    let color = Enumeration {
        open: false,
        extends: None,
        values: vec![EnumValue::new("Red")],
    };
    let mut model = model_with(vec![
        LibraryDef::user("Hotel", NS, "htl")
            .with_entity(EntityDef::new("Color", EntityBody::Enumeration(color)))
            .with_entity(simple("Shade", "Color")),
    ]);
    let findings = ReferenceResolver::resolve_all(&mut model, &FacetDerivationFactory);

    assert_eq!(findings.with_code(codes::KIND_MISMATCH).len(), 1);
    assert!(parent_of(&model, NS, "Shade").is_none());
}

#[test]
fn test_facet_reference_across_libraries() {
    let room = ComplexType::default()
        .with_facet(Facet::new(FacetKind::Summary).with_attribute(Attribute::new("number", "xsd:string")));
    let booking = ComplexType::default()
        .with_facet(Facet::new(FacetKind::Summary).with_element(Element::new("Room", "cmn:Room_Summary")));
    let mut model = model_with(vec![
        LibraryDef::user("Hotel", NS, "htl")
            .with_import("cmn", OTHER_NS)
            .with_entity(EntityDef::new("Booking", EntityBody::Core(booking))),
        LibraryDef::user("Common", OTHER_NS, "cmn")
            .with_import("xsd", XSD_NAMESPACE)
            .with_entity(EntityDef::new("Room", EntityBody::Business(room))),
    ]);
    let findings = ReferenceResolver::resolve_all(&mut model, &FacetDerivationFactory);
    assert!(!findings.has_errors(), "unexpected findings: {findings:?}");

    let booking = model.find_entity(NS, "Booking").unwrap();
    let element = &booking.body.as_complex().unwrap().facets[0].members.elements[0];
    assert_eq!(
        element.type_ref.resolved(),
        Some(EntityRef::facet(id_of(&model, OTHER_NS, "Room"), FacetKind::Summary))
    );
}

#[test]
fn test_stale_handles_are_rebound_after_rename() {
    let mut model = model_with(vec![
        LibraryDef::user("Hotel", NS, "htl")
            .with_import("xsd", XSD_NAMESPACE)
            .with_entity(simple("Base", "xsd:string"))
            .with_entity(simple("Derived", "Base")),
    ]);
    assert!(ReferenceResolver::resolve_all(&mut model, &FacetDerivationFactory).is_empty());

    let base = id_of(&model, NS, "Base");
    model.rename_entity(base, "Renamed").unwrap();
    let findings = ReferenceResolver::resolve_all(&mut model, &FacetDerivationFactory);
    assert_eq!(findings.with_code(codes::UNRESOLVED_REFERENCE).len(), 1);
    assert!(parent_of(&model, NS, "Derived").is_none());
}

#[test]
fn test_library_statuses_do_not_affect_resolution() {
    let mut model = model_with(vec![
        simple_library("Draft", NS, "htl", LibraryStatus::Draft),
        simple_library("Final", OTHER_NS, "cmn", LibraryStatus::Final),
    ]);
    let findings = ReferenceResolver::resolve_all(&mut model, &FacetDerivationFactory);
    assert!(findings.is_empty());
    assert!(parent_of(&model, NS, "DraftCode").is_some());
    assert!(parent_of(&model, OTHER_NS, "FinalCode").is_some());
}

