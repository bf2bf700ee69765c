//! Dialect transformation through the registry.

use rstest::rstest;

use modelweave::diagnostics::codes;
use modelweave::host::ModelHost;
use modelweave::model::{
    Attribute, ComplexType, Element, EntityBody, EntityDef, Facet, FacetKind, LibraryDef, SimpleType,
};
use modelweave::symbols::FacetDerivationFactory;
use modelweave::transform::{WireKind, v14, v16};
use modelweave::{Dialect, LibraryId, Model, SymbolTable, TransformerRegistry, WireDocument};

use crate::helpers::fixtures::{COMMON_NS, COMMON_V14, HOTEL_NS, HOTEL_V16};
use crate::helpers::model_helpers::{common_document, hotel_document, model_with, simple};

fn member_kinds(document: &WireDocument) -> Vec<WireKind> {
    match document {
        WireDocument::V14(lib) => lib.members.iter().map(v14::wire_kind).collect(),
        WireDocument::V16(lib) => lib.members.iter().map(v16::wire_kind).collect(),
    }
}

fn library_named(model: &Model, name: &str) -> LibraryId {
    model
        .libraries()
        .find(|l| l.name == name)
        .map(|l| l.id())
        .expect("library should be loaded")
}

/// Host with both fixture libraries loaded and resolved.
fn loaded_host() -> ModelHost {
    let mut host = ModelHost::new();
    host.add_document(&common_document(), None).unwrap();
    host.add_document(&hotel_document(), None).unwrap();
    let findings = host.resolve();
    assert!(!findings.has_errors(), "fixtures should resolve: {findings:?}");
    host
}

fn emit(host: &ModelHost, id: LibraryId, dialect: Dialect, strict: bool) -> WireDocument {
    let table = SymbolTable::build_all(host.model(), &FacetDerivationFactory);
    host.transformers()
        .emit_library(host.model(), id, dialect, Some(&table), strict)
        .expect("emission should succeed")
        .document
}

#[rstest]
#[case::current(HOTEL_V16, "Hotel")]
#[case::legacy(COMMON_V14, "Common")]
fn test_round_trip_preserves_members(#[case] source: &str, #[case] name: &str) {
    let original = WireDocument::from_json(source).unwrap();
    let host = loaded_host();
    let id = library_named(host.model(), name);

    let emitted = emit(&host, id, original.dialect(), true);

    assert_eq!(emitted.dialect(), original.dialect());
    assert_eq!(emitted.namespace(), original.namespace());
    assert_eq!(emitted.prefix(), original.prefix());
    assert_eq!(emitted.member_names(), original.member_names());
    assert_eq!(member_kinds(&emitted), member_kinds(&original));
}

type MemberSummary = (String, modelweave::model::EntityKind, Vec<String>);

#[rstest]
#[case::current("Hotel")]
#[case::legacy("Common")]
fn test_model_round_trip_keeps_slot_names(#[case] name: &str) {
    let host = loaded_host();
    let id = library_named(host.model(), name);
    let dialect = host.model().library(id).unwrap().dialect.unwrap();
    let emitted = emit(&host, id, dialect, true);

    let reloaded = host.transformers().load_document(&emitted, None).unwrap().library;

    let before: Vec<MemberSummary> = host
        .model()
        .members(id)
        .map(|e| {
            let slots = e.body.slots().into_iter().map(|(_, s)| s.name().to_string()).collect();
            (e.name.to_string(), e.kind(), slots)
        })
        .collect();
    let after: Vec<MemberSummary> = reloaded
        .entities
        .iter()
        .map(|e| {
            let slots = e.body.slots().into_iter().map(|(_, s)| s.name().to_string()).collect();
            (e.name.to_string(), e.kind(), slots)
        })
        .collect();
    assert_eq!(reloaded.namespace.as_deref(), host.model().library(id).unwrap().namespace());
    assert_eq!(after, before);
}

#[test]
fn test_round_trip_keeps_reference_names_as_written() {
    let host = loaded_host();
    let emitted = emit(&host, library_named(host.model(), "Hotel"), Dialect::V1_6, true);
    let WireDocument::V16(lib) = emitted else {
        panic!("expected a 1.6 document");
    };

    let Some(v16::Member::BusinessObject(room)) = lib.members.iter().find(|m| m.name() == "Room") else {
        panic!("Room should be a business object");
    };
    let summary = room.facets.iter().find(|f| f.facet == v16::FacetTag::Summary).unwrap();
    assert_eq!(summary.elements[0].type_ref, "cmn:Amount");
    assert_eq!(summary.elements[0].repeat, 0);

    let Some(v16::Member::Service(booking)) = lib.members.iter().find(|m| m.name() == "Booking") else {
        panic!("Booking should be a service");
    };
    assert_eq!(booking.operations[0].request.elements[0].type_ref, "Room_ID");
    assert_eq!(booking.operations[0].response.elements[0].type_ref, "Room_Summary");
}

#[test]
fn test_legacy_library_emits_in_current_dialect() {
    let host = loaded_host();
    let emitted = emit(&host, library_named(host.model(), "Common"), Dialect::V1_6, true);

    assert_eq!(emitted.namespace(), COMMON_NS);
    assert_eq!(
        member_kinds(&emitted),
        vec![WireKind::SimpleType, WireKind::CoreObject, WireKind::Enumeration]
    );
    let WireDocument::V16(lib) = emitted else {
        panic!("expected a 1.6 document");
    };
    let Some(v16::Member::Enumeration(country)) = lib.members.iter().find(|m| m.name() == "Country") else {
        panic!("Country should be an enumeration");
    };
    assert!(!country.open);
    assert_eq!(country.values[1].label.as_deref(), Some("Germany"));
}

#[test]
fn test_legacy_enumeration_kinds_follow_open_flag() {
    let json = r#"{
        "Dialect": "1.4",
        "Name": "Codes",
        "Namespace": "http://example.org/ns/codes/v1",
        "Prefix": "cd",
        "Members": [
            { "Kind": "OpenEnumeration", "Name": "Meal", "Literals": [ { "Value": "Breakfast" } ] },
            { "Kind": "ClosedEnumeration", "Name": "Bed", "Literals": [ { "Value": "King" } ] }
        ]
    }"#;
    let mut host = ModelHost::new();
    let id = host.add_document(&WireDocument::from_json(json).unwrap(), None).unwrap();

    let open: Vec<bool> = host
        .model()
        .members(id)
        .map(|e| match &e.body {
            EntityBody::Enumeration(en) => en.open,
            other => panic!("unexpected body {other:?}"),
        })
        .collect();
    assert_eq!(open, vec![true, false]);

    let emitted = emit(&host, id, Dialect::V1_4, true);
    assert_eq!(
        member_kinds(&emitted),
        vec![WireKind::OpenEnumeration, WireKind::ClosedEnumeration]
    );
}

fn choice_model() -> (Model, LibraryId) {
    let shared = Facet::new(FacetKind::Shared).with_element(Element::new("Cash", "Cash"));
    let model = model_with(vec![
        LibraryDef::user("Payments", "http://example.org/ns/pay/v1", "pay")
            .with_entity(simple("Code", "Code"))
            .with_entity(EntityDef::new(
                "Payment",
                EntityBody::Choice(ComplexType::default().with_facet(shared)),
            )),
    ]);
    let id = model.library_ids()[1];
    (model, id)
}

#[test]
fn test_choice_object_unavailable_in_legacy_dialect_when_strict() {
    let (model, id) = choice_model();
    let registry = TransformerRegistry::with_defaults();

    let err = registry
        .emit_library(&model, id, Dialect::V1_4, None, true)
        .unwrap_err();
    assert!(err.is_unavailable(), "unexpected error: {err}");
}

#[test]
fn test_choice_object_skipped_with_finding_when_lenient() {
    let (model, id) = choice_model();
    let registry = TransformerRegistry::with_defaults();

    let outcome = registry
        .emit_library(&model, id, Dialect::V1_4, None, false)
        .unwrap();
    assert_eq!(outcome.document.member_names(), vec!["Code"]);
    let unavailable = outcome.findings.with_code(codes::TRANSFORM_UNAVAILABLE);
    assert_eq!(unavailable.len(), 1);
    assert_eq!(unavailable[0].entity.as_deref(), Some("Payment"));

    let current = registry
        .emit_library(&model, id, Dialect::V1_6, None, true)
        .unwrap();
    assert_eq!(current.document.member_names(), vec!["Code", "Payment"]);
}

#[test]
fn test_legacy_emit_reports_content_it_drops() {
    let mut code = SimpleType::new("Code");
    code.list = true;
    let rate = ComplexType::default()
        .with_facet(Facet::new(FacetKind::Id).with_attribute(Attribute::new("id", "Code")))
        .with_facet(Facet::new(FacetKind::Summary).with_attribute(Attribute::new("amount", "Code")))
        .with_facet(Facet::new(FacetKind::Shared).with_element(Element::new("Note", "Code")));
    let model = model_with(vec![
        LibraryDef::user("Rates", "http://example.org/ns/rates/v1", "rt")
            .with_entity(EntityDef::new("Code", EntityBody::Simple(code)))
            .with_entity(EntityDef::new("Rate", EntityBody::Core(rate))),
    ]);
    let id = model.library_ids()[1];
    let registry = TransformerRegistry::with_defaults();

    let legacy = registry
        .emit_library(&model, id, Dialect::V1_4, None, true)
        .unwrap();
    assert_eq!(legacy.document.member_names(), vec!["Code", "Rate"]);
    let dropped: Vec<(Option<&str>, bool)> = legacy
        .findings
        .with_code(codes::LOSSY_EMIT)
        .iter()
        .map(|f| (f.entity.as_deref(), f.message.contains("facet")))
        .collect();
    assert_eq!(
        dropped,
        vec![(Some("Code"), false), (Some("Rate"), true), (Some("Rate"), true)]
    );

    let current = registry
        .emit_library(&model, id, Dialect::V1_6, None, true)
        .unwrap();
    assert!(current.findings.with_code(codes::LOSSY_EMIT).is_empty());
}

#[test]
fn test_host_reports_only_cross_library_forward_declarations() {
    let mut host = ModelHost::new();
    host.add_document(&hotel_document(), None).unwrap();

    let forward: Vec<&str> = host
        .forward_declarations()
        .iter()
        .map(|(_, d)| d.name.as_str())
        .collect();
    assert_eq!(forward, vec!["cmn:Amount"]);
    assert_eq!(host.findings().with_code(codes::FORWARD_DECLARATION).len(), 1);

    host.add_document(&common_document(), None).unwrap();
    assert!(!host.resolve().has_errors());
    assert!(host.model().find_entity(HOTEL_NS, "Room").is_some());
}
