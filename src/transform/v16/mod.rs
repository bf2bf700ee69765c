//! The current `1.6` dialect: wire tree and transformers in both directions.

mod from_model;
mod to_model;
mod wire;

use std::sync::Arc;

pub use wire::*;

use super::node::{FactorySetId, NodeKind, WireKind};
use super::registry::TransformerRegistry;
use crate::base::Dialect;
use crate::model::EntityKind;

/// Wire kind of a member.
pub fn wire_kind(member: &Member) -> WireKind {
    match member {
        Member::SimpleType(_) => WireKind::SimpleType,
        Member::Enumeration(_) => WireKind::Enumeration,
        Member::ValueWithAttributes(_) => WireKind::ValueWithAttributes,
        Member::CoreObject(_) => WireKind::CoreObject,
        Member::BusinessObject(_) => WireKind::BusinessObject,
        Member::ChoiceObject(_) => WireKind::ChoiceObject,
        Member::Service(_) => WireKind::Service,
        Member::ExtensionPoint(_) => WireKind::ExtensionPoint,
    }
}

/// Entity and wire kinds paired by this dialect.
const PAIRS: &[(EntityKind, WireKind)] = &[
    (EntityKind::SimpleType, WireKind::SimpleType),
    (EntityKind::Enumeration, WireKind::Enumeration),
    (EntityKind::ValueWithAttributes, WireKind::ValueWithAttributes),
    (EntityKind::CoreObject, WireKind::CoreObject),
    (EntityKind::BusinessObject, WireKind::BusinessObject),
    (EntityKind::ChoiceObject, WireKind::ChoiceObject),
    (EntityKind::Service, WireKind::Service),
    (EntityKind::ExtensionPoint, WireKind::ExtensionPoint),
];

pub(crate) fn register(registry: &mut TransformerRegistry) {
    let load = FactorySetId::to_model(Dialect::V1_6);
    let save = FactorySetId::to_wire(Dialect::V1_6);
    let library = NodeKind::Wire(WireKind::Library);

    registry.register(library, NodeKind::Library, load, Arc::new(to_model::library));
    registry.register(NodeKind::Library, library, save, Arc::new(from_model::library));

    for (entity, wire) in PAIRS {
        let (entity, wire) = (NodeKind::Entity(*entity), NodeKind::Wire(*wire));
        registry.register(wire, entity, load, Arc::new(to_model::member));
        registry.register(entity, wire, save, Arc::new(from_model::member));
    }
}
