//! The legacy `1.4` dialect: wire tree and transformers in both directions.
//!
//! Enumerations map to two wire kinds depending on their open flag, so the
//! model → wire direction registers two pairs for one entity kind. Choice
//! objects have no pair at all.

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
        Member::Simple(_) => WireKind::SimpleType,
        Member::ClosedEnumeration(_) => WireKind::ClosedEnumeration,
        Member::OpenEnumeration(_) => WireKind::OpenEnumeration,
        Member::ValueWithAttributes(_) => WireKind::ValueWithAttributes,
        Member::CoreObject(_) => WireKind::CoreObject,
        Member::BusinessObject(_) => WireKind::BusinessObject,
        Member::Service(_) => WireKind::Service,
        Member::ExtensionPoint(_) => WireKind::ExtensionPoint,
    }
}

const PAIRS: &[(EntityKind, WireKind)] = &[
    (EntityKind::SimpleType, WireKind::SimpleType),
    (EntityKind::Enumeration, WireKind::ClosedEnumeration),
    (EntityKind::Enumeration, WireKind::OpenEnumeration),
    (EntityKind::ValueWithAttributes, WireKind::ValueWithAttributes),
    (EntityKind::CoreObject, WireKind::CoreObject),
    (EntityKind::BusinessObject, WireKind::BusinessObject),
    (EntityKind::Service, WireKind::Service),
    (EntityKind::ExtensionPoint, WireKind::ExtensionPoint),
];

pub(crate) fn register(registry: &mut TransformerRegistry) {
    let load = FactorySetId::to_model(Dialect::V1_4);
    let save = FactorySetId::to_wire(Dialect::V1_4);
    let library = NodeKind::Wire(WireKind::Library);

    registry.register(library, NodeKind::Library, load, Arc::new(to_model::library));
    registry.register(NodeKind::Library, library, save, Arc::new(from_model::library));

    for (entity, wire) in PAIRS {
        let (entity, wire) = (NodeKind::Entity(*entity), NodeKind::Wire(*wire));
        registry.register(wire, entity, load, Arc::new(to_model::member));
        registry.register(entity, wire, save, Arc::new(from_model::member));
    }
}
