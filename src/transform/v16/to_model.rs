//! `1.6` wire tree → model definitions.

use crate::base::{Dialect, Version};
use crate::model::{
    self, ComplexType, EntityBody, EntityDef, EntityKind, FacetKind, LibraryDef, LibraryKind,
    LibraryStatus, MemberSet, NamespaceImport, SlotCategory,
};
use crate::symbols::NameContext;
use crate::transform::context::TransformContext;
use crate::transform::error::TransformError;
use crate::transform::node::{Node, NodeKind, NodeRef};

use super::wire;

pub(super) fn library(node: NodeRef<'_>, ctx: &mut TransformContext<'_>) -> Result<Node, TransformError> {
    let NodeRef::V16Library(lib) = node else {
        return Err(TransformError::unexpected("1.6 library", node.describe()));
    };

    let namespace = (!lib.namespace.is_empty()).then(|| lib.namespace.clone());
    let version = lib
        .version
        .as_deref()
        .map(|v| v.parse::<Version>().map_err(|_| TransformError::invalid("version", v)))
        .transpose()?;

    let mut names = NameContext::new(namespace.as_deref(), lib.prefix.as_str());
    for import in &lib.imports {
        names = names.with_import(import.prefix.as_str(), &import.namespace);
    }
    ctx.set_names(names);

    let mut def = LibraryDef::user(lib.name.as_str(), String::new(), lib.prefix.as_str());
    def.namespace = namespace;
    def.version = version;
    def.kind = LibraryKind::User {
        status: status(lib.status),
        checksum: lib.checksum.clone(),
    };
    def.imports = lib
        .imports
        .iter()
        .map(|i| NamespaceImport {
            prefix: i.prefix.as_str().into(),
            namespace: i.namespace.clone(),
            file_hints: i.file_hints.clone(),
        })
        .collect();
    def.includes = lib.includes.clone();
    def.comments = lib.comments.clone();
    def.dialect = Some(Dialect::V1_6);

    for member in &lib.members {
        let target = NodeKind::Entity(entity_kind(member));
        if let Some(out) = ctx.transform_member(NodeRef::V16Member(member), target)? {
            def.entities.push(out.into_entity_def()?);
        }
    }
    Ok(Node::LibraryDef(def))
}

pub(super) fn member(node: NodeRef<'_>, ctx: &mut TransformContext<'_>) -> Result<Node, TransformError> {
    let NodeRef::V16Member(member) = node else {
        return Err(TransformError::unexpected("1.6 member", node.describe()));
    };
    ctx.enter(member.name());

    let (body, documentation) = match member {
        wire::Member::SimpleType(m) => (
            EntityBody::Simple(model::SimpleType {
                parent: ctx.reference(SlotCategory::ParentType, &m.type_ref),
                pattern: m.pattern.clone(),
                min_length: m.min_length,
                max_length: m.max_length,
                list: m.list,
            }),
            &m.documentation,
        ),
        wire::Member::Enumeration(m) => (
            EntityBody::Enumeration(model::Enumeration {
                open: m.open,
                extends: ctx.optional_reference(SlotCategory::Extension, m.extends.as_deref()),
                values: m
                    .values
                    .iter()
                    .map(|v| model::EnumValue {
                        literal: v.literal.as_str().into(),
                        label: v.label.clone(),
                    })
                    .collect(),
            }),
            &m.documentation,
        ),
        wire::Member::ValueWithAttributes(m) => (
            EntityBody::ValueWithAttributes(model::ValueWithAttributes {
                parent: ctx.reference(SlotCategory::AttributeType, &m.type_ref),
                attributes: m.attributes.iter().map(|a| attribute(ctx, a)).collect(),
                indicators: m.indicators.iter().map(indicator).collect(),
            }),
            &m.documentation,
        ),
        wire::Member::CoreObject(m) => (EntityBody::Core(complex(ctx, m)), &m.documentation),
        wire::Member::BusinessObject(m) => (EntityBody::Business(complex(ctx, m)), &m.documentation),
        wire::Member::ChoiceObject(m) => (EntityBody::Choice(complex(ctx, m)), &m.documentation),
        wire::Member::Service(m) => (
            EntityBody::Service(model::Service {
                operations: m
                    .operations
                    .iter()
                    .map(|op| model::Operation {
                        name: op.name.as_str().into(),
                        request: members(ctx, &op.request),
                        response: members(ctx, &op.response),
                        notification: op.notification.as_ref().map(|n| members(ctx, n)),
                    })
                    .collect(),
            }),
            &m.documentation,
        ),
        wire::Member::ExtensionPoint(m) => (
            EntityBody::ExtensionPoint(model::ExtensionPoint {
                extends: ctx.reference(SlotCategory::ExtensionPoint, &m.type_ref),
                members: members(ctx, &m.members),
            }),
            &m.documentation,
        ),
    };

    let mut def = EntityDef::new(member.name(), body);
    def.documentation = documentation.clone();
    Ok(Node::EntityDef(def))
}

fn entity_kind(member: &wire::Member) -> EntityKind {
    match member {
        wire::Member::SimpleType(_) => EntityKind::SimpleType,
        wire::Member::Enumeration(_) => EntityKind::Enumeration,
        wire::Member::ValueWithAttributes(_) => EntityKind::ValueWithAttributes,
        wire::Member::CoreObject(_) => EntityKind::CoreObject,
        wire::Member::BusinessObject(_) => EntityKind::BusinessObject,
        wire::Member::ChoiceObject(_) => EntityKind::ChoiceObject,
        wire::Member::Service(_) => EntityKind::Service,
        wire::Member::ExtensionPoint(_) => EntityKind::ExtensionPoint,
    }
}

fn status(status: wire::Status) -> LibraryStatus {
    match status {
        wire::Status::Draft => LibraryStatus::Draft,
        wire::Status::UnderReview => LibraryStatus::UnderReview,
        wire::Status::Final => LibraryStatus::Final,
        wire::Status::Obsolete => LibraryStatus::Obsolete,
    }
}

fn facet_kind(tag: wire::FacetTag) -> FacetKind {
    match tag {
        wire::FacetTag::Id => FacetKind::Id,
        wire::FacetTag::Summary => FacetKind::Summary,
        wire::FacetTag::Detail => FacetKind::Detail,
        wire::FacetTag::Shared => FacetKind::Shared,
    }
}

fn complex(ctx: &mut TransformContext<'_>, m: &wire::ComplexObject) -> ComplexType {
    ComplexType {
        extends: ctx.optional_reference(SlotCategory::Extension, m.extends.as_deref()),
        simple_type: ctx.optional_reference(SlotCategory::AttributeType, m.simple.as_deref()),
        facets: m
            .facets
            .iter()
            .map(|f| model::Facet {
                kind: facet_kind(f.facet),
                members: MemberSet {
                    attributes: f.attributes.iter().map(|a| attribute(ctx, a)).collect(),
                    elements: f.elements.iter().map(|e| element(ctx, e)).collect(),
                    indicators: f.indicators.iter().map(indicator).collect(),
                },
            })
            .collect(),
        aliases: m.aliases.iter().map(|a| a.as_str().into()).collect(),
    }
}

fn members(ctx: &mut TransformContext<'_>, m: &wire::Members) -> MemberSet {
    MemberSet {
        attributes: m.attributes.iter().map(|a| attribute(ctx, a)).collect(),
        elements: m.elements.iter().map(|e| element(ctx, e)).collect(),
        indicators: m.indicators.iter().map(indicator).collect(),
    }
}

fn attribute(ctx: &mut TransformContext<'_>, a: &wire::Attribute) -> model::Attribute {
    model::Attribute {
        name: a.name.as_str().into(),
        type_ref: ctx.reference(SlotCategory::AttributeType, &a.type_ref),
        mandatory: a.mandatory,
        documentation: a.documentation.clone(),
    }
}

fn element(ctx: &mut TransformContext<'_>, e: &wire::Element) -> model::Element {
    model::Element {
        name: e.name.as_str().into(),
        type_ref: ctx.reference(SlotCategory::ElementType, &e.type_ref),
        mandatory: e.mandatory,
        repeat: e.repeat,
        documentation: e.documentation.clone(),
    }
}

fn indicator(i: &wire::Indicator) -> model::Indicator {
    model::Indicator {
        name: i.name.as_str().into(),
        publish_as_element: i.publish_as_element,
    }
}
