//! Model → `1.6` wire tree.

use crate::model::{
    self, ComplexType, EntityBody, EntityKind, FacetKind, LibraryStatus, MemberSet,
};
use crate::symbols::NameContext;
use crate::transform::context::TransformContext;
use crate::transform::error::TransformError;
use crate::transform::node::{Node, NodeKind, NodeRef, WireKind};

use super::wire;

pub(super) fn library(node: NodeRef<'_>, ctx: &mut TransformContext<'_>) -> Result<Node, TransformError> {
    let NodeRef::Library(lib) = node else {
        return Err(TransformError::unexpected("model library", node.describe()));
    };
    let model = ctx.model()?;
    ctx.set_names(NameContext::from_library(lib));

    let mut members = Vec::with_capacity(lib.members().len());
    for entity in model.members(lib.id()) {
        let target = NodeKind::Wire(wire_kind_for(entity.kind()));
        if let Some(out) = ctx.transform_member(NodeRef::Entity(entity), target)? {
            members.push(out.into_v16_member()?);
        }
    }

    Ok(Node::V16Library(wire::Library {
        name: lib.name.to_string(),
        namespace: lib.namespace().unwrap_or_default().to_string(),
        prefix: lib.prefix.to_string(),
        version: lib.version.map(|v| v.to_string()),
        status: status(lib.status().unwrap_or_default()),
        imports: lib
            .imports
            .iter()
            .map(|i| wire::Import {
                prefix: i.prefix.to_string(),
                namespace: i.namespace.clone(),
                file_hints: i.file_hints.clone(),
            })
            .collect(),
        includes: lib.includes.clone(),
        comments: lib.comments.clone(),
        checksum: lib.checksum().map(str::to_string),
        members,
    }))
}

pub(super) fn member(node: NodeRef<'_>, ctx: &mut TransformContext<'_>) -> Result<Node, TransformError> {
    let NodeRef::Entity(entity) = node else {
        return Err(TransformError::unexpected("model entity", node.describe()));
    };
    let name = entity.name.to_string();
    let documentation = entity.documentation.clone();

    let member = match &entity.body {
        EntityBody::Simple(s) => wire::Member::SimpleType(wire::SimpleType {
            name,
            type_ref: ctx.render(&s.parent)?,
            pattern: s.pattern.clone(),
            min_length: s.min_length,
            max_length: s.max_length,
            list: s.list,
            documentation,
        }),
        EntityBody::Enumeration(e) => wire::Member::Enumeration(wire::Enumeration {
            name,
            open: e.open,
            extends: ctx.render_optional(e.extends.as_ref())?,
            values: e
                .values
                .iter()
                .map(|v| wire::EnumValue {
                    literal: v.literal.to_string(),
                    label: v.label.clone(),
                })
                .collect(),
            documentation,
        }),
        EntityBody::ValueWithAttributes(v) => wire::Member::ValueWithAttributes(wire::ValueWithAttributes {
            name,
            type_ref: ctx.render(&v.parent)?,
            attributes: v
                .attributes
                .iter()
                .map(|a| attribute(ctx, a))
                .collect::<Result<_, _>>()?,
            indicators: v.indicators.iter().map(indicator).collect(),
            documentation,
        }),
        EntityBody::Core(c) => wire::Member::CoreObject(complex(ctx, name, c, documentation)?),
        EntityBody::Business(c) => wire::Member::BusinessObject(complex(ctx, name, c, documentation)?),
        EntityBody::Choice(c) => wire::Member::ChoiceObject(complex(ctx, name, c, documentation)?),
        EntityBody::Service(s) => wire::Member::Service(wire::Service {
            name,
            operations: s
                .operations
                .iter()
                .map(|op| -> Result<wire::Operation, TransformError> {
                    Ok(wire::Operation {
                        name: op.name.to_string(),
                        request: members(ctx, &op.request)?,
                        response: members(ctx, &op.response)?,
                        notification: op.notification.as_ref().map(|n| members(ctx, n)).transpose()?,
                    })
                })
                .collect::<Result<_, _>>()?,
            documentation,
        }),
        EntityBody::ExtensionPoint(x) => wire::Member::ExtensionPoint(wire::ExtensionPoint {
            name,
            type_ref: ctx.render(&x.extends)?,
            members: members(ctx, &x.members)?,
            documentation,
        }),
        EntityBody::Xsd(_) => {
            return Err(TransformError::unexpected("user entity", "schema type"));
        }
    };
    Ok(Node::V16Member(member))
}

fn wire_kind_for(kind: EntityKind) -> WireKind {
    match kind {
        EntityKind::SimpleType | EntityKind::XsdSimple => WireKind::SimpleType,
        EntityKind::Enumeration => WireKind::Enumeration,
        EntityKind::ValueWithAttributes => WireKind::ValueWithAttributes,
        EntityKind::CoreObject | EntityKind::XsdComplex => WireKind::CoreObject,
        EntityKind::BusinessObject => WireKind::BusinessObject,
        EntityKind::ChoiceObject => WireKind::ChoiceObject,
        EntityKind::Service => WireKind::Service,
        EntityKind::ExtensionPoint => WireKind::ExtensionPoint,
    }
}

fn status(status: LibraryStatus) -> wire::Status {
    match status {
        LibraryStatus::Draft => wire::Status::Draft,
        LibraryStatus::UnderReview => wire::Status::UnderReview,
        LibraryStatus::Final => wire::Status::Final,
        LibraryStatus::Obsolete => wire::Status::Obsolete,
    }
}

fn complex(
    ctx: &TransformContext<'_>,
    name: String,
    c: &ComplexType,
    documentation: Option<String>,
) -> Result<wire::ComplexObject, TransformError> {
    let mut facets = Vec::with_capacity(c.facets.len());
    for facet in &c.facets {
        let tag = match facet.kind {
            FacetKind::Id => wire::FacetTag::Id,
            FacetKind::Summary => wire::FacetTag::Summary,
            FacetKind::Detail => wire::FacetTag::Detail,
            FacetKind::Shared => wire::FacetTag::Shared,
            // The simple facet is carried by `Simple`.
            FacetKind::Simple => continue,
        };
        let set = members(ctx, &facet.members)?;
        facets.push(wire::Facet {
            facet: tag,
            attributes: set.attributes,
            elements: set.elements,
            indicators: set.indicators,
        });
    }
    Ok(wire::ComplexObject {
        name,
        extends: ctx.render_optional(c.extends.as_ref())?,
        simple: ctx.render_optional(c.simple_type.as_ref())?,
        aliases: c.aliases.iter().map(|a| a.to_string()).collect(),
        facets,
        documentation,
    })
}

fn members(ctx: &TransformContext<'_>, set: &MemberSet) -> Result<wire::Members, TransformError> {
    Ok(wire::Members {
        attributes: set
            .attributes
            .iter()
            .map(|a| attribute(ctx, a))
            .collect::<Result<_, _>>()?,
        elements: set
            .elements
            .iter()
            .map(|e| -> Result<wire::Element, TransformError> {
                Ok(wire::Element {
                    name: e.name.to_string(),
                    type_ref: ctx.render(&e.type_ref)?,
                    mandatory: e.mandatory,
                    repeat: e.repeat,
                    documentation: e.documentation.clone(),
                })
            })
            .collect::<Result<_, _>>()?,
        indicators: set.indicators.iter().map(indicator).collect(),
    })
}

fn attribute(ctx: &TransformContext<'_>, a: &model::Attribute) -> Result<wire::Attribute, TransformError> {
    Ok(wire::Attribute {
        name: a.name.to_string(),
        type_ref: ctx.render(&a.type_ref)?,
        mandatory: a.mandatory,
        documentation: a.documentation.clone(),
    })
}

fn indicator(i: &model::Indicator) -> wire::Indicator {
    wire::Indicator {
        name: i.name.to_string(),
        publish_as_element: i.publish_as_element,
    }
}
