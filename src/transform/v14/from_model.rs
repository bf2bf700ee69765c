//! Model → `1.4` wire tree.
//!
//! Statuses the legacy dialect does not know collapse onto the nearest
//! one: under-review is still a draft, obsolete is still final. Facets
//! without a field in the legacy layout and the list flag of simple types
//! are left out, each with a lossy-emit warning.

use crate::model::{self, ComplexType, EntityBody, EntityKind, FacetKind, LibraryStatus, MemberSet};
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
        let target = NodeKind::Wire(wire_kind_for(&entity.body));
        if let Some(out) = ctx.transform_member(NodeRef::Entity(entity), target)? {
            members.push(out.into_v14_member()?);
        }
    }

    Ok(Node::V14Library(wire::Library {
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
        EntityBody::Simple(s) => {
            if s.list {
                ctx.dropped(&name, "list flag");
            }
            wire::Member::Simple(wire::Simple {
                name,
                type_name: ctx.render(&s.parent)?,
                pattern: s.pattern.clone(),
                min_length: s.min_length,
                max_length: s.max_length,
                documentation,
            })
        }
        EntityBody::Enumeration(e) => {
            let body = wire::Enumeration {
                name,
                extends: ctx.render_optional(e.extends.as_ref())?,
                literals: e
                    .values
                    .iter()
                    .map(|v| wire::Literal {
                        value: v.literal.to_string(),
                        label: v.label.clone(),
                    })
                    .collect(),
                documentation,
            };
            if e.open {
                wire::Member::OpenEnumeration(body)
            } else {
                wire::Member::ClosedEnumeration(body)
            }
        }
        EntityBody::ValueWithAttributes(v) => wire::Member::ValueWithAttributes(wire::ValueWithAttributes {
            name,
            type_name: ctx.render(&v.parent)?,
            attributes: v
                .attributes
                .iter()
                .map(|a| attribute(ctx, a))
                .collect::<Result<_, _>>()?,
            indicators: v.indicators.iter().map(indicator).collect(),
            documentation,
        }),
        EntityBody::Core(c) => {
            drop_facets(ctx, &name, c, &[FacetKind::Summary, FacetKind::Detail]);
            wire::Member::CoreObject(wire::CoreObject {
                name,
                extends: ctx.render_optional(c.extends.as_ref())?,
                simple: ctx.render_optional(c.simple_type.as_ref())?,
                aliases: aliases(c),
                summary: facet(ctx, c, FacetKind::Summary)?,
                detail: facet(ctx, c, FacetKind::Detail)?,
                documentation,
            })
        }
        EntityBody::Business(c) => {
            drop_facets(ctx, &name, c, &[FacetKind::Id, FacetKind::Summary, FacetKind::Detail]);
            wire::Member::BusinessObject(wire::BusinessObject {
                name,
                extends: ctx.render_optional(c.extends.as_ref())?,
                aliases: aliases(c),
                id: facet(ctx, c, FacetKind::Id)?,
                summary: facet(ctx, c, FacetKind::Summary)?,
                detail: facet(ctx, c, FacetKind::Detail)?,
                documentation,
            })
        }
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
            type_name: ctx.render(&x.extends)?,
            members: members(ctx, &x.members)?,
            documentation,
        }),
        // Only reachable through a registration that is never made.
        EntityBody::Choice(_) => {
            return Err(TransformError::unexpected("1.4 member kind", "choice object"));
        }
        EntityBody::Xsd(_) => {
            return Err(TransformError::unexpected("user entity", "schema type"));
        }
    };
    Ok(Node::V14Member(member))
}

fn wire_kind_for(body: &EntityBody) -> WireKind {
    match body {
        EntityBody::Enumeration(e) if e.open => WireKind::OpenEnumeration,
        EntityBody::Enumeration(_) => WireKind::ClosedEnumeration,
        other => match other.kind() {
            EntityKind::SimpleType | EntityKind::XsdSimple => WireKind::SimpleType,
            EntityKind::ValueWithAttributes => WireKind::ValueWithAttributes,
            EntityKind::CoreObject | EntityKind::XsdComplex => WireKind::CoreObject,
            EntityKind::BusinessObject => WireKind::BusinessObject,
            EntityKind::ChoiceObject => WireKind::ChoiceObject,
            EntityKind::Service => WireKind::Service,
            EntityKind::ExtensionPoint => WireKind::ExtensionPoint,
            EntityKind::Enumeration => WireKind::ClosedEnumeration,
        },
    }
}

fn status(status: LibraryStatus) -> wire::Status {
    match status {
        LibraryStatus::Draft | LibraryStatus::UnderReview => wire::Status::Draft,
        LibraryStatus::Final | LibraryStatus::Obsolete => wire::Status::Final,
    }
}

fn aliases(c: &ComplexType) -> Vec<String> {
    c.aliases.iter().map(|a| a.to_string()).collect()
}

/// Facets outside `kept` have no field in the legacy layout.
fn drop_facets(ctx: &mut TransformContext<'_>, owner: &str, c: &ComplexType, kept: &[FacetKind]) {
    for f in c.facets.iter().filter(|f| !kept.contains(&f.kind)) {
        ctx.dropped(owner, &format!("{} facet", f.kind.suffix()));
    }
}

fn facet(
    ctx: &TransformContext<'_>,
    c: &ComplexType,
    kind: FacetKind,
) -> Result<Option<wire::FacetBody>, TransformError> {
    c.facets
        .iter()
        .find(|f| f.kind == kind)
        .map(|f| members(ctx, &f.members))
        .transpose()
}

fn members(ctx: &TransformContext<'_>, set: &MemberSet) -> Result<wire::FacetBody, TransformError> {
    Ok(wire::FacetBody {
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
                    type_name: ctx.render(&e.type_ref)?,
                    mandatory: e.mandatory,
                    repeat: repeat(e.repeat),
                    documentation: e.documentation.clone(),
                })
            })
            .collect::<Result<_, _>>()?,
        indicators: set.indicators.iter().map(indicator).collect(),
    })
}

fn repeat(count: u32) -> Option<String> {
    match count {
        0 => Some("*".to_string()),
        1 => None,
        n => Some(n.to_string()),
    }
}

fn attribute(ctx: &TransformContext<'_>, a: &model::Attribute) -> Result<wire::Attribute, TransformError> {
    Ok(wire::Attribute {
        name: a.name.to_string(),
        type_name: ctx.render(&a.type_ref)?,
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
