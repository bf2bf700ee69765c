//! `1.4` wire tree → model definitions.

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
    let NodeRef::V14Library(lib) = node else {
        return Err(TransformError::unexpected("1.4 library", node.describe()));
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
        status: match lib.status {
            wire::Status::Draft => LibraryStatus::Draft,
            wire::Status::Final => LibraryStatus::Final,
        },
        checksum: None,
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
    def.dialect = Some(Dialect::V1_4);

    for member in &lib.members {
        let target = NodeKind::Entity(entity_kind(member));
        if let Some(out) = ctx.transform_member(NodeRef::V14Member(member), target)? {
            def.entities.push(out.into_entity_def()?);
        }
    }
    Ok(Node::LibraryDef(def))
}

pub(super) fn member(node: NodeRef<'_>, ctx: &mut TransformContext<'_>) -> Result<Node, TransformError> {
    let NodeRef::V14Member(member) = node else {
        return Err(TransformError::unexpected("1.4 member", node.describe()));
    };
    ctx.enter(member.name());

    let (body, documentation) = match member {
        wire::Member::Simple(m) => (
            EntityBody::Simple(model::SimpleType {
                parent: ctx.reference(SlotCategory::ParentType, &m.type_name),
                pattern: m.pattern.clone(),
                min_length: m.min_length,
                max_length: m.max_length,
                list: false,
            }),
            &m.documentation,
        ),
        wire::Member::ClosedEnumeration(m) => (enumeration(ctx, m, false), &m.documentation),
        wire::Member::OpenEnumeration(m) => (enumeration(ctx, m, true), &m.documentation),
        wire::Member::ValueWithAttributes(m) => (
            EntityBody::ValueWithAttributes(model::ValueWithAttributes {
                parent: ctx.reference(SlotCategory::AttributeType, &m.type_name),
                attributes: m.attributes.iter().map(|a| attribute(ctx, a)).collect(),
                indicators: m.indicators.iter().map(indicator).collect(),
            }),
            &m.documentation,
        ),
        wire::Member::CoreObject(m) => {
            let mut complex = ComplexType {
                extends: ctx.optional_reference(SlotCategory::Extension, m.extends.as_deref()),
                simple_type: ctx.optional_reference(SlotCategory::AttributeType, m.simple.as_deref()),
                facets: Vec::new(),
                aliases: m.aliases.iter().map(|a| a.as_str().into()).collect(),
            };
            push_facet(ctx, &mut complex, FacetKind::Summary, m.summary.as_ref())?;
            push_facet(ctx, &mut complex, FacetKind::Detail, m.detail.as_ref())?;
            (EntityBody::Core(complex), &m.documentation)
        }
        wire::Member::BusinessObject(m) => {
            let mut complex = ComplexType {
                extends: ctx.optional_reference(SlotCategory::Extension, m.extends.as_deref()),
                simple_type: None,
                facets: Vec::new(),
                aliases: m.aliases.iter().map(|a| a.as_str().into()).collect(),
            };
            push_facet(ctx, &mut complex, FacetKind::Id, m.id.as_ref())?;
            push_facet(ctx, &mut complex, FacetKind::Summary, m.summary.as_ref())?;
            push_facet(ctx, &mut complex, FacetKind::Detail, m.detail.as_ref())?;
            (EntityBody::Business(complex), &m.documentation)
        }
        wire::Member::Service(m) => {
            let mut operations = Vec::with_capacity(m.operations.len());
            for op in &m.operations {
                operations.push(model::Operation {
                    name: op.name.as_str().into(),
                    request: members(ctx, &op.request)?,
                    response: members(ctx, &op.response)?,
                    notification: op.notification.as_ref().map(|n| members(ctx, n)).transpose()?,
                });
            }
            (EntityBody::Service(model::Service { operations }), &m.documentation)
        }
        wire::Member::ExtensionPoint(m) => (
            EntityBody::ExtensionPoint(model::ExtensionPoint {
                extends: ctx.reference(SlotCategory::ExtensionPoint, &m.type_name),
                members: members(ctx, &m.members)?,
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
        wire::Member::Simple(_) => EntityKind::SimpleType,
        wire::Member::ClosedEnumeration(_) | wire::Member::OpenEnumeration(_) => EntityKind::Enumeration,
        wire::Member::ValueWithAttributes(_) => EntityKind::ValueWithAttributes,
        wire::Member::CoreObject(_) => EntityKind::CoreObject,
        wire::Member::BusinessObject(_) => EntityKind::BusinessObject,
        wire::Member::Service(_) => EntityKind::Service,
        wire::Member::ExtensionPoint(_) => EntityKind::ExtensionPoint,
    }
}

fn enumeration(ctx: &mut TransformContext<'_>, m: &wire::Enumeration, open: bool) -> EntityBody {
    EntityBody::Enumeration(model::Enumeration {
        open,
        extends: ctx.optional_reference(SlotCategory::Extension, m.extends.as_deref()),
        values: m
            .literals
            .iter()
            .map(|l| model::EnumValue {
                literal: l.value.as_str().into(),
                label: l.label.clone(),
            })
            .collect(),
    })
}

fn push_facet(
    ctx: &mut TransformContext<'_>,
    complex: &mut ComplexType,
    kind: FacetKind,
    body: Option<&wire::FacetBody>,
) -> Result<(), TransformError> {
    if let Some(body) = body {
        complex.facets.push(model::Facet {
            kind,
            members: members(ctx, body)?,
        });
    }
    Ok(())
}

fn members(ctx: &mut TransformContext<'_>, body: &wire::FacetBody) -> Result<MemberSet, TransformError> {
    let mut elements = Vec::with_capacity(body.elements.len());
    for e in &body.elements {
        elements.push(model::Element {
            name: e.name.as_str().into(),
            type_ref: ctx.reference(SlotCategory::ElementType, &e.type_name),
            mandatory: e.mandatory,
            repeat: repeat(e.repeat.as_deref())?,
            documentation: e.documentation.clone(),
        });
    }
    Ok(MemberSet {
        attributes: body.attributes.iter().map(|a| attribute(ctx, a)).collect(),
        elements,
        indicators: body.indicators.iter().map(indicator).collect(),
    })
}

/// `"*"` is unbounded (0), absent is one.
fn repeat(value: Option<&str>) -> Result<u32, TransformError> {
    match value.map(str::trim) {
        None | Some("") => Ok(1),
        Some("*") => Ok(0),
        Some(n) => n.parse().map_err(|_| TransformError::invalid("repeat", n)),
    }
}

fn attribute(ctx: &mut TransformContext<'_>, a: &wire::Attribute) -> model::Attribute {
    model::Attribute {
        name: a.name.as_str().into(),
        type_ref: ctx.reference(SlotCategory::AttributeType, &a.type_name),
        mandatory: a.mandatory,
        documentation: a.documentation.clone(),
    }
}

fn indicator(i: &wire::Indicator) -> model::Indicator {
    model::Indicator {
        name: i.name.as_str().into(),
        publish_as_element: i.publish_as_element,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_parsing() {
        assert_eq!(repeat(None).unwrap(), 1);
        assert_eq!(repeat(Some("*")).unwrap(), 0);
        assert_eq!(repeat(Some("5")).unwrap(), 5);
        assert!(repeat(Some("many")).is_err());
    }
}
