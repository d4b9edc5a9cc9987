use crate::attributes::decode_attribute_value;
use crate::error::MarkupError;
use crate::node::{MarkupNode, MarkupNodeKind};
use graphbind_components::TemplateScope;

/// Attribute carrying a JSON map of raw named templates.
pub const TEMPLATE_SCOPE_ATTRIBUTE: &str = "template-scope";

/// Attribute carrying a captured data context as JSON.
pub const DATA_CONTEXT_ATTRIBUTE: &str = "data-context";

/// Tag of nested named-template declarations.
const TEMPLATE_TAG: &str = "template";

/// Extracts the local template scope of a component element.
///
/// Templates come from the dedicated [TEMPLATE_SCOPE_ATTRIBUTE] (a JSON object mapping
/// template names to raw sources) and from nested `<template id="...">` declarations,
/// whose markup is harvested verbatim. Harvested children must be removed from the child
/// list by the caller (see the returned indices). Extraction failures carry the owning
/// tag name.
pub fn extract_template_scope(
    node: &MarkupNode,
) -> Result<(Option<TemplateScope>, Vec<usize>), MarkupError> {
    let mut scope = TemplateScope::new();

    if let Some(raw) = node.attr(TEMPLATE_SCOPE_ATTRIBUTE) {
        let decoded = decode_attribute_value(raw)?;
        let parsed: serde_json::Value =
            serde_json::from_str(&decoded).map_err(|error| MarkupError::TemplateScope {
                tag: node.name.clone(),
                message: format!("invalid template-scope JSON: {error}"),
            })?;
        let serde_json::Value::Object(templates) = parsed else {
            return Err(MarkupError::TemplateScope {
                tag: node.name.clone(),
                message: "template-scope must be a JSON object of template sources".to_owned(),
            });
        };
        for (name, source) in templates {
            let serde_json::Value::String(source) = source else {
                return Err(MarkupError::TemplateScope {
                    tag: node.name.clone(),
                    message: format!("template `{name}` must be a string"),
                });
            };
            scope.insert(name, source);
        }
    }

    let mut harvested = Vec::new();
    for (index, child) in node.children.iter().enumerate() {
        if child.kind != MarkupNodeKind::Element || child.name != TEMPLATE_TAG {
            continue;
        }
        let Some(id) = child.attr("id") else {
            return Err(MarkupError::TemplateScope {
                tag: node.name.clone(),
                message: "nested <template> declarations must carry an id".to_owned(),
            });
        };
        let source: String = child
            .children
            .iter()
            .map(MarkupNode::to_markup)
            .collect();
        scope.insert(id, source);
        harvested.push(index);
    }

    if scope.is_empty() && harvested.is_empty() {
        Ok((None, harvested))
    } else {
        Ok((Some(scope), harvested))
    }
}

/// Extracts the captured data context from its dedicated attribute, if present.
pub fn extract_data_context(node: &MarkupNode) -> Result<Option<serde_json::Value>, MarkupError> {
    let Some(raw) = node.attr(DATA_CONTEXT_ATTRIBUTE) else {
        return Ok(None);
    };
    let decoded = decode_attribute_value(raw)?;
    let parsed = serde_json::from_str(&decoded).map_err(|error| MarkupError::TemplateScope {
        tag: node.name.clone(),
        message: format!("invalid data-context JSON: {error}"),
    })?;
    Ok(Some(parsed))
}
