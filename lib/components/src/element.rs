use crate::component::Component;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Tag of the inline element rendered in place of a failed component.
pub const ERROR_NOTIFICATION_TAG: &str = "mp-error-notification";

/// Decoded props of an element, keyed by camel-cased prop name.
///
/// A `BTreeMap` keeps iteration deterministic, which the resolver relies on when
/// flattening nested configuration objects.
pub type PropMap = BTreeMap<String, PropValue>;

/// A typed prop decoded from a markup attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Bool(bool),
    Number(f64),
    String(String),
    Json(serde_json::Value),
    /// Named templates harvested from the element's markup, injected into components that
    /// accept a template scope.
    Templates(TemplateScope),
}

impl PropValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::String(value) => Some(value),
            _ => None,
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::String(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::String(value)
    }
}

/// A set of named raw (not yet compiled) templates local to one component element.
///
/// Templates are compiled lazily by the template-engine collaborator; the scope only
/// transports their sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateScope {
    templates: BTreeMap<String, String>,
}

impl TemplateScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a template source under `name`, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(name.into(), source.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.templates
            .iter()
            .map(|(name, source)| (name.as_str(), source.as_str()))
    }
}

/// A materialized node of the component tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentElement {
    /// Plain markup (ordinary HTML or a native custom element) with decoded attributes.
    Element {
        tag: String,
        props: PropMap,
        children: Vec<ComponentElement>,
    },
    /// An instantiated framework component.
    Component(ComponentInstance),
    /// Decoded text content.
    Text(String),
    /// A sequence of sibling elements without an element of their own.
    Fragment(Vec<ComponentElement>),
    /// Rendered for nodes the current principal may not see.
    Nothing,
}

impl ComponentElement {
    /// Creates a plain element without props or children.
    pub fn element(tag: impl Into<String>) -> Self {
        ComponentElement::Element {
            tag: tag.into(),
            props: PropMap::new(),
            children: Vec::new(),
        }
    }
}

/// An instantiated component together with the inputs it was created from.
#[derive(Clone)]
pub struct ComponentInstance {
    pub tag: String,
    pub component: Arc<dyn Component>,
    pub props: PropMap,
    pub children: Vec<ComponentElement>,
}

impl Debug for ComponentInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("tag", &self.tag)
            .field("props", &self.props)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ComponentInstance {
    fn eq(&self, other: &Self) -> bool {
        // Component instances have no structural identity beyond their inputs.
        self.tag == other.tag && self.props == other.props && self.children == other.children
    }
}

/// Builds the inline element shown in place of a component that failed at runtime.
pub fn error_notification(message: impl Into<String>) -> ComponentElement {
    ComponentElement::Element {
        tag: ERROR_NOTIFICATION_TAG.to_owned(),
        props: PropMap::from([("message".to_owned(), PropValue::String(message.into()))]),
        children: Vec::new(),
    }
}
