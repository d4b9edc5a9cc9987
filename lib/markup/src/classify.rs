use graphbind_components::ComponentCatalog;

/// Tags rendered as syntax-highlighted code blocks.
pub const CODE_TAGS: &[&str] = &["code", "mp-code-example", "mp-code-block"];

/// The style passthrough tag.
pub const STYLE_TAG: &str = "style";

/// Ancestry flags the classifier needs: whether the node sits below a code or style tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyContext {
    pub in_code: bool,
    pub in_style: bool,
}

/// How an element node is materialized.
///
/// Decided once per node by [classify]; the variants are checked in the declared priority
/// order, so the seven-way decision is auditable and exhaustively testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    /// Rendered as a code-highlight component consuming the raw text of all descendants.
    Code,
    /// Already consumed by a code ancestor.
    SuppressedByCode,
    /// Passed through as a raw style element.
    Style,
    /// Already consumed by a style ancestor.
    SuppressedByStyle,
    /// Resolved through the component registry and instantiated.
    FrameworkComponent,
    /// Rendered as a native DOM custom element with decoded attributes.
    NativeComponent,
    /// Ordinary markup, passed through with decoded attributes.
    Plain,
}

/// Classifies an element node by tag name, ancestry, and the component catalog.
pub fn classify(name: &str, context: ClassifyContext, catalog: &dyn ComponentCatalog) -> NodeClass {
    if CODE_TAGS.contains(&name) {
        return NodeClass::Code;
    }
    if context.in_code {
        return NodeClass::SuppressedByCode;
    }
    if name == STYLE_TAG {
        return NodeClass::Style;
    }
    if context.in_style {
        return NodeClass::SuppressedByStyle;
    }
    if catalog.has_component(name) && !catalog.is_registered_native_component(name) {
        return NodeClass::FrameworkComponent;
    }
    // The dash marks the custom-element naming convention even for unregistered tags.
    if catalog.is_registered_native_component(name) || name.contains('-') {
        return NodeClass::NativeComponent;
    }
    NodeClass::Plain
}
