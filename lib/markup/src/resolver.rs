use crate::attributes::{
    attribute_to_prop_name, coerce_prop_value, decode_attribute_value, kebab_to_camel,
};
use crate::classify::{classify, ClassifyContext, NodeClass};
use crate::error::MarkupError;
use crate::node::{parse_markup, MarkupNode, MarkupNodeKind};
use crate::template_scope::{
    extract_data_context, extract_template_scope, DATA_CONTEXT_ATTRIBUTE,
    TEMPLATE_SCOPE_ATTRIBUTE,
};
use async_trait::async_trait;
use graphbind_common::error::ClientError;
use graphbind_components::{
    ComponentElement, ComponentInstance, ComponentRegistry, GuardRegistry, PropMap, PropValue,
};
use graphbind_security::PermissionGate;
use std::collections::HashSet;
use std::sync::Arc;

/// Tag of the syntax-highlight component code blocks resolve to.
pub const CODE_HIGHLIGHT_TAG: &str = "mp-code-highlight";

/// `<meta name="...">` marker of legacy pages whose whole document is one template.
pub const LEGACY_TEMPLATE_MARKER: &str = "mp-legacy-template";

/// Tag prefix of platform components; enables the `config` prop convenience flattening.
const PLATFORM_TAG_PREFIX: &str = "mp-";

/// Renders legacy whole-page templates into markup.
///
/// The compilation engine itself is a collaborator; the resolver only needs the expanded
/// markup back.
#[async_trait]
pub trait TemplateEngine: Send + Sync {
    async fn render_page(&self, source: &str) -> Result<String, ClientError>;
}

/// Options of a resolution run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverOptions {
    /// Synthesize a pseudo-random list key for components that carry none.
    pub use_generated_keys: bool,
}

/// Materializes parsed markup into a component tree.
pub struct MarkupResolver {
    registry: Arc<ComponentRegistry>,
    gate: Arc<PermissionGate>,
    guards: Arc<GuardRegistry>,
    template_engine: Arc<dyn TemplateEngine>,
    options: ResolverOptions,
}

impl MarkupResolver {
    pub fn new(
        registry: Arc<ComponentRegistry>,
        gate: Arc<PermissionGate>,
        guards: Arc<GuardRegistry>,
        template_engine: Arc<dyn TemplateEngine>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            registry,
            gate,
            guards,
            template_engine,
            options,
        }
    }

    /// Parses markup and materializes the component tree.
    ///
    /// The referenced custom-element tags are collected first, the permission gate is
    /// warmed for them, and the permitted implementations are loaded before any node is
    /// materialized. A single materialized root is returned unwrapped; an empty document
    /// materializes to an empty [ComponentElement::Fragment]. Legacy pages carrying the
    /// [LEGACY_TEMPLATE_MARKER] meta tag are first expanded through the template engine.
    ///
    /// Any node-scoped failure aborts the whole materialization and surfaces as the
    /// single error of this call; there is no per-node isolation.
    pub async fn render_markup(&self, markup: &str) -> Result<ComponentElement, MarkupError> {
        let nodes = parse_markup(markup)?;
        if has_legacy_template_marker(&nodes) {
            tracing::debug!("legacy template marker found, expanding page through the template engine");
            let expanded = self.template_engine.render_page(markup).await?;
            let nodes = parse_markup(&expanded)?;
            return self.resolve_tree(nodes).await;
        }
        self.resolve_tree(nodes).await
    }

    async fn resolve_tree(&self, nodes: Vec<MarkupNode>) -> Result<ComponentElement, MarkupError> {
        let tags = collect_component_tags(&nodes);
        let permitted = self.gate.load_permitted_components(&tags).await?;
        self.registry
            .load_components(permitted.iter().map(String::as_str))
            .await?;

        // The node list acts as a synthetic root that is never exposed: its materialized
        // children are unwrapped below.
        let mut materialized = Vec::new();
        for node in &nodes {
            // Inter-element whitespace at the document level carries no content.
            if node.kind == MarkupNodeKind::Text && node.content().trim().is_empty() {
                continue;
            }
            if let Some(element) = self.materialize(node, ClassifyContext::default())? {
                materialized.push(element);
            }
        }
        Ok(if materialized.len() == 1 {
            materialized.remove(0)
        } else {
            ComponentElement::Fragment(materialized)
        })
    }

    fn materialize(
        &self,
        node: &MarkupNode,
        context: ClassifyContext,
    ) -> Result<Option<ComponentElement>, MarkupError> {
        match node.kind {
            MarkupNodeKind::Text | MarkupNodeKind::CData => {
                Ok(Some(ComponentElement::Text(node.content().to_owned())))
            }
            MarkupNodeKind::Element => self.materialize_element(node, context),
        }
    }

    fn materialize_element(
        &self,
        node: &MarkupNode,
        context: ClassifyContext,
    ) -> Result<Option<ComponentElement>, MarkupError> {
        match classify(&node.name, context, self.registry.as_ref()) {
            NodeClass::SuppressedByCode | NodeClass::SuppressedByStyle => Ok(None),
            NodeClass::Code => {
                let mut props = self.decoded_props(node)?;
                props.insert(
                    "codeText".to_owned(),
                    PropValue::String(node.raw_text()),
                );
                Ok(Some(ComponentElement::Element {
                    tag: CODE_HIGHLIGHT_TAG.to_owned(),
                    props,
                    children: Vec::new(),
                }))
            }
            NodeClass::Style => Ok(Some(ComponentElement::Element {
                tag: node.name.clone(),
                props: self.raw_props(node)?,
                children: vec![ComponentElement::Text(node.raw_text())],
            })),
            NodeClass::FrameworkComponent => self.resolve_framework_component(node).map(Some),
            NodeClass::NativeComponent | NodeClass::Plain => {
                let mut children = Vec::new();
                for child in &node.children {
                    if let Some(element) = self.materialize(child, context)? {
                        children.push(element);
                    }
                }
                Ok(Some(ComponentElement::Element {
                    tag: node.name.clone(),
                    props: self.raw_props(node)?,
                    children,
                }))
            }
        }
    }

    /// Entity-decoded attributes under their original names.
    fn raw_props(&self, node: &MarkupNode) -> Result<PropMap, MarkupError> {
        let mut props = PropMap::new();
        for (attr, raw) in &node.attrs {
            props.insert(
                attr.clone(),
                PropValue::String(decode_attribute_value(raw)?),
            );
        }
        Ok(props)
    }

    /// Entity-decoded, name-converted, and type-coerced attributes.
    fn decoded_props(&self, node: &MarkupNode) -> Result<PropMap, MarkupError> {
        let mut props = PropMap::new();
        for (attr, raw) in &node.attrs {
            if attr == TEMPLATE_SCOPE_ATTRIBUTE || attr == DATA_CONTEXT_ATTRIBUTE {
                continue;
            }
            let decoded = decode_attribute_value(raw)?;
            props.insert(
                attribute_to_prop_name(attr),
                coerce_prop_value(&node.name, attr, &decoded)?,
            );
        }
        Ok(props)
    }

    fn resolve_framework_component(
        &self,
        node: &MarkupNode,
    ) -> Result<ComponentElement, MarkupError> {
        let mut props = self.decoded_props(node)?;

        let generated_requested =
            matches!(props.get("useGeneratedKey"), Some(PropValue::Bool(true)));
        let key = props
            .get("fixedKey")
            .or_else(|| props.get("key"))
            .and_then(prop_to_key)
            .or_else(|| {
                (self.options.use_generated_keys || generated_requested)
                    .then(|| format!("{:016x}", rand::random::<u64>()))
            });
        if let Some(key) = key {
            props.insert("key".to_owned(), PropValue::String(key));
        }

        if node.name.starts_with(PLATFORM_TAG_PREFIX) {
            flatten_config_prop(&mut props);
        }

        let (template_scope, harvested) = extract_template_scope(node)?;
        let data_context = extract_data_context(node)?;

        if !self.gate.is_component_permitted(&node.name)? {
            return Ok(ComponentElement::Nothing);
        }

        let factory = self
            .registry
            .resolve(&node.name)
            .ok_or_else(|| MarkupError::ComponentNotLoaded {
                tag: node.name.clone(),
            })?;
        let factory = self.guards.wrap(factory);

        if factory.accepts_template_scope() {
            if let Some(scope) = template_scope {
                props.insert("markupTemplateScope".to_owned(), PropValue::Templates(scope));
            }
            if let Some(context) = data_context {
                props.insert("markupDataContext".to_owned(), PropValue::Json(context));
            }
        }

        let mut children = Vec::new();
        for (index, child) in node.children.iter().enumerate() {
            if harvested.contains(&index) {
                continue;
            }
            if let Some(element) = self.materialize(child, ClassifyContext::default())? {
                children.push(element);
            }
        }

        let component = factory.create(props.clone(), children.clone())?;
        Ok(ComponentElement::Component(ComponentInstance {
            tag: node.name.clone(),
            component,
            props,
            children,
        }))
    }
}

/// Flattens a JSON `config` prop into top-level props under camel-cased key names.
fn flatten_config_prop(props: &mut PropMap) {
    if !matches!(
        props.get("config"),
        Some(PropValue::Json(serde_json::Value::Object(_)))
    ) {
        return;
    }
    let Some(PropValue::Json(serde_json::Value::Object(config))) = props.remove("config") else {
        return;
    };
    for (key, value) in config {
        props.insert(kebab_to_camel(&key), json_to_prop(value));
    }
}

fn json_to_prop(value: serde_json::Value) -> PropValue {
    match value {
        serde_json::Value::Bool(b) => PropValue::Bool(b),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(PropValue::Number)
            .unwrap_or(PropValue::Json(serde_json::Value::Number(n))),
        serde_json::Value::String(s) => PropValue::String(s),
        other => PropValue::Json(other),
    }
}

fn prop_to_key(prop: &PropValue) -> Option<String> {
    match prop {
        PropValue::String(s) => Some(s.clone()),
        PropValue::Number(n) => Some(n.to_string()),
        PropValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Collects every referenced custom-element tag name (dash naming convention).
fn collect_component_tags(nodes: &[MarkupNode]) -> HashSet<String> {
    let mut tags = HashSet::new();
    let mut pending: Vec<&MarkupNode> = nodes.iter().collect();
    while let Some(node) = pending.pop() {
        if node.kind == MarkupNodeKind::Element {
            if node.name.contains('-') {
                tags.insert(node.name.clone());
            }
            pending.extend(node.children.iter());
        }
    }
    tags
}

fn has_legacy_template_marker(nodes: &[MarkupNode]) -> bool {
    let mut pending: Vec<&MarkupNode> = nodes.iter().collect();
    while let Some(node) = pending.pop() {
        if node.kind == MarkupNodeKind::Element {
            if node.name == "meta" && node.attr("name") == Some(LEGACY_TEMPLATE_MARKER) {
                return true;
            }
            pending.extend(node.children.iter());
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphbind_components::error::ComponentError;
    use graphbind_components::{
        Component, ComponentFactory, ResourceFetcher, ScriptLoader,
    };
    use graphbind_security::{ComponentPermissionCache, PermissionService, SecurityConfig};
    use std::sync::Mutex;

    struct NullFetcher;

    #[async_trait]
    impl ResourceFetcher for NullFetcher {
        async fn fetch(&self, _url: &str) -> Result<(), ClientError> {
            Ok(())
        }
    }

    struct DenyListService {
        denied: Vec<&'static str>,
    }

    #[async_trait]
    impl PermissionService for DenyListService {
        async fn is_permitted(&self, permission: &str) -> Result<bool, ClientError> {
            Ok(!self.denied.iter().any(|d| *d == permission))
        }
    }

    struct EchoEngine;

    #[async_trait]
    impl TemplateEngine for EchoEngine {
        async fn render_page(&self, _source: &str) -> Result<String, ClientError> {
            Ok("<div>expanded</div>".to_owned())
        }
    }

    struct RecordingFactory {
        tag: &'static str,
        accepts_scope: bool,
        created: Mutex<Vec<PropMap>>,
    }

    impl RecordingFactory {
        fn new(tag: &'static str) -> Self {
            Self {
                tag,
                accepts_scope: false,
                created: Mutex::new(Vec::new()),
            }
        }

        fn with_scope(tag: &'static str) -> Self {
            Self {
                tag,
                accepts_scope: true,
                created: Mutex::new(Vec::new()),
            }
        }
    }

    struct StaticComponent {
        tag: &'static str,
    }

    impl Component for StaticComponent {
        fn type_name(&self) -> &str {
            self.tag
        }

        fn render(&self) -> Result<ComponentElement, ComponentError> {
            Ok(ComponentElement::element("div"))
        }
    }

    impl ComponentFactory for RecordingFactory {
        fn tag(&self) -> &str {
            self.tag
        }

        fn accepts_template_scope(&self) -> bool {
            self.accepts_scope
        }

        fn create(
            &self,
            props: PropMap,
            _children: Vec<ComponentElement>,
        ) -> Result<Arc<dyn Component>, ComponentError> {
            self.created.lock().unwrap().push(props);
            Ok(Arc::new(StaticComponent { tag: self.tag }))
        }
    }

    struct Fixture {
        registry: Arc<ComponentRegistry>,
        resolver: MarkupResolver,
    }

    fn fixture(security_enabled: bool, denied: Vec<&'static str>) -> Fixture {
        let registry = Arc::new(ComponentRegistry::new(ScriptLoader::new(Arc::new(
            NullFetcher,
        ))));
        let gate = Arc::new(PermissionGate::new(
            SecurityConfig {
                component_based_security: security_enabled,
            },
            Arc::new(DenyListService { denied }),
            Arc::clone(&registry) as _,
            Arc::new(ComponentPermissionCache::new()),
        ));
        let resolver = MarkupResolver::new(
            Arc::clone(&registry),
            gate,
            Arc::new(GuardRegistry::new()),
            Arc::new(EchoEngine),
            ResolverOptions::default(),
        );
        Fixture { registry, resolver }
    }

    #[tokio::test]
    async fn resolves_registered_component_with_coerced_props() {
        let fixture = fixture(false, Vec::new());
        let factory = Arc::new(RecordingFactory::new("mp-widget"));
        fixture.registry.register(Arc::clone(&factory) as _);

        let element = fixture
            .resolver
            .render_markup(r#"<mp-widget data-count="3" data-flag="true"></mp-widget>"#)
            .await
            .unwrap();

        let ComponentElement::Component(instance) = element else {
            panic!("expected a component, got {element:?}");
        };
        assert_eq!(instance.tag, "mp-widget");
        assert_eq!(instance.props["count"], PropValue::Number(3.0));
        assert_eq!(instance.props["flag"], PropValue::Bool(true));
        assert_eq!(factory.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn denied_component_renders_nothing() {
        let fixture = fixture(true, vec!["ui:component:view:mp:widget"]);
        fixture
            .registry
            .register(Arc::new(RecordingFactory::new("mp-widget")) as _);

        let element = fixture
            .resolver
            .render_markup("<mp-widget></mp-widget>")
            .await
            .unwrap();
        assert_eq!(element, ComponentElement::Nothing);
    }

    #[tokio::test]
    async fn unregistered_dashed_tag_renders_as_native_element() {
        let fixture = fixture(false, Vec::new());
        let element = fixture
            .resolver
            .render_markup(r#"<fancy-element class="a">text</fancy-element>"#)
            .await
            .unwrap();

        let ComponentElement::Element { tag, props, children } = element else {
            panic!("expected an element, got {element:?}");
        };
        assert_eq!(tag, "fancy-element");
        // Native elements keep raw attribute names and string values.
        assert_eq!(props["class"], PropValue::String("a".to_owned()));
        assert_eq!(children, vec![ComponentElement::Text("text".to_owned())]);
    }

    #[tokio::test]
    async fn code_block_consumes_descendants_verbatim() {
        let fixture = fixture(false, Vec::new());
        let element = fixture
            .resolver
            .render_markup(
                "<mp-code-example mode=\"text/html\"><b>bold</b><![CDATA[<raw>]]></mp-code-example>",
            )
            .await
            .unwrap();

        let ComponentElement::Element { tag, props, children } = element else {
            panic!("expected an element, got {element:?}");
        };
        assert_eq!(tag, CODE_HIGHLIGHT_TAG);
        assert_eq!(props["codeText"], PropValue::String("bold<raw>".to_owned()));
        assert_eq!(props["mode"], PropValue::String("text/html".to_owned()));
        assert!(children.is_empty());
    }

    #[tokio::test]
    async fn style_passes_through_raw() {
        let fixture = fixture(false, Vec::new());
        let element = fixture
            .resolver
            .render_markup("<style>.a { color: red; }</style>")
            .await
            .unwrap();

        let ComponentElement::Element { tag, children, .. } = element else {
            panic!("expected an element, got {element:?}");
        };
        assert_eq!(tag, "style");
        assert_eq!(
            children,
            vec![ComponentElement::Text(".a { color: red; }".to_owned())]
        );
    }

    #[tokio::test]
    async fn empty_markup_is_an_empty_fragment_and_single_root_is_unwrapped() {
        let fixture = fixture(false, Vec::new());
        assert_eq!(
            fixture.resolver.render_markup("").await.unwrap(),
            ComponentElement::Fragment(Vec::new())
        );

        let single = fixture.resolver.render_markup("<div/>").await.unwrap();
        assert!(matches!(single, ComponentElement::Element { .. }));

        let double = fixture
            .resolver
            .render_markup("<div/><div/>")
            .await
            .unwrap();
        let ComponentElement::Fragment(children) = double else {
            panic!("expected a fragment, got {double:?}");
        };
        assert_eq!(children.len(), 2);
    }

    #[tokio::test]
    async fn one_bad_node_fails_the_whole_tree() {
        let fixture = fixture(false, Vec::new());
        fixture
            .registry
            .register(Arc::new(RecordingFactory::new("mp-widget")) as _);

        let error = fixture
            .resolver
            .render_markup(r#"<div><mp-widget options='{"broken": }'></mp-widget><p>fine</p></div>"#)
            .await
            .unwrap_err();
        let MarkupError::Json { tag, attribute, .. } = error else {
            panic!("expected a JSON error, got {error}");
        };
        assert_eq!(tag, "mp-widget");
        assert_eq!(attribute, "options");
    }

    #[tokio::test]
    async fn config_prop_is_flattened_for_platform_tags() {
        let fixture = fixture(false, Vec::new());
        let factory = Arc::new(RecordingFactory::new("mp-widget"));
        fixture.registry.register(Arc::clone(&factory) as _);

        fixture
            .resolver
            .render_markup(
                r#"<mp-widget config='{"show-label": true, "max-items": 5}'></mp-widget>"#,
            )
            .await
            .unwrap();

        let created = factory.created.lock().unwrap();
        assert_eq!(created[0]["showLabel"], PropValue::Bool(true));
        assert_eq!(created[0]["maxItems"], PropValue::Number(5.0));
        assert!(!created[0].contains_key("config"));
    }

    #[tokio::test]
    async fn template_scope_is_injected_into_accepting_components() {
        let fixture = fixture(false, Vec::new());
        let factory = Arc::new(RecordingFactory::with_scope("mp-list"));
        fixture.registry.register(Arc::clone(&factory) as _);

        fixture
            .resolver
            .render_markup(
                "<mp-list><template id=\"row\"><span>{{value}}</span></template></mp-list>",
            )
            .await
            .unwrap();

        let created = factory.created.lock().unwrap();
        let PropValue::Templates(scope) = &created[0]["markupTemplateScope"] else {
            panic!("expected an injected template scope");
        };
        assert_eq!(scope.get("row"), Some("<span>{{value}}</span>"));
    }

    #[tokio::test]
    async fn fixed_key_wins_over_key() {
        let fixture = fixture(false, Vec::new());
        let factory = Arc::new(RecordingFactory::new("mp-widget"));
        fixture.registry.register(Arc::clone(&factory) as _);

        fixture
            .resolver
            .render_markup(r#"<mp-widget fixed-key="stable" key="positional"></mp-widget>"#)
            .await
            .unwrap();

        let created = factory.created.lock().unwrap();
        assert_eq!(created[0]["key"], PropValue::String("stable".to_owned()));
    }

    #[tokio::test]
    async fn legacy_template_marker_renders_through_the_engine() {
        let fixture = fixture(false, Vec::new());
        let element = fixture
            .resolver
            .render_markup(r#"<meta name="mp-legacy-template"/><p>ignored</p>"#)
            .await
            .unwrap();

        let ComponentElement::Element { tag, children, .. } = element else {
            panic!("expected an element, got {element:?}");
        };
        assert_eq!(tag, "div");
        assert_eq!(
            children,
            vec![ComponentElement::Text("expanded".to_owned())]
        );
    }
}
