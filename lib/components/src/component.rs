use crate::element::{ComponentElement, PropMap};
use crate::error::ComponentError;
use std::sync::Arc;

/// A registered component instance.
///
/// Instances are created by a [ComponentFactory] from decoded props and materialized
/// children; the host drives the lifecycle methods around [Component::render]. All methods
/// report failures as values so the error boundary (see [crate::GuardRegistry]) can catch
/// and substitute them without unwinding.
pub trait Component: Send + Sync {
    /// The custom-element tag this instance was created for.
    fn type_name(&self) -> &str;

    /// Called before the instance is first rendered.
    fn will_mount(&self) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Produces the element tree of this instance.
    fn render(&self) -> Result<ComponentElement, ComponentError>;

    /// Called before the instance is dropped from the tree.
    fn will_unmount(&self) -> Result<(), ComponentError> {
        Ok(())
    }
}

/// Creates instances of one registered component class.
pub trait ComponentFactory: Send + Sync {
    /// The custom-element tag this factory is registered under.
    fn tag(&self) -> &str;

    /// Whether instances take the injected template-scope and data-context props.
    fn accepts_template_scope(&self) -> bool {
        false
    }

    fn create(
        &self,
        props: PropMap,
        children: Vec<ComponentElement>,
    ) -> Result<Arc<dyn Component>, ComponentError>;
}
