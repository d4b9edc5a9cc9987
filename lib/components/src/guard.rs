use crate::component::{Component, ComponentFactory};
use crate::element::{error_notification, ComponentElement, PropMap};
use crate::error::ComponentError;
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// Wraps component factories in an error boundary, exactly once per component class.
///
/// A guarded component catches failures from its lifecycle methods and `render`, logs
/// them, and renders an inline [error notification](error_notification) instead, so one
/// broken component degrades locally rather than taking the page down.
///
/// Component classes are keyed by their registered tag. Wrapping is idempotent: a second
/// `wrap` for the same tag (including with an already-guarded factory) returns the
/// existing wrapper, so lifecycle methods are never routed through two boundaries.
#[derive(Default)]
pub struct GuardRegistry {
    guarded: RwLock<FxHashMap<String, Arc<GuardedFactory>>>,
}

impl GuardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the guarded version of `factory`, creating it on first use.
    pub fn wrap(&self, factory: Arc<dyn ComponentFactory>) -> Arc<dyn ComponentFactory> {
        let tag = factory.tag().to_owned();
        if let Some(existing) = self.guarded.read().unwrap().get(&tag) {
            return Arc::clone(existing) as Arc<dyn ComponentFactory>;
        }
        let mut guarded = self.guarded.write().unwrap();
        let wrapper = guarded
            .entry(tag)
            .or_insert_with(|| Arc::new(GuardedFactory { inner: factory }));
        Arc::clone(wrapper) as Arc<dyn ComponentFactory>
    }
}

struct GuardedFactory {
    inner: Arc<dyn ComponentFactory>,
}

impl ComponentFactory for GuardedFactory {
    fn tag(&self) -> &str {
        self.inner.tag()
    }

    fn accepts_template_scope(&self) -> bool {
        self.inner.accepts_template_scope()
    }

    fn create(
        &self,
        props: PropMap,
        children: Vec<ComponentElement>,
    ) -> Result<Arc<dyn Component>, ComponentError> {
        let component = self.inner.create(props, children)?;
        Ok(Arc::new(Guarded { inner: component }))
    }
}

struct Guarded {
    inner: Arc<dyn Component>,
}

impl Guarded {
    fn log_and_swallow(&self, phase: &str, result: Result<(), ComponentError>) {
        if let Err(error) = result {
            tracing::error!(
                component = self.inner.type_name(),
                phase,
                %error,
                "component lifecycle method failed"
            );
        }
    }
}

impl Component for Guarded {
    fn type_name(&self) -> &str {
        self.inner.type_name()
    }

    fn will_mount(&self) -> Result<(), ComponentError> {
        self.log_and_swallow("will_mount", self.inner.will_mount());
        Ok(())
    }

    fn render(&self) -> Result<ComponentElement, ComponentError> {
        match self.inner.render() {
            Ok(element) => Ok(element),
            Err(error) => {
                tracing::error!(
                    component = self.inner.type_name(),
                    %error,
                    "component failed to render"
                );
                Ok(error_notification(error.to_string()))
            }
        }
    }

    fn will_unmount(&self) -> Result<(), ComponentError> {
        self.log_and_swallow("will_unmount", self.inner.will_unmount());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ERROR_NOTIFICATION_TAG;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFactory {
        mounts: Arc<AtomicUsize>,
    }

    struct CountingComponent {
        mounts: Arc<AtomicUsize>,
    }

    impl ComponentFactory for CountingFactory {
        fn tag(&self) -> &str {
            "mp-counting"
        }

        fn create(
            &self,
            _props: PropMap,
            _children: Vec<ComponentElement>,
        ) -> Result<Arc<dyn Component>, ComponentError> {
            Ok(Arc::new(CountingComponent {
                mounts: Arc::clone(&self.mounts),
            }))
        }
    }

    impl Component for CountingComponent {
        fn type_name(&self) -> &str {
            "mp-counting"
        }

        fn will_mount(&self) -> Result<(), ComponentError> {
            self.mounts.fetch_add(1, Ordering::SeqCst);
            Err(ComponentError::render("mp-counting", "mount failed"))
        }

        fn render(&self) -> Result<ComponentElement, ComponentError> {
            Err(ComponentError::render("mp-counting", "boom"))
        }
    }

    #[test]
    fn wrapping_twice_returns_the_same_factory() {
        let registry = GuardRegistry::new();
        let factory: Arc<dyn ComponentFactory> = Arc::new(CountingFactory {
            mounts: Arc::new(AtomicUsize::new(0)),
        });

        let once = registry.wrap(Arc::clone(&factory));
        let twice = registry.wrap(once.clone());
        assert!(Arc::ptr_eq(&once, &twice));

        // Re-wrapping the original factory also resolves to the existing wrapper.
        let again = registry.wrap(factory);
        assert!(Arc::ptr_eq(&once, &again));
    }

    #[test]
    fn guarded_render_substitutes_error_notification() {
        let registry = GuardRegistry::new();
        let factory = registry.wrap(Arc::new(CountingFactory {
            mounts: Arc::new(AtomicUsize::new(0)),
        }));
        let component = factory.create(PropMap::new(), Vec::new()).unwrap();

        let rendered = component.render().unwrap();
        let ComponentElement::Element { tag, props, .. } = rendered else {
            panic!("expected an element, got {rendered:?}");
        };
        assert_eq!(tag, ERROR_NOTIFICATION_TAG);
        assert!(props["message"].as_str().unwrap().contains("boom"));
    }

    #[test]
    fn guarded_lifecycle_failure_is_swallowed_and_invoked_once() {
        let mounts = Arc::new(AtomicUsize::new(0));
        let registry = GuardRegistry::new();
        let factory = registry.wrap(Arc::new(CountingFactory {
            mounts: Arc::clone(&mounts),
        }));
        let component = factory.create(PropMap::new(), Vec::new()).unwrap();

        assert!(component.will_mount().is_ok());
        assert_eq!(mounts.load(Ordering::SeqCst), 1);
    }
}
