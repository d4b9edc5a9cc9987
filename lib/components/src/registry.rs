use crate::component::ComponentFactory;
use crate::error::ComponentError;
use crate::loader::ScriptLoader;
use graphbind_common::error::ClientError;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::{Arc, RwLock};

/// Read-only view of the registry used by the permission gate and the node classifier.
pub trait ComponentCatalog: Send + Sync {
    /// Whether `tag` names a registered component of any kind.
    fn has_component(&self, tag: &str) -> bool;

    /// Whether `tag` names a registered *native* component (rendered as a DOM custom
    /// element rather than resolved through a factory).
    fn is_registered_native_component(&self, tag: &str) -> bool;
}

/// Maps custom-element tags to registered component implementations.
///
/// Components register either eagerly with a [ComponentFactory] or lazily with a script
/// URL whose load is deferred until a page references the tag. Native components only
/// occupy the tag namespace; they have no factory.
pub struct ComponentRegistry {
    factories: RwLock<FxHashMap<String, Arc<dyn ComponentFactory>>>,
    native_tags: RwLock<FxHashSet<String>>,
    scripts: RwLock<FxHashMap<String, String>>,
    loader: ScriptLoader,
}

impl ComponentRegistry {
    pub fn new(loader: ScriptLoader) -> Self {
        Self {
            factories: RwLock::new(FxHashMap::default()),
            native_tags: RwLock::new(FxHashSet::default()),
            scripts: RwLock::new(FxHashMap::default()),
            loader,
        }
    }

    /// Registers a framework component under its factory tag.
    pub fn register(&self, factory: Arc<dyn ComponentFactory>) {
        self.factories
            .write()
            .unwrap()
            .insert(factory.tag().to_owned(), factory);
    }

    /// Registers a native custom-element tag.
    pub fn register_native(&self, tag: impl Into<String>) {
        self.native_tags.write().unwrap().insert(tag.into());
    }

    /// Registers a lazily-loaded implementation: the script at `url` registers the
    /// factory for `tag` as a side effect of loading.
    pub fn register_script(&self, tag: impl Into<String>, url: impl Into<String>) {
        self.scripts.write().unwrap().insert(tag.into(), url.into());
    }

    /// Returns the factory registered for `tag`, if its implementation is loaded.
    pub fn resolve(&self, tag: &str) -> Option<Arc<dyn ComponentFactory>> {
        self.factories.read().unwrap().get(tag).cloned()
    }

    /// Ensures the implementations of the given tags are loaded.
    ///
    /// Tags registered with a script URL are fetched through the deduplicating
    /// [ScriptLoader]; tags that are already loaded (or unknown) are skipped.
    pub async fn load_components<'a>(
        &self,
        tags: impl IntoIterator<Item = &'a str>,
    ) -> Result<(), ComponentError> {
        let urls: Vec<String> = {
            let factories = self.factories.read().unwrap();
            let scripts = self.scripts.read().unwrap();
            tags.into_iter()
                .filter(|tag| !factories.contains_key(*tag))
                .filter_map(|tag| scripts.get(tag).cloned())
                .collect()
        };
        for url in urls {
            self.loader
                .load(&url)
                .await
                .map_err(|e| ComponentError::Load(ClientError::msg(e.to_string())))?;
        }
        Ok(())
    }
}

impl ComponentCatalog for ComponentRegistry {
    fn has_component(&self, tag: &str) -> bool {
        self.factories.read().unwrap().contains_key(tag)
            || self.native_tags.read().unwrap().contains(tag)
            || self.scripts.read().unwrap().contains_key(tag)
    }

    fn is_registered_native_component(&self, tag: &str) -> bool {
        self.native_tags.read().unwrap().contains(tag)
    }
}
