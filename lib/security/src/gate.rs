use crate::cache::ComponentPermissionCache;
use crate::error::PermissionGateError;
use async_trait::async_trait;
use futures::future::try_join_all;
use graphbind_common::error::ClientError;
use graphbind_components::ComponentCatalog;
use std::collections::HashSet;
use std::sync::Arc;

/// Prefix of the permission strings guarding component visibility.
const COMPONENT_VIEW_PERMISSION_PREFIX: &str = "ui:component:view:";

/// Checks permission strings against the platform's security backend.
#[async_trait]
pub trait PermissionService: Send + Sync {
    async fn is_permitted(&self, permission: &str) -> Result<bool, ClientError>;
}

/// Security settings of the UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecurityConfig {
    /// When disabled, the gate is a no-op and every component is permitted.
    pub component_based_security: bool,
}

/// Decides which custom components the current principal may see.
pub struct PermissionGate {
    config: SecurityConfig,
    service: Arc<dyn PermissionService>,
    catalog: Arc<dyn ComponentCatalog>,
    cache: Arc<ComponentPermissionCache>,
}

impl PermissionGate {
    pub fn new(
        config: SecurityConfig,
        service: Arc<dyn PermissionService>,
        catalog: Arc<dyn ComponentCatalog>,
        cache: Arc<ComponentPermissionCache>,
    ) -> Self {
        Self {
            config,
            service,
            catalog,
            cache,
        }
    }

    /// Whether component-based security is enabled at all.
    pub fn is_component_based_security_enabled(&self) -> bool {
        self.config.component_based_security
    }

    /// Resolves which of the given tags are permitted, warming the cache.
    ///
    /// With security disabled or an empty input, the full input set is returned without
    /// consulting the backend. Otherwise every tag that names a known registered component
    /// is checked concurrently (one backend call per tag, joined all-or-error) and the
    /// permitted subset is returned. Unknown tags are excluded silently; they are handled
    /// elsewhere, e.g. as native HTML custom elements.
    pub async fn load_permitted_components(
        &self,
        tags: &HashSet<String>,
    ) -> Result<HashSet<String>, PermissionGateError> {
        if !self.config.component_based_security || tags.is_empty() {
            return Ok(tags.clone());
        }

        let known: Vec<&String> = tags
            .iter()
            .filter(|tag| self.catalog.has_component(tag))
            .collect();
        tracing::debug!(
            requested = tags.len(),
            known = known.len(),
            "checking component view permissions"
        );
        let checks = known.iter().map(|tag| {
            let service = Arc::clone(&self.service);
            let permission = component_view_permission(tag);
            async move { service.is_permitted(&permission).await }
        });
        let results = try_join_all(checks).await?;

        let mut permitted = HashSet::new();
        for (tag, allowed) in known.into_iter().zip(results) {
            self.cache.insert(tag.clone(), allowed);
            if allowed {
                permitted.insert(tag.clone());
            }
        }
        Ok(permitted)
    }

    /// Synchronously checks whether `tag` may be instantiated.
    ///
    /// Requires the tag to have been preloaded through
    /// [load_permitted_components](Self::load_permitted_components) unless security is
    /// disabled or the tag is not a known registered component. A cache miss is a fatal
    /// contract violation, not a silent default.
    pub fn is_component_permitted(&self, tag: &str) -> Result<bool, PermissionGateError> {
        if !self.config.component_based_security || !self.catalog.has_component(tag) {
            return Ok(true);
        }
        self.cache
            .get(tag)
            .ok_or_else(|| PermissionGateError::NotPreloaded(tag.to_owned()))
    }
}

/// Builds the permission string for a component tag: dashes become colons so tags slot
/// into the platform's hierarchical permission syntax.
fn component_view_permission(tag: &str) -> String {
    format!(
        "{COMPONENT_VIEW_PERMISSION_PREFIX}{}",
        tag.replace('-', ":")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StaticCatalog {
        known: Vec<&'static str>,
        native: Vec<&'static str>,
    }

    impl ComponentCatalog for StaticCatalog {
        fn has_component(&self, tag: &str) -> bool {
            self.known.contains(&tag) || self.native.contains(&tag)
        }

        fn is_registered_native_component(&self, tag: &str) -> bool {
            self.native.contains(&tag)
        }
    }

    struct RecordingService {
        allow: Vec<&'static str>,
        calls: AtomicUsize,
        permissions: Mutex<Vec<String>>,
    }

    impl RecordingService {
        fn allowing(allow: Vec<&'static str>) -> Self {
            Self {
                allow,
                calls: AtomicUsize::new(0),
                permissions: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PermissionService for RecordingService {
        async fn is_permitted(&self, permission: &str) -> Result<bool, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.permissions.lock().unwrap().push(permission.to_owned());
            Ok(self.allow.iter().any(|p| *p == permission))
        }
    }

    fn gate(
        enabled: bool,
        service: Arc<RecordingService>,
        catalog: StaticCatalog,
    ) -> PermissionGate {
        PermissionGate::new(
            SecurityConfig {
                component_based_security: enabled,
            },
            service,
            Arc::new(catalog),
            Arc::new(ComponentPermissionCache::new()),
        )
    }

    fn tags(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    #[tokio::test]
    async fn disabled_security_permits_everything_without_backend_calls() {
        let service = Arc::new(RecordingService::allowing(vec![]));
        let gate = gate(
            false,
            Arc::clone(&service),
            StaticCatalog {
                known: vec!["mp-x"],
                native: vec![],
            },
        );

        let permitted = gate.load_permitted_components(&tags(&["mp-x"])).await.unwrap();
        assert_eq!(permitted, tags(&["mp-x"]));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert_eq!(gate.is_component_permitted("mp-x").unwrap(), true);
    }

    #[tokio::test]
    async fn checks_known_tags_and_returns_permitted_subset() {
        let service = Arc::new(RecordingService::allowing(vec![
            "ui:component:view:mp:widget",
        ]));
        let gate = gate(
            true,
            Arc::clone(&service),
            StaticCatalog {
                known: vec!["mp-widget", "mp-secret"],
                native: vec![],
            },
        );

        let permitted = gate
            .load_permitted_components(&tags(&["mp-widget", "mp-secret", "fancy-unknown"]))
            .await
            .unwrap();

        assert_eq!(permitted, tags(&["mp-widget"]));
        // The unknown tag is neither checked nor part of the result.
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
        let permissions = service.permissions.lock().unwrap();
        assert!(permissions
            .iter()
            .all(|p| p.starts_with("ui:component:view:mp:")));

        assert_eq!(gate.is_component_permitted("mp-widget").unwrap(), true);
        assert_eq!(gate.is_component_permitted("mp-secret").unwrap(), false);
        // Unknown tags are always permitted synchronously.
        assert_eq!(gate.is_component_permitted("fancy-unknown").unwrap(), true);
    }

    #[tokio::test]
    async fn empty_input_short_circuits() {
        let service = Arc::new(RecordingService::allowing(vec![]));
        let gate = gate(
            true,
            Arc::clone(&service),
            StaticCatalog {
                known: vec!["mp-x"],
                native: vec![],
            },
        );

        let permitted = gate.load_permitted_components(&HashSet::new()).await.unwrap();
        assert!(permitted.is_empty());
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn sync_check_before_warm_up_is_fatal() {
        let service = Arc::new(RecordingService::allowing(vec![]));
        let gate = gate(
            true,
            service,
            StaticCatalog {
                known: vec!["mp-x"],
                native: vec![],
            },
        );

        let error = gate.is_component_permitted("mp-x").unwrap_err();
        assert!(matches!(error, PermissionGateError::NotPreloaded(tag) if tag == "mp-x"));
    }
}
