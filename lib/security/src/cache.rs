use rustc_hash::FxHashMap;
use std::sync::RwLock;

/// Resolved component permissions for the current principal, keyed by tag.
///
/// The cache is created at application start and passed into the gate explicitly; entries
/// are written once per tag and never invalidated for the session, so reads after warm-up
/// are stable. [clear](ComponentPermissionCache::clear) exists for session changes
/// (logout/login) only.
#[derive(Debug, Default)]
pub struct ComponentPermissionCache {
    permissions: RwLock<FxHashMap<String, bool>>,
}

impl ComponentPermissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the resolved permission for `tag`, or `None` when it was never checked.
    pub fn get(&self, tag: &str) -> Option<bool> {
        self.permissions.read().unwrap().get(tag).copied()
    }

    /// Stores the resolved permission for `tag`. Re-inserting the same tag is idempotent.
    pub fn insert(&self, tag: impl Into<String>, permitted: bool) {
        self.permissions.write().unwrap().insert(tag.into(), permitted);
    }

    /// Drops every resolved entry. Only meant for session changes.
    pub fn clear(&self) {
        self.permissions.write().unwrap().clear();
    }
}
