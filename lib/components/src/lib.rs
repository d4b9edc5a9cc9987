//! The component model of the platform.
//!
//! Markup resolution (in `graphbind-markup`) materializes parsed markup into a tree of
//! [ComponentElement]s. This crate provides the building blocks of that tree: the typed
//! prop values decoded from markup attributes, the [Component]/[ComponentFactory] traits
//! implemented by registered components, the [ComponentRegistry] mapping custom-element
//! tags to factories, the [GuardRegistry] that wraps factories in an error boundary
//! exactly once per tag, and the [ScriptLoader] that deduplicates concurrent
//! implementation loads per URL.

mod component;
mod element;
pub mod error;
mod guard;
mod loader;
mod registry;

pub use component::{Component, ComponentFactory};
pub use element::{
    error_notification, ComponentElement, ComponentInstance, PropMap, PropValue, TemplateScope,
    ERROR_NOTIFICATION_TAG,
};
pub use guard::GuardRegistry;
pub use loader::{ResourceFetcher, ScriptLoader};
pub use registry::{ComponentCatalog, ComponentRegistry};
