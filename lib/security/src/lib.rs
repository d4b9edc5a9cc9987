//! The component permission gate.
//!
//! Before markup resolution instantiates a custom component, the current principal must be
//! allowed to see it. [PermissionGate::load_permitted_components] warms an explicit
//! [ComponentPermissionCache] by checking every referenced tag against the platform's
//! permission backend concurrently; afterwards [PermissionGate::is_component_permitted]
//! answers synchronously from the cache. Checking a tag that was never preloaded is a
//! caller-side sequencing bug and fails loudly instead of defaulting to allow or deny.

mod cache;
pub mod error;
mod gate;

pub use cache::ComponentPermissionCache;
pub use gate::{PermissionGate, PermissionService, SecurityConfig};
