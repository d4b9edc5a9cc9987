use graphbind_common::error::ClientError;
use graphbind_components::error::ComponentError;
use graphbind_security::error::PermissionGateError;

/// An error raised while parsing or materializing markup.
///
/// Node-scoped variants carry the tag name of the offending element so page authors can
/// find the broken markup; an error that is already of this type is passed through
/// unwrapped.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MarkupError {
    /// The markup text is not well formed.
    #[error("failed to parse markup at offset {position}: {message}")]
    Parse { position: usize, message: String },
    /// An attribute value that looks like JSON does not parse.
    #[error("invalid JSON in attribute `{attribute}` of <{tag}>: {message}")]
    Json {
        tag: String,
        attribute: String,
        message: String,
    },
    /// The element declares a template scope that cannot be extracted.
    #[error("failed to extract the template scope of <{tag}>: {message}")]
    TemplateScope { tag: String, message: String },
    /// A permitted component was referenced before its implementation was loaded.
    #[error("the component <{tag}> is referenced but its implementation is not loaded")]
    ComponentNotLoaded { tag: String },
    /// A component failed to instantiate.
    #[error(transparent)]
    Component(#[from] ComponentError),
    /// The permission gate failed (or was consulted before warm-up).
    #[error(transparent)]
    Permission(#[from] PermissionGateError),
    /// A collaborator (template engine, component loader) failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}
