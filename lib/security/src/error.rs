use graphbind_common::error::ClientError;

/// An error raised by the component permission gate.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PermissionGateError {
    /// A synchronous permission check ran before the tag was preloaded.
    ///
    /// This indicates a sequencing bug in the caller: `load_permitted_components` must
    /// complete for every referenced tag before the resolver asks synchronously. It is
    /// intentionally not recoverable inline.
    #[error(
        "permission for component <{0}> was checked before being preloaded; \
         call load_permitted_components first"
    )]
    NotPreloaded(String),
    /// The permission backend failed.
    #[error(transparent)]
    Client(#[from] ClientError),
}
