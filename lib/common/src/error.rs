use std::error::Error;
use std::io;

/// An error raised by a platform collaborator (HTTP transport, SPARQL endpoint,
/// reconciliation service, permission backend...).
///
/// Collaborator traits return this type so callers can treat transport failures uniformly,
/// independent of which backend produced them.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The remote service answered with a non-success status.
    #[error("the service responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl ClientError {
    /// Builds an error from an arbitrary underlying failure.
    #[inline]
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self::Other(error.into())
    }

    /// Builds an error from a printable error message.
    #[inline]
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::Other(msg.into().into())
    }
}
