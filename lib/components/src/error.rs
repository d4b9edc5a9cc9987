use graphbind_common::error::ClientError;

/// An error raised by a component implementation or the component infrastructure.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ComponentError {
    /// The factory failed to build an instance from the given props.
    #[error("failed to instantiate <{tag}>: {message}")]
    Instantiation { tag: String, message: String },
    /// A lifecycle method or `render` failed.
    #[error("<{tag}> failed to render: {message}")]
    Render { tag: String, message: String },
    /// Loading a component implementation failed.
    #[error(transparent)]
    Load(#[from] ClientError),
}

impl ComponentError {
    pub fn instantiation(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Instantiation {
            tag: tag.into(),
            message: message.into(),
        }
    }

    pub fn render(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            tag: tag.into(),
            message: message.into(),
        }
    }
}
