/// Execution context of a single query dispatch.
///
/// Carries the target-repository selection through to the SPARQL client; an absent
/// repository means the platform's default repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryContext {
    pub repository: Option<String>,
}

impl QueryContext {
    /// Creates a context targeting the default repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context targeting the named repository.
    pub fn with_repository(repository: impl Into<String>) -> Self {
        Self {
            repository: Some(repository.into()),
        }
    }
}
