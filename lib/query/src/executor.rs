use crate::context::QueryContext;
use crate::data_query::{Arguments, DataQuery};
use crate::error::QueryEvaluationError;
use crate::lookup::LookupService;
use crate::sparql::SparqlClient;
use crate::{lookup, sparql, Bindings};
use std::sync::Arc;

/// Dispatches [DataQuery] executions to the matching client backend.
///
/// Both backends are injected so tests and embedders can substitute their own transports.
/// A query definition is otherwise opaque to callers: they hand it to the executor
/// together with an argument map and receive uniform binding rows back.
#[derive(Clone)]
pub struct QueryExecutor {
    sparql: Arc<dyn SparqlClient>,
    lookup: Arc<dyn LookupService>,
}

impl QueryExecutor {
    pub fn new(sparql: Arc<dyn SparqlClient>, lookup: Arc<dyn LookupService>) -> Self {
        Self { sparql, lookup }
    }

    /// Executes `query` with the given arguments.
    ///
    /// The caller is expected to have run [crate::validate_query] and
    /// [crate::validate_parameters] first; contract violations that can only be detected
    /// during execution still surface as
    /// [QueryEvaluationError::Validation](crate::error::QueryEvaluationError).
    pub async fn fetch_data(
        &self,
        query: &DataQuery,
        args: &Arguments,
        context: &QueryContext,
    ) -> Result<Bindings, QueryEvaluationError> {
        match query {
            DataQuery::Sparql(sparql_query) => {
                sparql::fetch_sparql(self.sparql.as_ref(), sparql_query, args, context).await
            }
            DataQuery::Lookup(lookup_query) => {
                lookup::fetch_lookup(self.lookup.as_ref(), lookup_query, args).await
            }
        }
    }
}
