use crate::bind::bind_arguments;
use crate::context::QueryContext;
use crate::data_query::{Arguments, SparqlDataQuery, SparqlParam};
use crate::error::{QueryEvaluationError, QueryValidationError};
use crate::lucene::{make_lucene_query, TokenizationDefaults};
use crate::Bindings;
use async_trait::async_trait;
use graphbind_common::error::ClientError;
use graphbind_model::{Literal, Term};
use spargebra::Query;
use std::collections::HashMap;

/// Executes SPARQL SELECT queries against a repository.
///
/// Implemented by the platform's HTTP SPARQL endpoint client; tests substitute an
/// in-memory implementation.
#[async_trait]
pub trait SparqlClient: Send + Sync {
    /// Evaluates `query` against the repository selected by `context` and returns the
    /// binding rows in server order.
    async fn select(
        &self,
        query: &Query,
        context: &QueryContext,
    ) -> Result<Bindings, ClientError>;
}

/// Parses the query, binds the arguments into its WHERE clause, and executes it.
///
/// Token-typed arguments are turned into lucene query strings first; the per-parameter
/// escape/tokenize flags fall back to [TokenizationDefaults] resolved from the parsed
/// query.
pub(crate) async fn fetch_sparql(
    client: &dyn SparqlClient,
    query: &SparqlDataQuery,
    args: &Arguments,
    context: &QueryContext,
) -> Result<Bindings, QueryEvaluationError> {
    let mut parsed = Query::parse(&query.query, None)?;

    let mut bound: HashMap<String, Term> = HashMap::with_capacity(args.len());
    for (name, term) in args {
        let declared = query
            .params
            .as_ref()
            .and_then(|params| params.get(name));
        match declared {
            Some(SparqlParam::Token(token)) => {
                let Term::Literal(literal) = term else {
                    return Err(QueryValidationError::TokenNotAString(name.clone()).into());
                };
                let defaults = TokenizationDefaults::resolve(&parsed, name);
                let escape = token.escape_lucene_syntax.unwrap_or(defaults.escape);
                let tokenize = token.tokenize_lucene_query.unwrap_or(defaults.tokenize);
                let lucene = make_lucene_query(literal.value(), escape, tokenize);
                bound.insert(name.clone(), Term::from(Literal::new_simple_literal(lucene)));
            }
            _ => {
                bound.insert(name.clone(), term.clone());
            }
        }
    }

    bind_arguments(&mut parsed, &bound);
    Ok(client.select(&parsed, context).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_query::TokenSparqlParam;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Records the query it receives and returns no rows.
    #[derive(Default)]
    struct RecordingClient {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SparqlClient for RecordingClient {
        async fn select(
            &self,
            query: &Query,
            _context: &QueryContext,
        ) -> Result<Bindings, ClientError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn binds_token_argument_as_lucene_query() {
        let client = RecordingClient::default();
        let query = SparqlDataQuery {
            query: "PREFIX bds: <http://www.bigdata.com/rdf/search#> \
                    SELECT ?s WHERE { ?s bds:search ?__token__ }"
                .to_owned(),
            params: Some(BTreeMap::from([(
                "__token__".to_owned(),
                SparqlParam::Token(TokenSparqlParam::default()),
            )])),
        };
        let args = Arguments::from([(
            "__token__".to_owned(),
            Term::from(Literal::new_simple_literal("semantic web")),
        )]);

        fetch_sparql(&client, &query, &args, &QueryContext::new())
            .await
            .unwrap();

        let executed = client.queries.lock().unwrap();
        // Escaped and tokenized for prefix search, per the bds: defaults.
        assert!(executed[0].contains("semantic web*"), "{}", executed[0]);
        assert!(!executed[0].contains("?__token__"), "{}", executed[0]);
    }

    #[tokio::test]
    async fn non_literal_token_argument_is_a_validation_error() {
        let client = RecordingClient::default();
        let query = SparqlDataQuery {
            query: "SELECT ?s WHERE { ?s ?p ?__token__ }".to_owned(),
            params: Some(BTreeMap::from([(
                "__token__".to_owned(),
                SparqlParam::Token(TokenSparqlParam::default()),
            )])),
        };
        let args = Arguments::from([(
            "__token__".to_owned(),
            Term::from(graphbind_model::NamedNode::new("http://example.com/x").unwrap()),
        )]);

        let error = fetch_sparql(&client, &query, &args, &QueryContext::new())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            QueryEvaluationError::Validation(QueryValidationError::TokenNotAString(_))
        ));
    }

    #[tokio::test]
    async fn syntax_error_propagates() {
        let client = RecordingClient::default();
        let query = SparqlDataQuery {
            query: "SELECT ?s WHERE {".to_owned(),
            params: None,
        };
        let error = fetch_sparql(&client, &query, &Arguments::new(), &QueryContext::new())
            .await
            .unwrap_err();
        assert!(matches!(error, QueryEvaluationError::Syntax(_)));
    }
}
