use crate::data_query::LOOKUP_SUBJECT_VARIABLE;
use graphbind_common::error::ClientError;
use spargebra::SparqlSyntaxError;

/// A query or parameter contract violation.
///
/// Validation errors are ordinary values: [crate::validate_query] and
/// [crate::validate_parameters] return them instead of throwing so callers (e.g. the query
/// template editors) can aggregate and display them next to the offending input.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryValidationError {
    /// The SPARQL query text does not parse.
    #[error(transparent)]
    Syntax(#[from] SparqlSyntaxError),
    /// The query parses but is not a SELECT query.
    #[error("the query must be a SELECT query")]
    NotASelectQuery,
    /// SELECT queries must project explicit variables.
    #[error("SELECT queries with a wildcard (*) projection are not supported")]
    WildcardProjection,
    /// One or more requested output variables are not projected by the query.
    #[error("the query does not project the output variable(s): {}", .0.join(", "))]
    MissingProjection(Vec<String>),
    /// A lookup query binds exactly one output variable.
    #[error(
        "a lookup query binds exactly the output variable `{LOOKUP_SUBJECT_VARIABLE}`, got: {}",
        .0.join(", ")
    )]
    InvalidLookupProjection(Vec<String>),
    /// A required parameter has no corresponding argument.
    #[error("the required parameter `{0}` is missing an argument")]
    MissingArgument(String),
    /// An argument was supplied for a variable the query does not declare.
    #[error("the argument `{0}` does not correspond to a declared parameter")]
    UndeclaredArgument(String),
    /// Arguments were supplied to a query without a parameter contract.
    #[error("arguments were supplied but the query declares no parameters")]
    NoDeclaredParameters,
    /// A `token` parameter requires a string-typed literal argument.
    #[error("the token argument `{0}` must be a literal with the xsd:string datatype")]
    TokenNotAString(String),
    /// A `bind` parameter's argument does not unify with the declared datatype.
    #[error("the argument `{name}` does not unify with the declared datatype {expected}")]
    DatatypeMismatch { name: String, expected: String },
    /// A lookup execution has neither a token argument nor a default term.
    #[error("no search term: the lookup query has neither a token argument nor a default term")]
    NoSearchTerm,
    /// The lookup token argument must be an RDF literal.
    #[error("the lookup token argument must be an RDF literal")]
    TokenNotALiteral,
}

/// A query execution error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryEvaluationError {
    /// An error in SPARQL parsing.
    #[error(transparent)]
    Syntax(#[from] SparqlSyntaxError),
    /// A contract violation detected while preparing the execution.
    #[error(transparent)]
    Validation(#[from] QueryValidationError),
    /// An error from the underlying client backend.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The backend returned a result the query layer cannot represent.
    #[error("the service returned an invalid result: {0}")]
    InvalidResult(String),
}
