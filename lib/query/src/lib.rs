//! The typed-query dispatch layer of the platform.
//!
//! Components declare the data they need as a [DataQuery]: either a parametrized SPARQL
//! SELECT query or an entity-lookup (reconciliation) query. This crate validates query
//! definitions against declared output variables, validates caller-supplied argument maps
//! against the per-query parameter contract, and executes both query kinds against
//! pluggable client backends, normalizing results into a uniform tabular binding shape
//! ([sparesults::QuerySolution] rows).
//!
//! Validation failures are returned as values so callers can aggregate and display them;
//! execution failures (syntax errors, transport errors) surface through
//! [error::QueryEvaluationError].

mod bind;
mod context;
mod data_query;
pub mod error;
mod executor;
mod lookup;
mod lucene;
mod sparql;
mod validate;

pub use bind::bind_arguments;
pub use context::QueryContext;
pub use data_query::{
    Arguments, BindSparqlParam, DataQuery, LookupDataQuery, SparqlDataQuery, SparqlParam,
    TokenSparqlParam, LOOKUP_SUBJECT_VARIABLE, LOOKUP_TOKEN_VARIABLE,
};
pub use executor::QueryExecutor;
pub use lookup::{
    CandidateDataset, EntityType, LookupService, ReconciliationCandidate, ReconciliationQuery,
    ReconciliationRequest, ReconciliationResponse, ReconciliationResult,
};
pub use lucene::{escape_lucene_syntax, make_lucene_query, TokenizationDefaults};
pub use sparql::SparqlClient;
pub use validate::{validate_parameters, validate_query};

/// The tabular result shape shared by both query kinds: rows in discovery order.
pub type Bindings = Vec<sparesults::QuerySolution>;
