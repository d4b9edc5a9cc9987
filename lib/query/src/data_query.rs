use graphbind_model::Term;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// The variable name under which callers pass the search token of a lookup query.
pub const LOOKUP_TOKEN_VARIABLE: &str = "__token__";

/// The single output variable a lookup query binds: the reconciled subject.
pub const LOOKUP_SUBJECT_VARIABLE: &str = "subject";

/// Arguments supplied by a caller when executing a query: variable name to bound term.
///
/// Every key must correspond to a declared parameter (SPARQL queries) or to
/// [LOOKUP_TOKEN_VARIABLE] (lookup queries); [crate::validate_parameters] rejects anything
/// else.
pub type Arguments = HashMap<String, Term>;

/// A declarative data query, as authored in component markup or query templates.
///
/// The JSON representation carries a `type` discriminant. Deserializing an unrecognized
/// discriminant fails with a descriptive serde error, so an invalid query definition never
/// reaches the dispatch sites; within the crate every dispatch is an exhaustive `match`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataQuery {
    /// A parametrized SPARQL SELECT query.
    Sparql(SparqlDataQuery),
    /// An entity-lookup (reconciliation) query.
    Lookup(LookupDataQuery),
}

/// A SPARQL SELECT query with an optional parameter contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SparqlDataQuery {
    /// The SPARQL query text.
    pub query: String,
    /// Declared parameters, keyed by the variable name they bind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, SparqlParam>>,
}

/// An entity-lookup query resolved through a reconciliation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LookupDataQuery {
    /// Search term used when the caller does not supply a token argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_term: Option<String>,
    /// Maximum number of candidates to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Restricts candidates to this entity type IRI; also selects which of a candidate's
    /// types populates the `type`/`typeLabel` bindings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    /// Targets a specific named lookup service instead of the platform default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_service_name: Option<String>,
    /// Preferred language tag forwarded to the reconciliation service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
}

/// A declared parameter of a [SparqlDataQuery].
///
/// The declared `type` constrains the runtime shape of the bound argument; a mismatch is
/// reported by [crate::validate_parameters], never a crash at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SparqlParam {
    /// Plain value binding: the argument must unify with the declared datatype.
    Bind(BindSparqlParam),
    /// Full-text search token binding with lucene-style escaping/tokenization.
    Token(TokenSparqlParam),
}

impl SparqlParam {
    /// Checks whether an argument for this parameter must be supplied.
    pub fn required(&self) -> bool {
        match self {
            SparqlParam::Bind(param) => param.required,
            SparqlParam::Token(param) => param.required,
        }
    }
}

/// Contract of a `bind` parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BindSparqlParam {
    #[serde(default)]
    pub required: bool,
    /// Expected datatype IRI (full form or `xsd:` shorthand). `xsd:anyURI` requires an IRI
    /// argument; any other datatype requires a literal whose datatype IRI matches exactly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
}

/// Contract of a `token` parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TokenSparqlParam {
    #[serde(default)]
    pub required: bool,
    /// Overrides the escaping default inferred from the query's WHERE clause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escape_lucene_syntax: Option<bool>,
    /// Overrides the tokenization default inferred from the query's WHERE clause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenize_lucene_query: Option<bool>,
}
