use crate::data_query::{Arguments, LookupDataQuery, LOOKUP_TOKEN_VARIABLE};
use crate::error::{QueryEvaluationError, QueryValidationError};
use crate::Bindings;
use async_trait::async_trait;
use graphbind_common::error::ClientError;
use graphbind_model::{boolean_literal, double_literal, Literal, NamedNode, Term, Variable};
use serde::{Deserialize, Serialize};
use sparesults::QuerySolution;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

/// Sub-request id used for the single query of a lookup dispatch.
const SINGLE_QUERY_ID: &str = "q0";

/// One query of a reconciliation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationQuery {
    /// The search text.
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Entity type filter, forwarded to the service.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
}

/// A batch of reconciliation queries keyed by sub-request id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReconciliationRequest {
    pub queries: BTreeMap<String, ReconciliationQuery>,
}

impl ReconciliationRequest {
    /// Creates a request carrying a single query.
    pub fn single(query: ReconciliationQuery) -> Self {
        Self {
            queries: BTreeMap::from([(SINGLE_QUERY_ID.to_owned(), query)]),
        }
    }
}

/// The per-sub-request result list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub result: Vec<ReconciliationCandidate>,
}

/// Response of a reconciliation service: sub-request id to result list.
pub type ReconciliationResponse = BTreeMap<String, ReconciliationResult>;

/// One matched entity returned by a reconciliation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationCandidate {
    /// IRI of the matched entity.
    pub id: String,
    /// Human-readable label.
    pub name: String,
    pub score: f64,
    /// Whether the service considers this an exact match.
    #[serde(rename = "match")]
    pub is_match: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<EntityType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<CandidateDataset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDataset {
    pub id: String,
    pub name: String,
}

/// Resolves entity-lookup queries against a reconciliation endpoint.
#[async_trait]
pub trait LookupService: Send + Sync {
    /// Sends `request` to the default service, or to the named one when `service_name` is
    /// given.
    async fn reconcile(
        &self,
        request: &ReconciliationRequest,
        service_name: Option<&str>,
    ) -> Result<ReconciliationResponse, ClientError>;
}

/// The variables every lookup binding row is built over.
static LOOKUP_VARIABLES: LazyLock<Arc<[Variable]>> = LazyLock::new(|| {
    [
        "subject",
        "label",
        "score",
        "match",
        "type",
        "typeLabel",
        "datasetId",
        "datasetLabel",
        "description",
    ]
    .into_iter()
    .map(Variable::new_unchecked)
    .collect()
});

/// Executes a lookup query and normalizes the response into binding rows.
pub(crate) async fn fetch_lookup(
    service: &dyn LookupService,
    query: &LookupDataQuery,
    args: &Arguments,
) -> Result<Bindings, QueryEvaluationError> {
    let token = match args.get(LOOKUP_TOKEN_VARIABLE) {
        Some(Term::Literal(literal)) => literal.value().to_owned(),
        Some(_) => return Err(QueryValidationError::TokenNotALiteral.into()),
        None => match &query.default_term {
            Some(default_term) => {
                tracing::warn!(
                    default_term = %default_term,
                    "no token argument supplied, falling back to the query's default term"
                );
                default_term.clone()
            }
            None => return Err(QueryValidationError::NoSearchTerm.into()),
        },
    };

    let request = ReconciliationRequest::single(ReconciliationQuery {
        query: token,
        limit: query.limit,
        entity_type: query.entity_type.clone(),
        preferred_language: query.preferred_language.clone(),
    });
    let response = service
        .reconcile(&request, query.lookup_service_name.as_deref())
        .await?;

    // Flatten every sub-response, then order by descending score. `sort_by` is stable, so
    // candidates with equal scores keep their response order.
    let mut candidates: Vec<ReconciliationCandidate> = response
        .into_values()
        .flat_map(|result| result.result)
        .collect();
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    if let Some(limit) = query.limit {
        candidates.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    }

    candidates
        .into_iter()
        .map(|candidate| candidate_to_solution(candidate, query.entity_type.as_deref()))
        .collect()
}

fn candidate_to_solution(
    candidate: ReconciliationCandidate,
    entity_type_filter: Option<&str>,
) -> Result<QuerySolution, QueryEvaluationError> {
    let subject = NamedNode::new(&candidate.id).map_err(|e| {
        QueryEvaluationError::InvalidResult(format!(
            "candidate id `{}` is not an IRI: {e}",
            candidate.id
        ))
    })?;

    let selected_type = candidate.types.as_ref().and_then(|types| {
        entity_type_filter
            .and_then(|filter| types.iter().find(|t| t.id == filter))
            .or_else(|| types.first())
    });
    let (type_iri, type_label) = match selected_type {
        Some(entity_type) => {
            let iri = NamedNode::new(&entity_type.id).map_err(|e| {
                QueryEvaluationError::InvalidResult(format!(
                    "candidate type `{}` is not an IRI: {e}",
                    entity_type.id
                ))
            })?;
            (
                Some(Term::from(iri)),
                Some(Term::from(Literal::new_simple_literal(&entity_type.name))),
            )
        }
        None => (None, None),
    };

    let values = vec![
        Some(Term::from(subject)),
        Some(Term::from(Literal::new_simple_literal(&candidate.name))),
        Some(Term::from(double_literal(candidate.score))),
        Some(Term::from(boolean_literal(candidate.is_match))),
        type_iri,
        type_label,
        candidate
            .dataset
            .as_ref()
            .map(|d| Term::from(Literal::new_simple_literal(&d.id))),
        candidate
            .dataset
            .as_ref()
            .map(|d| Term::from(Literal::new_simple_literal(&d.name))),
        candidate
            .description
            .as_ref()
            .map(|d| Term::from(Literal::new_simple_literal(d))),
    ];
    Ok(QuerySolution::from((
        Arc::clone(&LOOKUP_VARIABLES),
        values,
    )))
}
