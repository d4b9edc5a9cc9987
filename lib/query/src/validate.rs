use crate::data_query::{
    Arguments, DataQuery, LookupDataQuery, SparqlDataQuery, SparqlParam, LOOKUP_SUBJECT_VARIABLE,
    LOOKUP_TOKEN_VARIABLE,
};
use crate::error::QueryValidationError;
use graphbind_common::RangeSet;
use graphbind_model::vocab::xsd;
use graphbind_model::{is_string_literal, Term, Variable};
use spargebra::algebra::GraphPattern;
use spargebra::Query;
use std::borrow::Cow;

const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";

/// Validates a query definition against the output variables its consumer expects.
///
/// SPARQL queries must parse, be SELECT queries without a wildcard projection, and project
/// every requested output variable. Lookup queries bind exactly the fixed
/// [LOOKUP_SUBJECT_VARIABLE]; their field types are already enforced at the
/// deserialization boundary.
pub fn validate_query(
    query: &DataQuery,
    output_variables: &[&str],
) -> Result<(), QueryValidationError> {
    match query {
        DataQuery::Sparql(sparql) => validate_sparql_query(sparql, output_variables),
        DataQuery::Lookup(lookup) => validate_lookup_query(lookup, output_variables),
    }
}

/// Validates a caller-supplied argument map against the query's parameter contract.
pub fn validate_parameters(
    query: &DataQuery,
    args: &Arguments,
) -> Result<(), QueryValidationError> {
    match query {
        DataQuery::Sparql(sparql) => validate_sparql_parameters(sparql, args),
        DataQuery::Lookup(lookup) => validate_lookup_parameters(lookup, args),
    }
}

fn validate_sparql_query(
    query: &SparqlDataQuery,
    output_variables: &[&str],
) -> Result<(), QueryValidationError> {
    let parsed = Query::parse(&query.query, None)?;
    let Query::Select { pattern, .. } = &parsed else {
        return Err(QueryValidationError::NotASelectQuery);
    };
    if projection_is_wildcard(&query.query) {
        return Err(QueryValidationError::WildcardProjection);
    }

    let projected = projection_variables(pattern);
    let missing: Vec<String> = output_variables
        .iter()
        .filter(|requested| !projected.iter().any(|v| v.as_str() == **requested))
        .map(|requested| (*requested).to_owned())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(QueryValidationError::MissingProjection(missing))
    }
}

fn validate_lookup_query(
    _query: &LookupDataQuery,
    output_variables: &[&str],
) -> Result<(), QueryValidationError> {
    if output_variables == [LOOKUP_SUBJECT_VARIABLE] {
        Ok(())
    } else {
        Err(QueryValidationError::InvalidLookupProjection(
            output_variables.iter().map(|v| (*v).to_owned()).collect(),
        ))
    }
}

fn validate_sparql_parameters(
    query: &SparqlDataQuery,
    args: &Arguments,
) -> Result<(), QueryValidationError> {
    let Some(params) = &query.params else {
        return if args.is_empty() {
            Ok(())
        } else {
            Err(QueryValidationError::NoDeclaredParameters)
        };
    };

    for (name, param) in params {
        if param.required() && !args.contains_key(name) {
            return Err(QueryValidationError::MissingArgument(name.clone()));
        }
    }

    let mut names: Vec<&String> = args.keys().collect();
    names.sort();
    for name in names {
        let term = &args[name];
        match params.get(name) {
            None => return Err(QueryValidationError::UndeclaredArgument(name.clone())),
            Some(SparqlParam::Token(_)) => {
                if !is_string_literal(term) {
                    return Err(QueryValidationError::TokenNotAString(name.clone()));
                }
            }
            Some(SparqlParam::Bind(bind)) => {
                if let Some(datatype) = &bind.datatype {
                    if !argument_unifies_with_datatype(term, datatype) {
                        return Err(QueryValidationError::DatatypeMismatch {
                            name: name.clone(),
                            expected: datatype.clone(),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

fn validate_lookup_parameters(
    query: &LookupDataQuery,
    args: &Arguments,
) -> Result<(), QueryValidationError> {
    let mut names: Vec<&String> = args.keys().collect();
    names.sort();
    for name in names {
        if name != LOOKUP_TOKEN_VARIABLE {
            return Err(QueryValidationError::UndeclaredArgument(name.clone()));
        }
    }
    match args.get(LOOKUP_TOKEN_VARIABLE) {
        Some(Term::Literal(_)) => Ok(()),
        Some(_) => Err(QueryValidationError::TokenNotALiteral),
        None if query.default_term.is_some() => Ok(()),
        None => Err(QueryValidationError::NoSearchTerm),
    }
}

/// Checks whether the argument's effective datatype matches the declared one.
///
/// `xsd:anyURI` unifies with IRI arguments; every other datatype requires a literal whose
/// datatype IRI equals the declared IRI exactly.
fn argument_unifies_with_datatype(term: &Term, declared: &str) -> bool {
    let expanded = expand_datatype(declared);
    if expanded.as_ref() == xsd::ANY_URI.as_str() {
        return matches!(term, Term::NamedNode(_));
    }
    match term {
        Term::Literal(literal) => literal.datatype().as_str() == expanded.as_ref(),
        _ => false,
    }
}

fn expand_datatype(declared: &str) -> Cow<'_, str> {
    match declared.strip_prefix("xsd:") {
        Some(local) => Cow::Owned(format!("{XSD_NAMESPACE}{local}")),
        None => Cow::Borrowed(declared),
    }
}

/// Returns the projection variable list of a SELECT algebra tree.
fn projection_variables(pattern: &GraphPattern) -> &[Variable] {
    match pattern {
        GraphPattern::Project { variables, .. } => variables,
        GraphPattern::Slice { inner, .. }
        | GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner } => projection_variables(inner),
        _ => &[],
    }
}

/// Detects a `*` projection by scanning the text between the outermost SELECT keyword and
/// the start of its WHERE block.
///
/// The parsed algebra cannot distinguish `SELECT *` from an explicit projection of every
/// in-scope variable, so this works on the query text: comments, string literals, and IRIs
/// are masked through a [RangeSet] first, and a `*` only counts at parenthesis depth zero
/// (inside parentheses it is the multiplication operator of an `AS` expression).
fn projection_is_wildcard(query_text: &str) -> bool {
    let masked = masked_regions(query_text);
    let Some(select_end) = find_select_keyword(query_text, &masked) else {
        return false;
    };

    let mut depth = 0usize;
    for (offset, c) in query_text[select_end..].char_indices() {
        let offset = select_end + offset;
        if masked.intersects_range(offset, offset + c.len_utf8()) {
            continue;
        }
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '*' if depth == 0 => return true,
            '{' => break,
            _ => {}
        }
    }
    false
}

/// Finds the end offset of the first unmasked `SELECT` keyword.
fn find_select_keyword(text: &str, masked: &RangeSet) -> Option<usize> {
    let lower = text.to_ascii_lowercase();
    let mut search_from = 0;
    while let Some(position) = lower[search_from..].find("select") {
        let start = search_from + position;
        let end = start + "select".len();
        search_from = end;

        if masked.intersects_range(start, end) {
            continue;
        }
        let boundary_before = start == 0
            || !text[..start]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
        let boundary_after = !text[end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_');
        if boundary_before && boundary_after {
            return Some(end);
        }
    }
    None
}

/// Masks the regions of a SPARQL text that cannot contain projection syntax: comments,
/// string literals (single, double, and triple quoted), and IRI references.
fn masked_regions(text: &str) -> RangeSet {
    let mut masked = RangeSet::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                let end = text[i..]
                    .find('\n')
                    .map(|n| i + n + 1)
                    .unwrap_or(bytes.len());
                masked.insert(i, end);
                i = end;
            }
            quote @ (b'"' | b'\'') => {
                let end = scan_string(bytes, i, quote);
                masked.insert(i, end);
                i = end;
            }
            b'<' => {
                // Distinguish an IRIREF from a comparison operator by looking for the
                // closing `>` before any whitespace.
                match scan_iri(bytes, i) {
                    Some(end) => {
                        masked.insert(i, end);
                        i = end;
                    }
                    None => i += 1,
                }
            }
            _ => i += 1,
        }
    }
    masked
}

fn scan_string(bytes: &[u8], start: usize, quote: u8) -> usize {
    let triple = bytes[start..].len() >= 3 && bytes[start + 1] == quote && bytes[start + 2] == quote;
    let mut i = start + if triple { 3 } else { 1 };
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
            continue;
        }
        if bytes[i] == quote {
            if !triple {
                return i + 1;
            }
            if bytes[i..].len() >= 3 && bytes[i + 1] == quote && bytes[i + 2] == quote {
                return i + 3;
            }
        }
        i += 1;
    }
    bytes.len()
}

fn scan_iri(bytes: &[u8], start: usize) -> Option<usize> {
    for (offset, &b) in bytes[start + 1..].iter().enumerate() {
        match b {
            b'>' => return Some(start + 1 + offset + 1),
            b' ' | b'\t' | b'\r' | b'\n' | b'<' | b'"' => return None,
            _ => {}
        }
    }
    None
}
