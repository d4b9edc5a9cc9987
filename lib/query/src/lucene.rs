use spargebra::algebra::{Expression, GraphPattern};
use spargebra::term::TermPattern;
use spargebra::Query;

/// Namespace of the Blazegraph full-text search vocabulary.
const BDS_NAMESPACE: &str = "http://www.bigdata.com/rdf/search#";

/// Lucene processing defaults for a token parameter, resolved from the query it binds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizationDefaults {
    pub escape: bool,
    pub tokenize: bool,
}

impl TokenizationDefaults {
    /// Resolves the defaults for the token bound to `variable` in `query`.
    ///
    /// When the variable feeds a full-text search predicate (object position of a predicate
    /// in the `bds:` namespace), the token is both escaped and tokenized for prefix search;
    /// otherwise only escaping is applied. Explicit per-parameter flags override these.
    pub fn resolve(query: &Query, variable: &str) -> Self {
        let pattern = match query {
            Query::Select { pattern, .. }
            | Query::Construct { pattern, .. }
            | Query::Describe { pattern, .. }
            | Query::Ask { pattern, .. } => pattern,
        };
        let tokenize = feeds_search_predicate(pattern, variable);
        Self {
            escape: true,
            tokenize,
        }
    }
}

fn feeds_search_predicate(pattern: &GraphPattern, variable: &str) -> bool {
    let mut found = false;
    visit_patterns(pattern, &mut |p| {
        if let GraphPattern::Bgp { patterns } = p {
            found |= patterns.iter().any(|triple| {
                matches!(&triple.object, TermPattern::Variable(v) if v.as_str() == variable)
                    && matches!(
                        &triple.predicate,
                        spargebra::term::NamedNodePattern::NamedNode(p)
                            if p.as_str().starts_with(BDS_NAMESPACE)
                    )
            });
        }
    });
    found
}

fn visit_patterns(pattern: &GraphPattern, visit: &mut impl FnMut(&GraphPattern)) {
    visit(pattern);
    match pattern {
        GraphPattern::Bgp { .. } | GraphPattern::Path { .. } | GraphPattern::Values { .. } => {}
        GraphPattern::Join { left, right }
        | GraphPattern::Union { left, right }
        | GraphPattern::Minus { left, right }
        | GraphPattern::LeftJoin { left, right, .. } => {
            visit_patterns(left, visit);
            visit_patterns(right, visit);
        }
        GraphPattern::Filter { expr, inner } => {
            if let Expression::Exists(pattern) = expr {
                visit_patterns(pattern, visit);
            }
            visit_patterns(inner, visit);
        }
        GraphPattern::Graph { inner, .. }
        | GraphPattern::Extend { inner, .. }
        | GraphPattern::OrderBy { inner, .. }
        | GraphPattern::Group { inner, .. }
        | GraphPattern::Service { inner, .. }
        | GraphPattern::Project { inner, .. }
        | GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner }
        | GraphPattern::Slice { inner, .. } => visit_patterns(inner, visit),
    }
}

/// Characters lucene treats as query syntax.
const LUCENE_SPECIAL_CHARACTERS: &str = "+-&|!(){}[]^\"~*?:\\/";

/// Escapes lucene query syntax in a single token with backslashes.
pub fn escape_lucene_syntax(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len());
    for c in token.chars() {
        if LUCENE_SPECIAL_CHARACTERS.contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Turns user input into a lucene query string.
///
/// The input is split on whitespace. With `escape`, each token is escaped and the bare
/// lucene operators `AND`/`OR`/`NOT` are dropped. With `tokenize`, a `*` is appended to the
/// final token so the last word matches as a prefix while the user is still typing.
pub fn make_lucene_query(input: &str, escape: bool, tokenize: bool) -> String {
    let mut tokens: Vec<String> = Vec::new();
    for token in input.split_whitespace() {
        if escape {
            if matches!(token, "AND" | "OR" | "NOT") {
                continue;
            }
            tokens.push(escape_lucene_syntax(token));
        } else {
            tokens.push(token.to_owned());
        }
    }
    if tokenize {
        if let Some(last) = tokens.last_mut() {
            last.push('*');
        }
    }
    tokens.join(" ")
}
