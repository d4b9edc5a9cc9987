use graphbind_model::Term;
use spargebra::algebra::{
    AggregateExpression, Expression, GraphPattern, OrderExpression,
};
use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
use spargebra::Query;
use std::collections::HashMap;

/// Binds argument terms into the WHERE clause of a parsed query, in place.
///
/// Every occurrence of a bound variable inside triple patterns, property paths, graph
/// names, service names, and filter/extend expressions is replaced by the argument term.
/// Positions where a ground term would be syntactically invalid (`BOUND(?v)`, the target
/// variable of an `AS`, `VALUES` headers, projections) are left untouched.
pub fn bind_arguments(query: &mut Query, args: &HashMap<String, Term>) {
    if args.is_empty() {
        return;
    }
    match query {
        Query::Select { pattern, .. }
        | Query::Construct { pattern, .. }
        | Query::Describe { pattern, .. }
        | Query::Ask { pattern, .. } => bind_graph_pattern(pattern, args),
    }
}

fn bind_graph_pattern(pattern: &mut GraphPattern, args: &HashMap<String, Term>) {
    match pattern {
        GraphPattern::Bgp { patterns } => {
            for triple in patterns {
                bind_triple_pattern(triple, args);
            }
        }
        GraphPattern::Path {
            subject, object, ..
        } => {
            bind_term_pattern(subject, args);
            bind_term_pattern(object, args);
        }
        GraphPattern::Join { left, right }
        | GraphPattern::Union { left, right }
        | GraphPattern::Minus { left, right } => {
            bind_graph_pattern(left, args);
            bind_graph_pattern(right, args);
        }
        GraphPattern::LeftJoin {
            left,
            right,
            expression,
        } => {
            bind_graph_pattern(left, args);
            bind_graph_pattern(right, args);
            if let Some(expression) = expression {
                bind_expression(expression, args);
            }
        }
        GraphPattern::Filter { expr, inner } => {
            bind_expression(expr, args);
            bind_graph_pattern(inner, args);
        }
        GraphPattern::Graph { name, inner } => {
            bind_named_node_pattern(name, args);
            bind_graph_pattern(inner, args);
        }
        GraphPattern::Extend {
            inner, expression, ..
        } => {
            bind_expression(expression, args);
            bind_graph_pattern(inner, args);
        }
        GraphPattern::Values { .. } => {
            // VALUES blocks carry their own ground bindings.
        }
        GraphPattern::OrderBy { inner, expression } => {
            for order in expression {
                match order {
                    OrderExpression::Asc(expr) | OrderExpression::Desc(expr) => {
                        bind_expression(expr, args);
                    }
                }
            }
            bind_graph_pattern(inner, args);
        }
        GraphPattern::Group {
            inner, aggregates, ..
        } => {
            for (_, aggregate) in aggregates {
                match aggregate {
                    AggregateExpression::CountSolutions { .. } => {}
                    AggregateExpression::FunctionCall { expr, .. } => {
                        bind_expression(expr, args);
                    }
                }
            }
            bind_graph_pattern(inner, args);
        }
        GraphPattern::Service { name, inner, .. } => {
            bind_named_node_pattern(name, args);
            bind_graph_pattern(inner, args);
        }
        GraphPattern::Project { inner, .. }
        | GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner }
        | GraphPattern::Slice { inner, .. } => bind_graph_pattern(inner, args),
    }
}

fn bind_triple_pattern(triple: &mut TriplePattern, args: &HashMap<String, Term>) {
    bind_term_pattern(&mut triple.subject, args);
    bind_named_node_pattern(&mut triple.predicate, args);
    bind_term_pattern(&mut triple.object, args);
}

fn bind_term_pattern(pattern: &mut TermPattern, args: &HashMap<String, Term>) {
    if let TermPattern::Variable(variable) = pattern {
        match args.get(variable.as_str()) {
            Some(Term::NamedNode(node)) => *pattern = TermPattern::NamedNode(node.clone()),
            Some(Term::Literal(literal)) => *pattern = TermPattern::Literal(literal.clone()),
            Some(Term::BlankNode(node)) => *pattern = TermPattern::BlankNode(node.clone()),
            None => {}
        }
    }
}

fn bind_named_node_pattern(pattern: &mut NamedNodePattern, args: &HashMap<String, Term>) {
    if let NamedNodePattern::Variable(variable) = pattern {
        // Only an IRI is valid in predicate/graph/service position.
        if let Some(Term::NamedNode(node)) = args.get(variable.as_str()) {
            *pattern = NamedNodePattern::NamedNode(node.clone());
        }
    }
}

fn bind_expression(expression: &mut Expression, args: &HashMap<String, Term>) {
    match expression {
        Expression::Variable(variable) => match args.get(variable.as_str()) {
            Some(Term::NamedNode(node)) => *expression = Expression::NamedNode(node.clone()),
            Some(Term::Literal(literal)) => *expression = Expression::Literal(literal.clone()),
            // A blank node is not a valid expression term.
            Some(Term::BlankNode(_)) | None => {}
        },
        Expression::Or(left, right)
        | Expression::And(left, right)
        | Expression::Equal(left, right)
        | Expression::SameTerm(left, right)
        | Expression::Greater(left, right)
        | Expression::GreaterOrEqual(left, right)
        | Expression::Less(left, right)
        | Expression::LessOrEqual(left, right)
        | Expression::Add(left, right)
        | Expression::Subtract(left, right)
        | Expression::Multiply(left, right)
        | Expression::Divide(left, right) => {
            bind_expression(left, args);
            bind_expression(right, args);
        }
        Expression::In(needle, haystack) => {
            bind_expression(needle, args);
            for expr in haystack {
                bind_expression(expr, args);
            }
        }
        Expression::UnaryPlus(inner)
        | Expression::UnaryMinus(inner)
        | Expression::Not(inner) => bind_expression(inner, args),
        Expression::Exists(pattern) => bind_graph_pattern(pattern, args),
        Expression::If(condition, then, otherwise) => {
            bind_expression(condition, args);
            bind_expression(then, args);
            bind_expression(otherwise, args);
        }
        Expression::Coalesce(expressions) | Expression::FunctionCall(_, expressions) => {
            for expr in expressions {
                bind_expression(expr, args);
            }
        }
        // `BOUND` takes a variable, and ground terms stay as they are.
        Expression::Bound(_) | Expression::NamedNode(_) | Expression::Literal(_) => {}
    }
}
