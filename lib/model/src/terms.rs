use oxrdf::vocab::xsd;
use oxrdf::{Literal, NamedNodeRef, Term, TermRef};

/// Returns the datatype of `term` if it is a literal.
///
/// Plain literals report `xsd:string` and language-tagged literals report `rdf:langString`,
/// mirroring the RDF 1.1 datatype rules implemented by oxrdf.
pub fn literal_datatype(term: &Term) -> Option<NamedNodeRef<'_>> {
    match term.as_ref() {
        TermRef::Literal(literal) => Some(literal.datatype()),
        _ => None,
    }
}

/// Checks whether `term` is a literal with the `xsd:string` datatype.
pub fn is_string_literal(term: &Term) -> bool {
    literal_datatype(term) == Some(xsd::STRING)
}

/// Creates an `xsd:boolean` literal.
pub fn boolean_literal(value: bool) -> Literal {
    Literal::new_typed_literal(value.to_string(), xsd::BOOLEAN)
}

/// Creates an `xsd:double` literal from the canonical Rust formatting of `value`.
pub fn double_literal(value: f64) -> Literal {
    Literal::new_typed_literal(value.to_string(), xsd::DOUBLE)
}
