mod terms;

pub use terms::*;

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::vocab;
pub use oxrdf::{
    BlankNode, BlankNodeRef, IriParseError, Literal, LiteralRef, NamedNode, NamedNodeRef, Term,
    TermParseError, TermRef, Variable, VariableNameParseError, VariableRef,
};
