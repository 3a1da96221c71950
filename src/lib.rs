//! Joinspace: a typed, content-addressed hypergraph store
//!
//! Atoms are immutable nodes and links, interned by structure so equal
//! atoms share one id. A `Meet` asks which atoms satisfy a pattern; a
//! `Join` asks which containers hold them, rewriting variables on the
//! way out.

pub mod error;
pub mod id;
pub mod join;
pub mod lexer;
pub mod overlay;
pub mod parser;
pub mod pretty;
pub mod query;
pub mod repl;
pub mod rewrite;
pub mod store;
pub mod term;
pub mod types;

pub use error::ReadError;
pub use join::{JoinError, JoinSpec, ResultQueue};
pub use lexer::lexer;
pub use parser::parser;
pub use pretty::{pretty_atom, pretty_term};
pub use store::{AtomSink, AtomView, Store};
pub use term::Term;
pub use types::TypeRegistry;

/// Parse a source string into terms against a type registry.
///
/// Nothing is interned here; callers feed the terms to an [`AtomSink`]
/// when they want them stored.
pub fn read_terms(types: &TypeRegistry, input: &str) -> Result<Vec<Term>, ReadError> {
    use chumsky::prelude::*;

    let tokens = lexer::lexer()
        .parse(input)
        .map_err(|errs| ReadError::Syntax(error::format_lexer_errors(input, errs)))?;

    let len = input.len();
    let sexprs = parser::parser()
        .parse(chumsky::Stream::from_iter(len..len + 1, tokens.into_iter()))
        .map_err(|errs| ReadError::Syntax(error::format_parser_errors(input, errs)))?;

    sexprs
        .iter()
        .map(|sexpr| Term::from_sexpr(types, sexpr))
        .collect()
}
