//! Parser from token streams to s-expression trees.
//!
//! The grammar is tiny: every form is `(Head ...)` where `Head` is a type
//! name and the rest is either a single literal (the node name) or zero or
//! more nested forms (the link children). Resolution against the type
//! registry happens later, in `Term::from_sexpr`.

use chumsky::prelude::*;

use crate::lexer::{Span, Token};

/// One parenthesized form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sexpr {
    pub head: String,
    pub body: SexprBody,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SexprBody {
    /// A node form: `(Concept "sea")`, `(Number 42)`.
    Name(String),
    /// A link form: `(Member ...)`, including the empty `(VariableList)`.
    Forms(Vec<Sexpr>),
}

/// Parses a whole input: any number of top-level forms.
pub fn parser() -> impl Parser<Token, Vec<Sexpr>, Error = Simple<Token>> + Clone {
    sexpr().repeated().then_ignore(end())
}

fn sexpr() -> impl Parser<Token, Sexpr, Error = Simple<Token>> + Clone {
    recursive(|form| {
        let head = select! { Token::Ident(name) => name };

        let name = select! {
            Token::Str(text) => text,
            Token::Num(text) => text,
        };

        let body = name
            .map(SexprBody::Name)
            .or(form.repeated().map(SexprBody::Forms));

        just(Token::LParen)
            .ignore_then(head)
            .then(body)
            .then_ignore(just(Token::RParen))
            .map_with_span(|(head, body), span| Sexpr { head, body, span })
    })
}

// Unit tests are in tests/unit_parsing.rs
