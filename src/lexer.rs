//! Lexer for the s-expression surface syntax.
//!
//! Produces a flat list of spanned tokens. Comments run from `;` to end of
//! line and are dropped along with whitespace; string literals support the
//! escapes `\\`, `\"`, `\n`, and `\t`.

use chumsky::prelude::*;
use std::fmt;
use std::ops::Range;

pub type Span = Range<usize>;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    LParen,
    RParen,
    /// A type name such as `Concept` or `MaximalJoin`.
    Ident(String),
    /// A quoted node name, escapes already resolved.
    Str(String),
    /// A bare numeral, kept as written.
    Num(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Str(text) => write!(f, "\"{}\"", text),
            Token::Num(text) => write!(f, "{}", text),
        }
    }
}

pub fn lexer() -> impl Parser<char, Vec<(Token, Span)>, Error = Simple<char>> {
    let ident = text::ident().map(Token::Ident);

    let number = just('-')
        .or_not()
        .then(text::int(10))
        .then(just('.').then(text::digits(10)).or_not())
        .map(|((minus, int), frac)| {
            let mut text = String::new();
            if minus.is_some() {
                text.push('-');
            }
            text.push_str(&int);
            if let Some((_, digits)) = frac {
                text.push('.');
                text.push_str(&digits);
            }
            Token::Num(text)
        });

    let escape = just('\\').ignore_then(choice((
        just('\\'),
        just('"'),
        just('n').to('\n'),
        just('t').to('\t'),
    )));

    let string = just('"')
        .ignore_then(
            filter(|c: &char| *c != '"' && *c != '\\')
                .or(escape)
                .repeated(),
        )
        .then_ignore(just('"'))
        .map(|chars: Vec<char>| Token::Str(chars.into_iter().collect()));

    let punctuation = choice((
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
    ));

    let line_comment = just(';')
        .then(none_of('\n').repeated())
        .then(just('\n').or_not())
        .ignored();

    let token = choice((punctuation, string, number, ident));

    let token_or_skip = line_comment.to(None).or(token.map(Some));

    token_or_skip
        .map_with_span(|tok, span| tok.map(|tok| (tok, span)))
        .padded()
        .repeated()
        .then_ignore(end())
        .map(|tokens| tokens.into_iter().flatten().collect())
}

// Unit tests are in tests/unit_parsing.rs
