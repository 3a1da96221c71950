//! Error formatting and the term-reading error type.
//!
//! Lex and parse failures are rendered with ariadne into ready-to-print
//! reports with source context; resolution failures carry just enough to
//! name the offending head or type.

use ariadne::{Color, Label, Report, ReportKind, Source};
use chumsky::prelude::Simple;
use std::fmt;

use crate::lexer::Token;

/// Failure while turning source text into terms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReadError {
    /// Lexing or parsing failed; carries the rendered report.
    Syntax(String),
    /// A head or a `Type`/`TypeInh` name that the registry does not know.
    UnknownType(String),
    /// A node-typed head was given subforms (or nothing) instead of a name.
    ExpectedName(String),
    /// A link-typed head was given a literal name.
    UnexpectedName(String),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReadError::Syntax(report) => write!(f, "{}", report),
            ReadError::UnknownType(name) => write!(f, "unknown type name '{}'", name),
            ReadError::ExpectedName(head) => {
                write!(f, "node type {} takes a single literal name", head)
            }
            ReadError::UnexpectedName(head) => {
                write!(f, "link type {} cannot take a literal name", head)
            }
        }
    }
}

/// Format lexer errors into a user-friendly string
pub fn format_lexer_errors(source: &str, errors: Vec<Simple<char>>) -> String {
    let mut output = Vec::new();

    for error in errors {
        let span = error.span();
        let report = Report::build(ReportKind::Error, (), span.start)
            .with_message("Lexical error")
            .with_label(
                Label::new(span.clone())
                    .with_message(format_lexer_error(&error))
                    .with_color(Color::Red),
            );

        report
            .finish()
            .write(Source::from(source), &mut output)
            .expect("Failed to write error report");
    }

    String::from_utf8(output).unwrap_or_else(|_| "Error formatting failed".to_string())
}

/// Format a single lexer error into a readable message
fn format_lexer_error(error: &Simple<char>) -> String {
    let found = error
        .found()
        .map(|c| format!("'{}'", c))
        .unwrap_or_else(|| "end of input".to_string());

    if error.expected().next().is_some() {
        format!(
            "Unexpected {}, expected {}",
            found,
            format_char_set(error.expected())
        )
    } else {
        format!("Unexpected character {}", found)
    }
}

/// Format parser errors into a user-friendly string
pub fn format_parser_errors(source: &str, errors: Vec<Simple<Token>>) -> String {
    let mut output = Vec::new();

    for error in errors {
        // Parser errors already carry character spans; clamp them to the
        // source so a report can never point past the end.
        let span = error.span();
        let start = span.start.min(source.len());
        let end = span.end.min(source.len()).max(start);
        let char_span = start..end;

        let report = Report::build(ReportKind::Error, (), char_span.start)
            .with_message("Parse error")
            .with_label(
                Label::new(char_span.clone())
                    .with_message(format_parser_error(&error))
                    .with_color(Color::Red),
            );

        report
            .finish()
            .write(Source::from(source), &mut output)
            .expect("Failed to write error report");
    }

    String::from_utf8(output).unwrap_or_else(|_| "Error formatting failed".to_string())
}

/// Format a single parser error into a readable message
fn format_parser_error(error: &Simple<Token>) -> String {
    use chumsky::error::SimpleReason;

    let found = error
        .found()
        .map(|t| format!("'{}'", t))
        .unwrap_or_else(|| "end of input".to_string());

    match error.reason() {
        SimpleReason::Custom(message) => message.clone(),
        _ => {
            if error.expected().next().is_some() {
                format!(
                    "Unexpected {}, expected {}",
                    found,
                    format_token_set(error.expected())
                )
            } else {
                format!("Unexpected {}", found)
            }
        }
    }
}

fn format_token_set<'a>(expected: impl Iterator<Item = &'a Option<Token>>) -> String {
    let mut parts: Vec<String> = expected
        .map(|tok| match tok {
            Some(tok) => format!("'{}'", tok),
            None => "end of input".to_string(),
        })
        .collect();
    parts.sort();
    parts.dedup();
    parts.join(" or ")
}

fn format_char_set<'a>(expected: impl Iterator<Item = &'a Option<char>>) -> String {
    let mut parts: Vec<String> = expected
        .map(|c| match c {
            Some(c) => format!("'{}'", c),
            None => "end of input".to_string(),
        })
        .collect();
    parts.sort();
    parts.dedup();
    parts.join(" or ")
}
