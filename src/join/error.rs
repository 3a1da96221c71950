//! Join operator error types.

use std::fmt;

use crate::query::QueryError;

/// Everything that can go wrong building or executing a join.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinError {
    /// The operand atom is not in the `Join` family.
    NotAJoin(String),
    /// A body clause whose type has no join semantics.
    UnsupportedClause(String),
    /// A declaration whose shape is not `Variable`/`TypedVariable`.
    BadDeclaration(String),
    /// A variable constraint that is not a single `Type`/`TypeInh` node;
    /// multi-valued and deep constraints are unsupported.
    UnsupportedConstraint(String),
    /// A `Type`/`TypeInh` directive naming an unregistered type.
    UnknownType(String),
    /// A `Replacement` source whose variable grounded to several atoms,
    /// so a single-target rewrite is ambiguous.
    AmbiguousReplacement { source: String, count: usize },
    /// A `Replacement` with other than two arguments.
    ReplacementArity(usize),
    /// A `Replacement` source no declared variable resolves to.
    UnboundReplacement(String),
    /// Propagated unchanged from the grounding search.
    Oracle(QueryError),
}

/// The coarse classification the caller retries or reports on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinErrorKind {
    Construction,
    Syntax,
    Oracle,
}

impl JoinError {
    pub fn kind(&self) -> JoinErrorKind {
        match self {
            JoinError::NotAJoin(_)
            | JoinError::UnsupportedClause(_)
            | JoinError::BadDeclaration(_)
            | JoinError::UnsupportedConstraint(_)
            | JoinError::UnknownType(_)
            | JoinError::AmbiguousReplacement { .. } => JoinErrorKind::Construction,
            JoinError::ReplacementArity(_) | JoinError::UnboundReplacement(_) => {
                JoinErrorKind::Syntax
            }
            JoinError::Oracle(_) => JoinErrorKind::Oracle,
        }
    }
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JoinError::NotAJoin(what) => write!(f, "expected a Join, got {}", what),
            JoinError::UnsupportedClause(what) => {
                write!(f, "clause type {} is not supported in a Join body", what)
            }
            JoinError::BadDeclaration(what) => {
                write!(f, "malformed variable declaration: {}", what)
            }
            JoinError::UnsupportedConstraint(what) => {
                write!(f, "unsupported type constraint: {}", what)
            }
            JoinError::UnknownType(name) => write!(f, "unknown type name '{}'", name),
            JoinError::AmbiguousReplacement { source, count } => write!(
                f,
                "replacement source {} has {} groundings; cannot pick one",
                source, count
            ),
            JoinError::ReplacementArity(found) => {
                write!(f, "Replacement takes 2 arguments, found {}", found)
            }
            JoinError::UnboundReplacement(source) => {
                write!(f, "no declared variable resolves to {}", source)
            }
            JoinError::Oracle(err) => write!(f, "grounding search failed: {}", err),
        }
    }
}

impl std::error::Error for JoinError {}

impl From<QueryError> for JoinError {
    fn from(err: QueryError) -> Self {
        JoinError::Oracle(err)
    }
}

pub type JoinResult<T> = Result<T, JoinError>;
