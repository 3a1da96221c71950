//! Pattern queries: grounding variables against a view.
//!
//! A query is a set of declared variables plus a conjunction of clauses.
//! Clauses are either patterns (atoms containing the variables, matched
//! structurally against the view) or filters (`Equal`, `Not`, `Absent`,
//! and presence checks, evaluated once the variables they mention are
//! bound). [`ground`] enumerates every total assignment that satisfies all
//! clauses.

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use crate::id::{AtomId, TypeId};

mod ground;

pub use ground::ground;

// ============================================================================
// VARIABLES
// ============================================================================

/// The declared variables of a query, each with an optional type bound.
///
/// Order is declaration order; grounding tuples use the same order.
#[derive(Clone, Debug, Default)]
pub struct VariableSet {
    vars: IndexMap<AtomId, Option<TypeId>>,
}

impl VariableSet {
    pub fn new() -> Self {
        VariableSet {
            vars: IndexMap::new(),
        }
    }

    /// Adds a variable; the first declaration of a variable wins.
    pub fn insert(&mut self, var: AtomId, constraint: Option<TypeId>) {
        self.vars.entry(var).or_insert(constraint);
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn contains(&self, var: AtomId) -> bool {
        self.vars.contains_key(&var)
    }

    pub fn index_of(&self, var: AtomId) -> Option<usize> {
        self.vars.get_index_of(&var)
    }

    pub fn var(&self, index: usize) -> AtomId {
        *self.vars.get_index(index).map(|(v, _)| v).unwrap_or(&0)
    }

    pub fn constraint(&self, index: usize) -> Option<TypeId> {
        self.vars.get_index(index).and_then(|(_, c)| *c)
    }

    pub fn atoms(&self) -> Vec<AtomId> {
        self.vars.keys().copied().collect()
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// All satisfying assignments of a query, one tuple per assignment.
///
/// Tuple positions follow the variable order of the `VariableSet` the query
/// ran with. The tuple set is deduplicated: two different search paths that
/// bind the same atoms yield one tuple.
#[derive(Clone, Debug, Default)]
pub struct Groundings {
    pub vars: Vec<AtomId>,
    pub tuples: IndexSet<Vec<AtomId>>,
}

impl Groundings {
    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<AtomId>> {
        self.tuples.iter()
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryError {
    /// The clause's type has no search semantics.
    UnsupportedClause(String),
    /// A connective was given the wrong number of arguments.
    BadArity {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
    /// The clause under a `Not` is not something with a truth value.
    NotAFilter(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueryError::UnsupportedClause(what) => {
                write!(f, "clause type {} cannot be searched", what)
            }
            QueryError::BadArity {
                kind,
                expected,
                found,
            } => write!(f, "{} takes {} argument(s), found {}", kind, expected, found),
            QueryError::NotAFilter(what) => {
                write!(f, "{} has no truth value under Not", what)
            }
        }
    }
}

impl std::error::Error for QueryError {}

pub type QueryResult<T> = Result<T, QueryError>;
