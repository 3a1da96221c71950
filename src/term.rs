//! Terms: atoms as self-contained trees.
//!
//! A `Term` is the boundary representation: the reader produces terms from
//! s-expressions, the store interns them into ids, and export rebuilds them
//! for printing or rewriting.

use crate::error::ReadError;
use crate::id::TypeId;
use crate::parser::{Sexpr, SexprBody};
use crate::types::{self, TypeRegistry};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    Node(TypeId, String),
    Link(TypeId, Vec<Term>),
}

impl Term {
    pub fn node(ty: TypeId, name: impl Into<String>) -> Term {
        Term::Node(ty, name.into())
    }

    pub fn link(ty: TypeId, children: Vec<Term>) -> Term {
        Term::Link(ty, children)
    }

    /// Shorthand for a `Variable` node.
    pub fn variable(name: impl Into<String>) -> Term {
        Term::Node(types::VARIABLE, name.into())
    }

    /// Shorthand for a `Concept` node.
    pub fn concept(name: impl Into<String>) -> Term {
        Term::Node(types::CONCEPT, name.into())
    }

    pub fn type_of(&self) -> TypeId {
        match self {
            Term::Node(ty, _) | Term::Link(ty, _) => *ty,
        }
    }

    /// Resolves a parsed s-expression against the registry.
    ///
    /// The head must name a registered type. Node types take exactly one
    /// literal name; link types take zero or more subforms. The name of a
    /// `Type` or `TypeInh` node must itself be a registered type, since the
    /// payload is meaningless otherwise.
    pub fn from_sexpr(registry: &TypeRegistry, sexpr: &Sexpr) -> Result<Term, ReadError> {
        let ty = registry
            .lookup(&sexpr.head)
            .ok_or_else(|| ReadError::UnknownType(sexpr.head.clone()))?;
        match &sexpr.body {
            SexprBody::Name(name) => {
                if !registry.is_a(ty, types::NODE) {
                    return Err(ReadError::UnexpectedName(sexpr.head.clone()));
                }
                if (ty == types::TYPE || ty == types::TYPE_INH) && registry.lookup(name).is_none() {
                    return Err(ReadError::UnknownType(name.clone()));
                }
                Ok(Term::Node(ty, name.clone()))
            }
            SexprBody::Forms(forms) => {
                if !registry.is_a(ty, types::LINK) {
                    return Err(ReadError::ExpectedName(sexpr.head.clone()));
                }
                let children = forms
                    .iter()
                    .map(|form| Term::from_sexpr(registry, form))
                    .collect::<Result<Vec<Term>, ReadError>>()?;
                Ok(Term::Link(ty, children))
            }
        }
    }
}
