//! The join operator: wildcard search for containing structures.
//!
//! A `Join` names variables and clauses; executing it finds the smallest
//! atoms that simultaneously contain a grounding of every variable — the
//! supremum of the groundings under the containment order. `MaximalJoin`
//! keeps climbing to the absolute roots instead. Replacement directives
//! then rewrite the found containers at the grounded sites.
//!
//! The pipeline: ground the variables (a meet, run in a scratch overlay),
//! close upward through incoming sets, prune elements that fail to contain
//! every variable, keep the minimal ones, apply top-type directives, and
//! substitute. See [`JoinSpec::container`] for the driver.

use indexmap::{IndexMap, IndexSet};
use roaring::RoaringTreemap;

use crate::id::{AtomId, TypeId};
use crate::query::VariableSet;
use crate::rewrite;
use crate::store::{AtomView, Store};
use crate::term::Term;
use crate::types::{self, TypeRegistry};

mod error;
mod exec;
mod filter;
mod subst;

pub use error::{JoinError, JoinErrorKind, JoinResult};
pub use exec::ResultQueue;

// ============================================================================
// JOIN SPEC
// ============================================================================

/// A validated, compiled join operator. Immutable once built; every
/// execution starts from the same compiled form.
#[derive(Debug)]
pub struct JoinSpec {
    /// The `Join`/`MaximalJoin` atom this spec was compiled from.
    op: AtomId,
    /// Ascend to absolute roots after computing the minimal join.
    maximal: bool,
    vars: VariableSet,
    /// Container contributions from variable-free clauses.
    constants: IndexSet<AtomId>,
    /// `Replacement` clauses, in body order.
    replacements: Vec<AtomId>,
    /// Compiled top-type directives; all must admit a container.
    top_types: Vec<TypeSpec>,
    /// The backing query, detached: `Meet(decls, And(clauses...))`.
    /// `None` when no variables are declared.
    meet: Option<Term>,
}

impl JoinSpec {
    /// Validates and compiles the `Join` atom `op`. All shape errors
    /// surface here; a spec that constructs will run.
    pub fn new(store: &Store, op: AtomId) -> JoinResult<JoinSpec> {
        let reg = &store.types;
        let ty = store.atom_type(op);
        if !reg.is_a(ty, types::JOIN) {
            return Err(JoinError::NotAJoin(reg.name(ty).to_string()));
        }
        let maximal = reg.is_a(ty, types::MAXIMAL_JOIN);

        // The first child is declarations only if it is declaration-shaped;
        // otherwise every child is a clause over zero variables.
        let children = store.outgoing(op).to_vec();
        let (decl, clause_ids) = match children.split_first() {
            Some((&first, rest)) if is_declaration(store, first) => (Some(first), rest.to_vec()),
            _ => (None, children),
        };
        let vars = match decl {
            Some(d) => parse_variables(store, d)?,
            None => VariableSet::new(),
        };

        let mut constraints = Vec::new();
        let mut constants = IndexSet::new();
        let mut replacements = Vec::new();
        let mut top_types = Vec::new();
        for &clause in &clause_ids {
            let cty = store.atom_type(clause);
            if reg.is_a(cty, types::REPLACEMENT) {
                replacements.push(clause);
            } else if cty == types::TYPE
                || cty == types::TYPE_INH
                || reg.is_a(cty, types::TYPE_CHOICE)
            {
                top_types.push(compile_type_spec(store, clause)?);
            } else if is_constraint(reg, cty) {
                if rewrite::free_variables(store, clause).is_empty() {
                    constants.insert(constant_atom(store, clause));
                } else {
                    constraints.push(clause);
                }
            } else {
                return Err(JoinError::UnsupportedClause(reg.name(cty).to_string()));
            }
        }

        let meet = match decl {
            Some(d) if !vars.is_empty() => Some(build_meet(store, d, &vars, &constraints)),
            _ => None,
        };

        Ok(JoinSpec {
            op,
            maximal,
            vars,
            constants,
            replacements,
            top_types,
            meet,
        })
    }

    pub fn operator(&self) -> AtomId {
        self.op
    }

    pub fn is_maximal(&self) -> bool {
        self.maximal
    }

    pub fn variables(&self) -> &VariableSet {
        &self.vars
    }
}

/// Builds the backing query: declarations carried verbatim, the
/// variable-bearing clauses in order, and one synthesized `Present` for
/// each declared variable free in none of them.
fn build_meet<V: AtomView>(
    view: &V,
    decl: AtomId,
    vars: &VariableSet,
    constraints: &[AtomId],
) -> Term {
    let mut body: Vec<Term> = constraints.iter().map(|&c| view.export_term(c)).collect();
    let mut covered: IndexSet<AtomId> = IndexSet::new();
    for &c in constraints {
        covered.extend(rewrite::free_variables(view, c));
    }
    for i in 0..vars.len() {
        let var = vars.var(i);
        if !covered.contains(&var) {
            body.push(Term::Link(types::PRESENT, vec![view.export_term(var)]));
        }
    }
    Term::Link(
        types::MEET,
        vec![view.export_term(decl), Term::Link(types::AND, body)],
    )
}

fn is_declaration<V: AtomView>(view: &V, id: AtomId) -> bool {
    let reg = view.types();
    let ty = view.atom_type(id);
    reg.is_a(ty, types::VARIABLE)
        || reg.is_a(ty, types::TYPED_VARIABLE)
        || reg.is_a(ty, types::VARIABLE_LIST)
}

/// The closed set of clause types the backing search understands.
fn is_constraint(reg: &TypeRegistry, ty: TypeId) -> bool {
    reg.is_a(ty, types::PRESENT)
        || reg.is_a(ty, types::EVALUATION)
        || reg.is_a(ty, types::EQUAL)
        || reg.is_a(ty, types::NOT)
        || reg.is_a(ty, types::ABSENT)
}

/// What a variable-free clause stands for as a container: `Present`
/// asserts its payload, everything else stands for itself.
fn constant_atom<V: AtomView>(view: &V, clause: AtomId) -> AtomId {
    let reg = view.types();
    if reg.is_a(view.atom_type(clause), types::PRESENT) && view.arity(clause) == 1 {
        view.outgoing(clause)[0]
    } else {
        clause
    }
}

// ============================================================================
// DECLARATIONS
// ============================================================================

/// Parses a declaration form into a `VariableSet`: a bare `Variable`, a
/// `TypedVariable`, or a `VariableList` of either. Strict, unlike
/// [`rewrite::declared_variables`]: malformed shapes and unsupported
/// constraints are errors.
pub fn parse_variables<V: AtomView>(view: &V, decl: AtomId) -> JoinResult<VariableSet> {
    let mut vars = VariableSet::new();
    collect_variables(view, decl, &mut vars)?;
    Ok(vars)
}

fn collect_variables<V: AtomView>(
    view: &V,
    decl: AtomId,
    vars: &mut VariableSet,
) -> JoinResult<()> {
    let reg = view.types();
    let ty = view.atom_type(decl);
    if reg.is_a(ty, types::VARIABLE) {
        vars.insert(decl, None);
        return Ok(());
    }
    if reg.is_a(ty, types::TYPED_VARIABLE) {
        let children = view.outgoing(decl);
        if children.len() != 2 {
            return Err(JoinError::BadDeclaration(format!(
                "TypedVariable takes 2 arguments, found {}",
                children.len()
            )));
        }
        let (var, constraint) = (children[0], children[1]);
        if !reg.is_a(view.atom_type(var), types::VARIABLE) {
            return Err(JoinError::BadDeclaration(format!(
                "TypedVariable must declare a Variable, found {}",
                reg.name(view.atom_type(var))
            )));
        }
        let cty = view.atom_type(constraint);
        if cty != types::TYPE && cty != types::TYPE_INH {
            // One plain type per variable; TypeChoice and deeper forms are
            // out of scope for join declarations.
            return Err(JoinError::UnsupportedConstraint(reg.name(cty).to_string()));
        }
        let name = view.node_name(constraint).unwrap_or("");
        let bound = reg
            .lookup(name)
            .ok_or_else(|| JoinError::UnknownType(name.to_string()))?;
        vars.insert(var, Some(bound));
        return Ok(());
    }
    if reg.is_a(ty, types::VARIABLE_LIST) {
        for &child in view.outgoing(decl) {
            collect_variables(view, child, vars)?;
        }
        return Ok(());
    }
    Err(JoinError::BadDeclaration(reg.name(ty).to_string()))
}

// ============================================================================
// TOP-TYPE DIRECTIVES
// ============================================================================

/// A compiled top-type directive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeSpec {
    /// The container's type must equal this type.
    Exact(TypeId),
    /// The container's type must inherit from this type.
    Inherits(TypeId),
    /// Any member admitting the container admits it.
    Choice(Vec<TypeSpec>),
}

impl TypeSpec {
    pub fn admits(&self, reg: &TypeRegistry, ty: TypeId) -> bool {
        match self {
            TypeSpec::Exact(t) => ty == *t,
            TypeSpec::Inherits(t) => reg.is_a(ty, *t),
            TypeSpec::Choice(arms) => arms.iter().any(|arm| arm.admits(reg, ty)),
        }
    }
}

fn compile_type_spec<V: AtomView>(view: &V, id: AtomId) -> JoinResult<TypeSpec> {
    let reg = view.types();
    let ty = view.atom_type(id);
    if ty == types::TYPE || ty == types::TYPE_INH {
        let name = view.node_name(id).unwrap_or("");
        let named = reg
            .lookup(name)
            .ok_or_else(|| JoinError::UnknownType(name.to_string()))?;
        return Ok(if ty == types::TYPE {
            TypeSpec::Exact(named)
        } else {
            TypeSpec::Inherits(named)
        });
    }
    if reg.is_a(ty, types::TYPE_CHOICE) {
        let arms = view
            .outgoing(id)
            .iter()
            .map(|&c| compile_type_spec(view, c))
            .collect::<JoinResult<Vec<TypeSpec>>>()?;
        return Ok(TypeSpec::Choice(arms));
    }
    Err(JoinError::UnsupportedClause(reg.name(ty).to_string()))
}

// ============================================================================
// TRAVERSE STATE
// ============================================================================

/// Per-execution scratch: which atom grounded which variable.
///
/// `replace_map` pairs each grounded atom with its substitution target,
/// initially the variable it grounded (first variable wins when an atom
/// grounds several). `join_map` holds the grounding set per variable
/// index; the joined-ness prune reads it.
pub struct Traverse {
    pub replace_map: IndexMap<AtomId, AtomId>,
    pub join_map: Vec<RoaringTreemap>,
}

impl Traverse {
    pub fn new(vsize: usize) -> Self {
        Traverse {
            replace_map: IndexMap::new(),
            join_map: vec![RoaringTreemap::new(); vsize],
        }
    }
}

// Unit tests are in tests/unit_join.rs
