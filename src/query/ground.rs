//! The grounding search: naive, obviously-correct clause satisfaction.
//!
//! No planning and no indexes beyond the per-type carriers. Searched
//! clauses are matched against every ground candidate of a compatible
//! type, in clause order, with chronological backtracking; filter clauses
//! run once per complete assignment. Good enough to be the reference
//! semantics everything else is measured against.

use indexmap::IndexMap;
use roaring::RoaringTreemap;

use crate::id::{get_atom, some_atom, AtomId, OptAtomId, TypeId};
use crate::rewrite;
use crate::store::AtomView;
use crate::types;

use super::{Groundings, QueryError, QueryResult, VariableSet};

// ============================================================================
// CLAUSE CLASSIFICATION
// ============================================================================

/// A clause with a truth value, evaluated under a complete assignment.
enum Filter {
    /// Both sides instantiate to the same term.
    Equal(AtomId, AtomId),
    /// The instantiated term is not interned in the view.
    Absent(AtomId),
    /// The instantiated term is interned in the view. Only reachable under
    /// `Not`; a top-level `Present` is a search pattern instead.
    Found(AtomId),
    Not(Box<Filter>),
}

enum Clause {
    /// Matched structurally against the view, binding variables.
    Pattern(AtomId),
    Filter(Filter),
}

fn classify<V: AtomView>(view: &V, clause: AtomId) -> QueryResult<Clause> {
    let reg = view.types();
    let ty = view.atom_type(clause);
    if reg.is_a(ty, types::PRESENT) {
        let children = view.outgoing(clause);
        if children.len() != 1 {
            return Err(QueryError::BadArity {
                kind: "Present",
                expected: 1,
                found: children.len(),
            });
        }
        return Ok(Clause::Pattern(children[0]));
    }
    if reg.is_a(ty, types::EVALUATION) {
        return Ok(Clause::Pattern(clause));
    }
    if reg.is_a(ty, types::EQUAL)
        || reg.is_a(ty, types::ABSENT)
        || reg.is_a(ty, types::NOT)
    {
        return Ok(Clause::Filter(classify_filter(view, clause)?));
    }
    Err(QueryError::UnsupportedClause(reg.name(ty).to_string()))
}

fn classify_filter<V: AtomView>(view: &V, clause: AtomId) -> QueryResult<Filter> {
    let reg = view.types();
    let ty = view.atom_type(clause);
    let children = view.outgoing(clause);
    if reg.is_a(ty, types::EQUAL) {
        if children.len() != 2 {
            return Err(QueryError::BadArity {
                kind: "Equal",
                expected: 2,
                found: children.len(),
            });
        }
        return Ok(Filter::Equal(children[0], children[1]));
    }
    if reg.is_a(ty, types::ABSENT) {
        if children.len() != 1 {
            return Err(QueryError::BadArity {
                kind: "Absent",
                expected: 1,
                found: children.len(),
            });
        }
        return Ok(Filter::Absent(children[0]));
    }
    if reg.is_a(ty, types::PRESENT) {
        if children.len() != 1 {
            return Err(QueryError::BadArity {
                kind: "Present",
                expected: 1,
                found: children.len(),
            });
        }
        return Ok(Filter::Found(children[0]));
    }
    if reg.is_a(ty, types::NOT) {
        if children.len() != 1 {
            return Err(QueryError::BadArity {
                kind: "Not",
                expected: 1,
                found: children.len(),
            });
        }
        return Ok(Filter::Not(Box::new(classify_filter(view, children[0])?)));
    }
    Err(QueryError::NotAFilter(reg.name(ty).to_string()))
}

// ============================================================================
// SEARCH
// ============================================================================

/// Enumerates every assignment of the declared variables that satisfies the
/// conjunction of `clauses`, as tuples in variable-declaration order.
///
/// Variables bind ground, non-scratch atoms only; a variable no searched
/// clause mentions ranges over its declared-type carrier (or every ground
/// atom when unconstrained). Classification errors surface before any
/// matching happens.
pub fn ground<V: AtomView>(
    view: &V,
    vars: &VariableSet,
    clauses: &[AtomId],
) -> QueryResult<Groundings> {
    let mut patterns = Vec::new();
    let mut filters = Vec::new();
    for &clause in clauses {
        match classify(view, clause)? {
            Clause::Pattern(p) => patterns.push(p),
            Clause::Filter(f) => filters.push(f),
        }
    }

    // Variables no pattern can bind get enumerated after the patterns.
    let mut covered = vec![false; vars.len()];
    for &p in &patterns {
        for var in rewrite::free_variables(view, p) {
            if let Some(i) = vars.index_of(var) {
                covered[i] = true;
            }
        }
    }
    let enumerate: Vec<usize> = (0..vars.len()).filter(|&i| !covered[i]).collect();

    let mut search = Search {
        view,
        vars,
        patterns,
        enumerate,
        filters,
        out: Groundings {
            vars: vars.atoms(),
            tuples: Default::default(),
        },
    };
    let mut binding: Vec<OptAtomId> = vec![None; vars.len()];
    search.solve(0, &mut binding);
    Ok(search.out)
}

struct Search<'a, V: AtomView> {
    view: &'a V,
    vars: &'a VariableSet,
    patterns: Vec<AtomId>,
    enumerate: Vec<usize>,
    filters: Vec<Filter>,
    out: Groundings,
}

impl<V: AtomView> Search<'_, V> {
    /// Steps through patterns, then enumerated variables, then filters.
    fn solve(&mut self, step: usize, binding: &mut Vec<OptAtomId>) {
        if step < self.patterns.len() {
            let pattern = self.patterns[step];
            for cand in self.candidates(pattern) {
                let mut trail = Vec::new();
                if self.matches(pattern, cand, binding, &mut trail, 0) {
                    self.solve(step + 1, binding);
                }
                for i in trail {
                    binding[i] = None;
                }
            }
            return;
        }
        if let Some(&vi) = self.enumerate.get(step - self.patterns.len()) {
            for cand in ground_atoms(self.view, self.vars.constraint(vi)) {
                binding[vi] = some_atom(cand);
                self.solve(step + 1, binding);
            }
            binding[vi] = None;
            return;
        }
        if !self.filters.iter().all(|f| self.eval(f, binding)) {
            return;
        }
        let tuple: Option<Vec<AtomId>> = binding.iter().map(|&slot| get_atom(slot)).collect();
        if let Some(tuple) = tuple {
            self.out.tuples.insert(tuple);
        }
    }

    /// Ground atoms a pattern could possibly match. Bound variables still
    /// scan their whole domain; `matches` rejects everything but the bound
    /// atom.
    fn candidates(&self, pattern: AtomId) -> Vec<AtomId> {
        let view = self.view;
        let reg = view.types();
        let ty = view.atom_type(pattern);
        if reg.is_a(ty, types::VARIABLE) {
            if let Some(i) = self.vars.index_of(pattern) {
                return ground_atoms(view, self.vars.constraint(i));
            }
        }
        if view.is_link(pattern) {
            return ground_atoms(view, Some(ty));
        }
        // A ground node pattern can only match itself, and only when it is
        // real data rather than query scratch.
        if view.is_scratch(pattern) || view.has_variables(pattern) {
            Vec::new()
        } else {
            vec![pattern]
        }
    }

    /// Structural match of `pattern` against the ground atom `cand`,
    /// recording fresh bindings on `trail`. `quote` counts unmatched
    /// `Quote` wrappers; at positive depth variables are inert.
    fn matches(
        &self,
        pattern: AtomId,
        cand: AtomId,
        binding: &mut Vec<OptAtomId>,
        trail: &mut Vec<usize>,
        quote: usize,
    ) -> bool {
        let view = self.view;
        let reg = view.types();
        let pty = view.atom_type(pattern);

        if quote == 0 && reg.is_a(pty, types::VARIABLE) {
            if let Some(i) = self.vars.index_of(pattern) {
                return match get_atom(binding[i]) {
                    Some(bound) => bound == cand,
                    None => {
                        if view.has_variables(cand) || view.is_scratch(cand) {
                            return false;
                        }
                        if let Some(c) = self.vars.constraint(i) {
                            if !reg.is_a(view.atom_type(cand), c) {
                                return false;
                            }
                        }
                        binding[i] = some_atom(cand);
                        trail.push(i);
                        true
                    }
                };
            }
            // Undeclared variables only stand for themselves.
            return pattern == cand;
        }
        if reg.is_a(pty, types::QUOTE) && view.arity(pattern) == 1 {
            return self.matches(view.outgoing(pattern)[0], cand, binding, trail, quote + 1);
        }
        if reg.is_a(pty, types::UNQUOTE) && view.arity(pattern) == 1 && quote > 0 {
            return self.matches(view.outgoing(pattern)[0], cand, binding, trail, quote - 1);
        }
        match (view.is_link(pattern), view.is_link(cand)) {
            (false, _) => pattern == cand,
            (true, false) => false,
            (true, true) => {
                // Candidate types may refine the pattern's link type.
                if !reg.is_a(view.atom_type(cand), pty) {
                    return false;
                }
                let pc = view.outgoing(pattern);
                let cc = view.outgoing(cand);
                pc.len() == cc.len()
                    && pc
                        .iter()
                        .zip(cc)
                        .all(|(&p, &c)| self.matches(p, c, binding, trail, quote))
            }
        }
    }

    fn eval(&self, filter: &Filter, binding: &[OptAtomId]) -> bool {
        match filter {
            Filter::Equal(a, b) => {
                let map = self.assignment(binding);
                rewrite::substitute(self.view, *a, &map) == rewrite::substitute(self.view, *b, &map)
            }
            Filter::Absent(t) => self.find_instance(*t, binding).is_none(),
            Filter::Found(t) => self.find_instance(*t, binding).is_some(),
            Filter::Not(inner) => !self.eval(inner, binding),
        }
    }

    /// Instantiates `t` under the assignment and resolves it in the view.
    /// Scratch hits do not count: the query's own text is not data.
    fn find_instance(&self, t: AtomId, binding: &[OptAtomId]) -> Option<AtomId> {
        let instance = rewrite::substitute(self.view, t, &self.assignment(binding));
        self.view
            .lookup_term(&instance)
            .filter(|&id| !self.view.is_scratch(id))
    }

    fn assignment(&self, binding: &[OptAtomId]) -> IndexMap<AtomId, AtomId> {
        let mut map = IndexMap::new();
        for (i, &slot) in binding.iter().enumerate() {
            if let Some(atom) = get_atom(slot) {
                map.insert(self.vars.var(i), atom);
            }
        }
        map
    }
}

/// The domain a variable ranges over: ground, non-scratch atoms of the
/// constraint type (inheritance-closed), or of any type at all.
fn ground_atoms<V: AtomView>(view: &V, constraint: Option<TypeId>) -> Vec<AtomId> {
    let pool: RoaringTreemap = match constraint {
        Some(ty) => view.atoms_isa(ty),
        None => (0..view.len() as u64).collect(),
    };
    pool.iter()
        .map(|id| id as AtomId)
        .filter(|&id| !view.has_variables(id) && !view.is_scratch(id))
        .collect()
}

// Unit tests are in tests/unit_meet.rs
