//! Variable analysis and substitution over stored atoms.
//!
//! These walks respect `Quote`/`Unquote` depth and scope declarations: a
//! variable under an unmatched `Quote` is inert, and a variable bound by an
//! enclosing scope's declaration is not free in its body.

use indexmap::{IndexMap, IndexSet};

use crate::id::AtomId;
use crate::store::{AtomKey, AtomView};
use crate::term::Term;
use crate::types;

/// Variables bound by a declaration form: a bare variable, a
/// `TypedVariable`, or a `VariableList` of either.
///
/// Malformed declarations contribute nothing rather than failing; strict
/// validation happens where declarations are compiled.
pub fn declared_variables<V: AtomView>(view: &V, decl: AtomId) -> Vec<AtomId> {
    let mut out = Vec::new();
    collect_declared(view, decl, &mut out);
    out
}

fn collect_declared<V: AtomView>(view: &V, decl: AtomId, out: &mut Vec<AtomId>) {
    let ty = view.atom_type(decl);
    let reg = view.types();
    if reg.is_a(ty, types::VARIABLE) {
        out.push(decl);
    } else if reg.is_a(ty, types::TYPED_VARIABLE) {
        if let Some(&var) = view.outgoing(decl).first() {
            out.push(var);
        }
    } else if reg.is_a(ty, types::VARIABLE_LIST) {
        for &child in view.outgoing(decl) {
            collect_declared(view, child, out);
        }
    }
}

/// Free variables of an atom, in first-occurrence order.
pub fn free_variables<V: AtomView>(view: &V, id: AtomId) -> IndexSet<AtomId> {
    let mut free = IndexSet::new();
    let mut bound: Vec<IndexSet<AtomId>> = Vec::new();
    walk_free(view, id, 0, &mut bound, &mut free);
    free
}

fn walk_free<V: AtomView>(
    view: &V,
    id: AtomId,
    quote: usize,
    bound: &mut Vec<IndexSet<AtomId>>,
    free: &mut IndexSet<AtomId>,
) {
    let ty = view.atom_type(id);
    let reg = view.types();
    if reg.is_a(ty, types::VARIABLE) {
        if quote == 0 && !bound.iter().any(|frame| frame.contains(&id)) {
            free.insert(id);
        }
        return;
    }
    if reg.is_a(ty, types::QUOTE) && view.arity(id) == 1 {
        walk_free(view, view.outgoing(id)[0], quote + 1, bound, free);
        return;
    }
    if reg.is_a(ty, types::UNQUOTE) && view.arity(id) == 1 && quote > 0 {
        walk_free(view, view.outgoing(id)[0], quote - 1, bound, free);
        return;
    }
    if reg.is_a(ty, types::SCOPE) && quote == 0 && view.arity(id) >= 2 {
        let children = view.outgoing(id);
        // Variables in the declaration are binding occurrences, not uses.
        let frame: IndexSet<AtomId> = declared_variables(view, children[0]).into_iter().collect();
        bound.push(frame);
        for &child in &children[1..] {
            walk_free(view, child, quote, bound, free);
        }
        bound.pop();
        return;
    }
    for &child in view.outgoing(id) {
        walk_free(view, child, quote, bound, free);
    }
}

/// Rebuilds the atom as a term with every mapped free variable replaced by
/// the export of its target. Quoted occurrences and occurrences bound by an
/// inner scope keep the variable.
pub fn substitute<V: AtomView>(view: &V, id: AtomId, map: &IndexMap<AtomId, AtomId>) -> Term {
    let mut bound: Vec<IndexSet<AtomId>> = Vec::new();
    rebuild(view, id, map, 0, &mut bound)
}

fn rebuild<V: AtomView>(
    view: &V,
    id: AtomId,
    map: &IndexMap<AtomId, AtomId>,
    quote: usize,
    bound: &mut Vec<IndexSet<AtomId>>,
) -> Term {
    if quote == 0 && !bound.iter().any(|frame| frame.contains(&id)) {
        if let Some(&target) = map.get(&id) {
            return view.export_term(target);
        }
    }
    let ty = view.atom_type(id);
    let reg = view.types();
    if reg.is_a(ty, types::QUOTE) && view.arity(id) == 1 {
        let inner = rebuild(view, view.outgoing(id)[0], map, quote + 1, bound);
        return Term::Link(ty, vec![inner]);
    }
    if reg.is_a(ty, types::UNQUOTE) && view.arity(id) == 1 && quote > 0 {
        let inner = rebuild(view, view.outgoing(id)[0], map, quote - 1, bound);
        return Term::Link(ty, vec![inner]);
    }
    if reg.is_a(ty, types::SCOPE) && quote == 0 && view.arity(id) >= 2 {
        let children = view.outgoing(id);
        let frame: IndexSet<AtomId> = declared_variables(view, children[0]).into_iter().collect();
        let mut terms = Vec::with_capacity(children.len());
        terms.push(view.export_term(children[0]));
        bound.push(frame);
        for &child in &children[1..] {
            terms.push(rebuild(view, child, map, quote, bound));
        }
        bound.pop();
        return Term::Link(ty, terms);
    }
    match view.key(id) {
        AtomKey::Node(ty, name) => Term::Node(*ty, name.clone()),
        AtomKey::Link(ty, children) => Term::Link(
            *ty,
            children
                .iter()
                .map(|&c| rebuild(view, c, map, quote, bound))
                .collect(),
        ),
    }
}

// Unit tests are in tests/unit_rewrite.rs
