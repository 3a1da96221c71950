//! The containment ascent: from grounded principals up through incoming
//! sets to the containers a join returns.

use roaring::RoaringTreemap;

use crate::id::AtomId;
use crate::store::AtomView;
use crate::types;

use super::{Traverse, TypeSpec};

/// Structure the ascent must not climb into: scratch search structure,
/// anything mentioning variables, and the query operators themselves.
/// Containment is a property of the data, not of queries over it.
pub(super) fn is_artifact<V: AtomView>(view: &V, id: AtomId) -> bool {
    if view.is_scratch(id) || view.has_variables(id) {
        return true;
    }
    let reg = view.types();
    let ty = view.atom_type(id);
    reg.is_a(ty, types::JOIN)
        || reg.is_a(ty, types::MEET)
        || reg.is_a(ty, types::PRESENT)
        || reg.is_a(ty, types::ABSENT)
        || reg.is_a(ty, types::REPLACEMENT)
        || reg.is_a(ty, types::TYPE_CHOICE)
        || ty == types::TYPE
        || ty == types::TYPE_INH
}

/// Everything at or above `seed` in the containment order, climbing only
/// through non-artifact atoms. An artifact seed filters to nothing.
pub(super) fn principal_filter<V: AtomView>(view: &V, seed: AtomId) -> RoaringTreemap {
    let mut out = RoaringTreemap::new();
    if is_artifact(view, seed) {
        return out;
    }
    out.insert(seed as u64);
    let mut stack = vec![seed];
    while let Some(id) = stack.pop() {
        for parent in view.incoming(id) {
            let parent = parent as AtomId;
            if !out.contains(parent as u64) && !is_artifact(view, parent) {
                out.insert(parent as u64);
                stack.push(parent);
            }
        }
    }
    out
}

/// The upward closure of every principal. With more than one variable the
/// closure is then pruned to the joined elements: atoms containing at
/// least one grounding of every variable.
pub(super) fn upper_set<V: AtomView>(
    view: &V,
    trav: &Traverse,
    seeds: &RoaringTreemap,
) -> RoaringTreemap {
    let mut upset = RoaringTreemap::new();
    for seed in seeds {
        upset |= principal_filter(view, seed as AtomId);
    }
    if trav.join_map.len() > 1 {
        let joined: Vec<u64> = upset
            .iter()
            .filter(|&id| {
                let id = id as AtomId;
                trav.join_map
                    .iter()
                    .all(|groundings| contains_any(view, id, groundings))
            })
            .collect();
        upset = joined.into_iter().collect();
    }
    upset
}

/// True when `root` or any atom beneath it is in `targets`.
fn contains_any<V: AtomView>(view: &V, root: AtomId, targets: &RoaringTreemap) -> bool {
    let mut seen = RoaringTreemap::new();
    seen.insert(root as u64);
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if targets.contains(id as u64) {
            return true;
        }
        for &child in view.outgoing(id) {
            if !seen.contains(child as u64) {
                seen.insert(child as u64);
                stack.push(child);
            }
        }
    }
    false
}

/// The minimal elements of `upset`: those with no direct child in it.
pub(super) fn supremum<V: AtomView>(view: &V, upset: &RoaringTreemap) -> RoaringTreemap {
    let mut sup = upset.clone();
    for id in upset {
        let id = id as AtomId;
        if view.outgoing(id).iter().any(|&child| upset.contains(child as u64)) {
            sup.remove(id as u64);
        }
    }
    sup
}

/// Ascends from each element of `sup` to the absolute tops: atoms whose
/// every containing link is an artifact.
pub(super) fn find_top<V: AtomView>(view: &V, sup: &RoaringTreemap) -> RoaringTreemap {
    let mut tops = RoaringTreemap::new();
    let mut seen = RoaringTreemap::new();
    let mut stack: Vec<AtomId> = sup.iter().map(|id| id as AtomId).collect();
    seen.extend(sup.iter());
    while let Some(id) = stack.pop() {
        let mut root = true;
        for parent in view.incoming(id) {
            let parent = parent as AtomId;
            if is_artifact(view, parent) {
                continue;
            }
            root = false;
            if !seen.contains(parent as u64) {
                seen.insert(parent as u64);
                stack.push(parent);
            }
        }
        if root {
            tops.insert(id as u64);
        }
    }
    tops
}

/// Drops containers whose type fails any top-type directive.
pub(super) fn constrain<V: AtomView>(
    view: &V,
    specs: &[TypeSpec],
    containers: &mut RoaringTreemap,
) {
    if specs.is_empty() {
        return;
    }
    let reg = view.types();
    let rejected: Vec<u64> = containers
        .iter()
        .filter(|&id| {
            let ty = view.atom_type(id as AtomId);
            !specs.iter().all(|spec| spec.admits(reg, ty))
        })
        .collect();
    for id in rejected {
        containers.remove(id);
    }
}

// Unit tests are in tests/unit_join.rs
