//! Replacement directives: rewiring the replace map, then rewriting the
//! found containers at the grounded sites.

use indexmap::{IndexMap, IndexSet};
use roaring::RoaringTreemap;

use crate::id::AtomId;
use crate::pretty::pretty_atom;
use crate::rewrite;
use crate::store::AtomView;
use crate::term::Term;

use super::{JoinError, JoinResult, Traverse};

/// Applies the `Replacement` directives to the replace map, in body order.
///
/// Each directive retargets the unique map entry currently aimed at its
/// source; sources with no grounding, or with several, are errors. Later
/// directives may name an earlier directive's target, so chains resolve
/// left to right. Returns the substitution map restricted to the entries
/// a directive touched; everything else stays itself.
pub(super) fn fixup_replacements<V: AtomView>(
    view: &V,
    replacements: &[AtomId],
    trav: &mut Traverse,
) -> JoinResult<IndexMap<AtomId, AtomId>> {
    let mut touched: IndexSet<AtomId> = IndexSet::new();
    for &directive in replacements {
        let children = view.outgoing(directive);
        if children.len() != 2 {
            return Err(JoinError::ReplacementArity(children.len()));
        }
        let (from, to) = (children[0], children[1]);
        let sites: Vec<AtomId> = trav
            .replace_map
            .iter()
            .filter(|&(_, &target)| target == from)
            .map(|(&site, _)| site)
            .collect();
        match sites.len() {
            0 => return Err(JoinError::UnboundReplacement(pretty_atom(view, from))),
            1 => {
                if let Some(target) = trav.replace_map.get_mut(&sites[0]) {
                    *target = to;
                }
                touched.insert(sites[0]);
            }
            n => {
                return Err(JoinError::AmbiguousReplacement {
                    source: pretty_atom(view, from),
                    count: n,
                });
            }
        }
    }
    Ok(trav
        .replace_map
        .iter()
        .filter(|(site, _)| touched.contains(*site))
        .map(|(&site, &target)| (site, target))
        .collect())
}

/// Exports each container, substituting at the replaced sites. Distinct
/// containers can rewrite to the same term; the set deduplicates them.
pub(super) fn replace<V: AtomView>(
    view: &V,
    containers: &RoaringTreemap,
    map: &IndexMap<AtomId, AtomId>,
) -> IndexSet<Term> {
    containers
        .iter()
        .map(|id| {
            let id = id as AtomId;
            if map.is_empty() {
                view.export_term(id)
            } else {
                rewrite::substitute(view, id, map)
            }
        })
        .collect()
}

// Unit tests are in tests/unit_join.rs
