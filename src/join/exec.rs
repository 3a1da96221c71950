//! Running a compiled join: ground, ascend, prune, rewrite, deliver.

use std::sync::mpsc;

use indexmap::{IndexMap, IndexSet};
use roaring::RoaringTreemap;

use crate::id::AtomId;
use crate::overlay::Overlay;
use crate::query;
use crate::rewrite;
use crate::store::{AtomSink, AtomView, Store};
use crate::term::Term;
use crate::types;

use super::{filter, subst, JoinResult, JoinSpec, Traverse};

impl JoinSpec {
    /// Runs the backing meet in a scratch overlay and computes the
    /// principal set: the constants, plus every witnessing instance of a
    /// pattern clause under a satisfying assignment. Also records which
    /// atom grounded which variable. Grounded atoms and instances are
    /// always base atoms, so everything returned outlives the overlay.
    fn principals(
        &self,
        view: &mut Overlay<'_>,
        trav: &mut Traverse,
    ) -> JoinResult<RoaringTreemap> {
        let mut seeds = RoaringTreemap::new();
        for &constant in &self.constants {
            seeds.insert(constant as u64);
        }
        let meet = match &self.meet {
            Some(term) => term,
            None => return Ok(seeds),
        };
        let meet_id = view.intern_term(meet);
        // Meet(decls, And(clauses...)): the And child is the search body.
        let body = view.outgoing(meet_id)[1];
        let clauses = view.outgoing(body).to_vec();
        let groundings = query::ground(view, &self.vars, &clauses)?;
        let patterns = pattern_seeds(view, &clauses);
        for tuple in groundings.iter() {
            let assignment: IndexMap<AtomId, AtomId> = (0..self.vars.len())
                .map(|i| (self.vars.var(i), tuple[i]))
                .collect();
            for &pattern in &patterns {
                let instance = rewrite::substitute(view, pattern, &assignment);
                if let Some(id) = view.lookup_term(&instance) {
                    if !view.is_scratch(id) {
                        seeds.insert(id as u64);
                    }
                }
            }
            for (i, &atom) in tuple.iter().enumerate() {
                trav.replace_map
                    .entry(atom)
                    .or_insert_with(|| self.vars.var(i));
                trav.join_map[i].insert(atom as u64);
            }
        }
        Ok(seeds)
    }

    /// Computes the container set as detached terms.
    ///
    /// With variables: ground them, close upward from every principal,
    /// prune to the joined elements, keep the minimal ones (or climb to
    /// the absolute tops for a maximal join). Without variables the
    /// constant clauses are the whole container set. Top-type directives
    /// then filter, and replacement directives rewrite.
    pub fn container(&self, base: &Store) -> JoinResult<IndexSet<Term>> {
        let mut view = Overlay::new(base);
        let mut trav = Traverse::new(self.vars.len());

        let mut containers = if self.vars.is_empty() {
            self.constants.iter().map(|&c| c as u64).collect()
        } else {
            let seeds = self.principals(&mut view, &mut trav)?;
            let upset = filter::upper_set(&view, &trav, &seeds);
            let mut found = filter::supremum(&view, &upset);
            if self.maximal {
                found = filter::find_top(&view, &found);
            }
            found
        };
        filter::constrain(&view, &self.top_types, &mut containers);

        let map = subst::fixup_replacements(&view, &self.replacements, &mut trav)?;
        Ok(subst::replace(&view, &containers, &map))
    }

    /// Executes the join against `store`: every container is interned and
    /// its id delivered through the returned queue. The queue is closed
    /// once all results are in, so draining it terminates. Errors surface
    /// before the store is touched.
    pub fn execute(&self, store: &mut Store) -> JoinResult<ResultQueue> {
        let results = self.container(store)?;
        let (tx, rx) = mpsc::channel();
        for term in &results {
            let id = store.intern_term(term);
            // The receiver is alive below, so send cannot fail.
            let _ = tx.send(id);
        }
        drop(tx);
        Ok(ResultQueue { rx })
    }
}

/// The clause subterms whose instances seed the ascent: a `Present`
/// asserts its payload, an `Evaluation` asserts itself. Filter clauses
/// assert nothing and seed nothing.
fn pattern_seeds<V: AtomView>(view: &V, clauses: &[AtomId]) -> Vec<AtomId> {
    let reg = view.types();
    let mut out = Vec::new();
    for &clause in clauses {
        let ty = view.atom_type(clause);
        if reg.is_a(ty, types::PRESENT) {
            if let [payload] = view.outgoing(clause) {
                out.push(*payload);
            }
        } else if reg.is_a(ty, types::EVALUATION) {
            out.push(clause);
        }
    }
    out
}

/// The delivery side of [`JoinSpec::execute`]: a closed queue of interned
/// container ids.
pub struct ResultQueue {
    rx: mpsc::Receiver<AtomId>,
}

impl ResultQueue {
    /// The next result, or `None` once the queue is drained.
    pub fn recv(&self) -> Option<AtomId> {
        self.rx.recv().ok()
    }
}

impl Iterator for ResultQueue {
    type Item = AtomId;

    fn next(&mut self) -> Option<AtomId> {
        self.recv()
    }
}

// Unit tests are in tests/unit_join.rs
