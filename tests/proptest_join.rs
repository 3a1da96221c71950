//! Property tests for the join operator against a reference model.
//!
//! Worlds are random membership graphs with nested list containers. The
//! reference recomputes the expected container set from first principles:
//! witnessing member links, upward closure through non-artifact atoms,
//! joined-ness pruning, then the minimal (or top) elements.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use joinspace::id::AtomId;
use joinspace::join::{JoinError, JoinSpec};
use joinspace::pretty::pretty_term;
use joinspace::rewrite;
use joinspace::store::{AtomSink, AtomView, Store};
use joinspace::types;
use proptest::prelude::*;

// ============================================================================
// STRATEGIES
// ============================================================================

/// A membership graph: `concepts` nodes, member edges between them, lists
/// of member links, and lists of those lists.
#[derive(Clone, Debug)]
struct World {
    concepts: usize,
    members: Vec<(usize, usize)>,
    lists: Vec<Vec<usize>>,
    superlists: Vec<Vec<usize>>,
}

fn arb_world() -> impl Strategy<Value = World> {
    (2usize..6)
        .prop_flat_map(|concepts| {
            (
                Just(concepts),
                prop::collection::vec((0..concepts, 0..concepts), 1..8),
            )
        })
        .prop_flat_map(|(concepts, members)| {
            let edges = members.len();
            (
                Just(concepts),
                Just(members),
                prop::collection::vec(prop::collection::vec(0..edges, 1..4), 0..3),
            )
        })
        .prop_flat_map(|(concepts, members, lists)| {
            let superlists = if lists.is_empty() {
                Just(Vec::<Vec<usize>>::new()).boxed()
            } else {
                prop::collection::vec(prop::collection::vec(0..lists.len(), 1..3), 0..2).boxed()
            };
            (Just(concepts), Just(members), Just(lists), superlists)
        })
        .prop_map(|(concepts, members, lists, superlists)| World {
            concepts,
            members,
            lists,
            superlists,
        })
}

// ============================================================================
// TEST HELPERS
// ============================================================================

fn build(world: &World) -> (Store, Vec<AtomId>, Vec<AtomId>) {
    let mut store = Store::new();
    let concepts: Vec<AtomId> = (0..world.concepts)
        .map(|i| store.add_node(types::CONCEPT, &format!("c{}", i)))
        .collect();
    let members: Vec<AtomId> = world
        .members
        .iter()
        .map(|&(a, b)| store.add_link(types::MEMBER, vec![concepts[a], concepts[b]]))
        .collect();
    let lists: Vec<AtomId> = world
        .lists
        .iter()
        .map(|group| {
            let children = group.iter().map(|&i| members[i]).collect();
            store.add_link(types::LIST, children)
        })
        .collect();
    for group in &world.superlists {
        let children = group.iter().map(|&i| lists[i]).collect();
        store.add_link(types::LIST, children);
    }
    (store, concepts, members)
}

/// `(Join (Variable "X") (Present (Member (Variable "X") <target>)))`,
/// interned directly.
fn member_join(store: &mut Store, target: AtomId, maximal: bool) -> AtomId {
    let x = store.add_node(types::VARIABLE, "X");
    let pattern = store.add_link(types::MEMBER, vec![x, target]);
    let present = store.add_link(types::PRESENT, vec![pattern]);
    let ty = if maximal { types::MAXIMAL_JOIN } else { types::JOIN };
    store.add_link(ty, vec![x, present])
}

fn container_ids(store: &Store, op: AtomId) -> BTreeSet<AtomId> {
    let spec = JoinSpec::new(store, op).expect("spec");
    spec.container(store)
        .expect("container")
        .iter()
        .map(|term| store.lookup_term(term).expect("container is interned"))
        .collect()
}

// ============================================================================
// REFERENCE MODEL
// ============================================================================

fn artifact(store: &Store, id: AtomId) -> bool {
    if store.has_variables(id) {
        return true;
    }
    let reg = &store.types;
    let ty = store.atom_type(id);
    reg.is_a(ty, types::JOIN)
        || reg.is_a(ty, types::MEET)
        || reg.is_a(ty, types::PRESENT)
        || reg.is_a(ty, types::ABSENT)
        || reg.is_a(ty, types::REPLACEMENT)
        || reg.is_a(ty, types::TYPE_CHOICE)
        || ty == types::TYPE
        || ty == types::TYPE_INH
}

/// Ground member links ending at `target`.
fn witnesses(store: &Store, target: AtomId) -> BTreeSet<AtomId> {
    (0..store.len())
        .filter(|&id| {
            store.atom_type(id) == types::MEMBER
                && !store.has_variables(id)
                && store.outgoing(id).len() == 2
                && store.outgoing(id)[1] == target
        })
        .collect()
}

/// The atoms grounding the pattern variable for `target`.
fn groundings(store: &Store, target: AtomId) -> BTreeSet<AtomId> {
    witnesses(store, target)
        .into_iter()
        .map(|id| store.outgoing(id)[0])
        .collect()
}

fn closure_up(store: &Store, seeds: &BTreeSet<AtomId>) -> BTreeSet<AtomId> {
    let mut upset = seeds.clone();
    let mut stack: Vec<AtomId> = seeds.iter().copied().collect();
    while let Some(id) = stack.pop() {
        for parent in store.incoming(id) {
            let parent = parent as AtomId;
            if artifact(store, parent) {
                continue;
            }
            if upset.insert(parent) {
                stack.push(parent);
            }
        }
    }
    upset
}

fn minimal_of(store: &Store, upset: &BTreeSet<AtomId>) -> BTreeSet<AtomId> {
    upset
        .iter()
        .copied()
        .filter(|&id| !store.outgoing(id).iter().any(|child| upset.contains(child)))
        .collect()
}

fn tops_of(store: &Store, sup: &BTreeSet<AtomId>) -> BTreeSet<AtomId> {
    let mut tops = BTreeSet::new();
    let mut seen = sup.clone();
    let mut stack: Vec<AtomId> = sup.iter().copied().collect();
    while let Some(id) = stack.pop() {
        let parents: Vec<AtomId> = store
            .incoming(id)
            .iter()
            .map(|p| p as AtomId)
            .filter(|&p| !artifact(store, p))
            .collect();
        if parents.is_empty() {
            tops.insert(id);
        }
        for parent in parents {
            if seen.insert(parent) {
                stack.push(parent);
            }
        }
    }
    tops
}

fn contains_any(store: &Store, id: AtomId, targets: &BTreeSet<AtomId>) -> bool {
    if targets.contains(&id) {
        return true;
    }
    store
        .outgoing(id)
        .iter()
        .any(|&child| contains_any(store, child, targets))
}

fn reference_minimal(store: &Store, target: AtomId) -> BTreeSet<AtomId> {
    let upset = closure_up(store, &witnesses(store, target));
    minimal_of(store, &upset)
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// A single-variable join answers exactly the minimal non-artifact
    /// containers of its witnessing member links.
    #[test]
    fn join_matches_reference(world in arb_world(), pick in 0usize..8) {
        let (mut store, concepts, _) = build(&world);
        let target = concepts[pick % concepts.len()];
        let op = member_join(&mut store, target, false);
        prop_assert_eq!(
            container_ids(&store, op),
            reference_minimal(&store, target),
            "world: {:?}", world
        );
    }

    /// A maximal join climbs from those minimal containers to the tops.
    #[test]
    fn maximal_join_matches_reference(world in arb_world(), pick in 0usize..8) {
        let (mut store, concepts, _) = build(&world);
        let target = concepts[pick % concepts.len()];
        let op = member_join(&mut store, target, true);
        let expected = tops_of(&store, &reference_minimal(&store, target));
        prop_assert_eq!(container_ids(&store, op), expected, "world: {:?}", world);
    }

    /// A two-variable join keeps only containers reaching a grounding of
    /// both variables; an ungroundable variable empties the whole answer.
    #[test]
    fn joined_containers_cover_every_variable(
        world in arb_world(),
        pick1 in 0usize..8,
        pick2 in 0usize..8,
    ) {
        let (mut store, concepts, _) = build(&world);
        let t1 = concepts[pick1 % concepts.len()];
        let t2 = concepts[pick2 % concepts.len()];

        let x = store.add_node(types::VARIABLE, "X");
        let y = store.add_node(types::VARIABLE, "Y");
        let decl = store.add_link(types::VARIABLE_LIST, vec![x, y]);
        let p1 = store.add_link(types::MEMBER, vec![x, t1]);
        let c1 = store.add_link(types::PRESENT, vec![p1]);
        let p2 = store.add_link(types::MEMBER, vec![y, t2]);
        let c2 = store.add_link(types::PRESENT, vec![p2]);
        let op = store.add_link(types::JOIN, vec![decl, c1, c2]);

        let g1 = groundings(&store, t1);
        let g2 = groundings(&store, t2);
        let expected = if g1.is_empty() || g2.is_empty() {
            BTreeSet::new()
        } else {
            let mut seeds = witnesses(&store, t1);
            seeds.extend(witnesses(&store, t2));
            let joined: BTreeSet<AtomId> = closure_up(&store, &seeds)
                .into_iter()
                .filter(|&id| contains_any(&store, id, &g1) && contains_any(&store, id, &g2))
                .collect();
            minimal_of(&store, &joined)
        };
        prop_assert_eq!(container_ids(&store, op), expected, "world: {:?}", world);
    }

    /// Computing containers twice gives the same answer, and executing a
    /// directive-free join never grows the store.
    #[test]
    fn join_is_stable(world in arb_world(), pick in 0usize..8) {
        let (mut store, concepts, _) = build(&world);
        let target = concepts[pick % concepts.len()];
        let op = member_join(&mut store, target, false);

        let spec = JoinSpec::new(&store, op).expect("spec");
        let first = spec.container(&store).expect("container");
        let second = spec.container(&store).expect("container");
        prop_assert_eq!(&first, &second);

        let before = store.len();
        let delivered: BTreeSet<AtomId> =
            spec.execute(&mut store).expect("execute").collect();
        prop_assert_eq!(store.len(), before, "verbatim containers are interned already");

        let again: BTreeSet<AtomId> = spec.execute(&mut store).expect("execute").collect();
        prop_assert_eq!(delivered, again);
    }

    /// A zero-variable join answers its constant clauses exactly,
    /// containers of the constants notwithstanding.
    #[test]
    fn constant_join_is_exact(world in arb_world(), pick in 0usize..8) {
        let (mut store, _, members) = build(&world);
        let m = members[pick % members.len()];
        let present = store.add_link(types::PRESENT, vec![m]);
        let op = store.add_link(types::JOIN, vec![present]);

        let spec = JoinSpec::new(&store, op).expect("spec");
        let found = spec.container(&store).expect("container");
        prop_assert_eq!(found.len(), 1);
        prop_assert!(found.contains(&store.export_term(m)), "found: {:?}", found);
    }

    /// A replacement directive needs exactly one grounding: none is an
    /// error, one rewrites every container at that site, several refuse.
    #[test]
    fn replacement_requires_a_unique_grounding(world in arb_world(), pick in 0usize..8) {
        let (mut store, concepts, _) = build(&world);
        let target = concepts[pick % concepts.len()];

        let x = store.add_node(types::VARIABLE, "X");
        let pattern = store.add_link(types::MEMBER, vec![x, target]);
        let present = store.add_link(types::PRESENT, vec![pattern]);
        let fresh = store.add_node(types::CONCEPT, "redacted");
        let directive = store.add_link(types::REPLACEMENT, vec![x, fresh]);
        let op = store.add_link(types::JOIN, vec![x, present, directive]);

        let grounded = groundings(&store, target);
        let spec = JoinSpec::new(&store, op).expect("spec");
        match spec.container(&store) {
            Ok(found) => {
                prop_assert_eq!(grounded.len(), 1, "only a unique grounding may succeed");
                let site = *grounded.iter().next().expect("site");
                let mut map = IndexMap::new();
                map.insert(site, fresh);
                let expected: BTreeSet<String> = reference_minimal(&store, target)
                    .iter()
                    .map(|&id| pretty_term(&store.types, &rewrite::substitute(&store, id, &map)))
                    .collect();
                let found: BTreeSet<String> = found
                    .iter()
                    .map(|term| pretty_term(&store.types, term))
                    .collect();
                prop_assert_eq!(found, expected);
            }
            Err(JoinError::UnboundReplacement(_)) => {
                prop_assert!(grounded.is_empty(), "unbound despite {:?}", grounded);
            }
            Err(JoinError::AmbiguousReplacement { count, .. }) => {
                prop_assert_eq!(count, grounded.len());
                prop_assert!(count > 1);
            }
            Err(other) => {
                prop_assert!(false, "unexpected error: {:?}", other);
            }
        }
    }

    /// A top-type directive keeps exactly the reference containers of the
    /// named type.
    #[test]
    fn type_directive_restricts(world in arb_world(), pick in 0usize..8) {
        let (mut store, concepts, _) = build(&world);
        let target = concepts[pick % concepts.len()];

        let x = store.add_node(types::VARIABLE, "X");
        let pattern = store.add_link(types::MEMBER, vec![x, target]);
        let present = store.add_link(types::PRESENT, vec![pattern]);
        let ty_node = store.add_node(types::TYPE, "List");
        let op = store.add_link(types::JOIN, vec![x, present, ty_node]);

        let expected: BTreeSet<AtomId> = reference_minimal(&store, target)
            .into_iter()
            .filter(|&id| store.atom_type(id) == types::LIST)
            .collect();
        prop_assert_eq!(container_ids(&store, op), expected, "world: {:?}", world);
    }
}
