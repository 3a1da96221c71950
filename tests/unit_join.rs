//! Unit tests for the join operator.
//!
//! A join grounds its clauses, climbs the container order from each
//! witnessing instance, and answers the least containers (or the absolute
//! tops for a maximal join), with type directives filtering and replacement
//! directives rewriting on the way out.

use joinspace::id::AtomId;
use joinspace::join::{JoinError, JoinErrorKind, JoinSpec};
use joinspace::query::QueryError;
use joinspace::store::{AtomSink, AtomView, Store};
use joinspace::term::Term;
use joinspace::types;

// ============================================================================
// TEST HELPERS
// ============================================================================

fn loaded(source: &str) -> (Store, Vec<AtomId>) {
    let mut store = Store::new();
    let ids = store.load_source(source).expect("load");
    (store, ids)
}

/// Compiles the last loaded form as a join and computes its containers.
fn containers_of(source: &str) -> Result<Vec<Term>, JoinError> {
    let (store, ids) = loaded(source);
    let op = *ids.last().expect("at least one form");
    let spec = JoinSpec::new(&store, op)?;
    Ok(spec.container(&store)?.into_iter().collect())
}

fn member(source: &str, target: &str) -> Term {
    Term::link(
        types::MEMBER,
        vec![Term::concept(source), Term::concept(target)],
    )
}

fn assert_terms(found: &[Term], expected: &[Term]) {
    assert_eq!(found.len(), expected.len(), "container set: {:?}", found);
    for term in expected {
        assert!(found.contains(term), "missing {:?} in {:?}", term, found);
    }
}

// ============================================================================
// CONTAINER SEMANTICS
// ============================================================================

#[test]
fn test_join_answers_witnessing_instances() {
    let found = containers_of(
        r#"
        (Member (Concept "sea") (Concept "beach"))
        (Member (Concept "sand") (Concept "beach"))
        (Join
          (VariableList (Variable "X") (Variable "Y"))
          (Present (Member (Variable "X") (Concept "beach")))
          (Present (Member (Variable "Y") (Concept "beach"))))
        "#,
    )
    .expect("join");
    assert_terms(&found, &[member("sea", "beach"), member("sand", "beach")]);
}

#[test]
fn test_single_variable_join() {
    let found = containers_of(
        r#"
        (Member (Concept "sea") (Concept "beach"))
        (Member (Concept "sand") (Concept "beach"))
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach"))))
        "#,
    )
    .expect("join");
    assert_terms(&found, &[member("sea", "beach"), member("sand", "beach")]);
}

#[test]
fn test_minimal_containers_drop_ancestors() {
    let found = containers_of(
        r#"
        (Member (Concept "sea") (Concept "beach"))
        (List (Member (Concept "sea") (Concept "beach")))
        (List (List (Member (Concept "sea") (Concept "beach"))))
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach"))))
        "#,
    )
    .expect("join");
    assert_terms(&found, &[member("sea", "beach")]);
}

#[test]
fn test_maximal_join_climbs_to_roots() {
    let found = containers_of(
        r#"
        (Member (Concept "sea") (Concept "beach"))
        (List (Member (Concept "sea") (Concept "beach")))
        (List (List (Member (Concept "sea") (Concept "beach"))))
        (MaximalJoin (Variable "X")
          (Present (Member (Variable "X") (Concept "beach"))))
        "#,
    )
    .expect("join");
    let expected = Term::link(
        types::LIST,
        vec![Term::link(types::LIST, vec![member("sea", "beach")])],
    );
    assert_terms(&found, &[expected]);
}

#[test]
fn test_maximal_join_without_containers_answers_instances() {
    let found = containers_of(
        r#"
        (Member (Concept "sea") (Concept "beach"))
        (Member (Concept "sand") (Concept "beach"))
        (MaximalJoin
          (VariableList (Variable "X") (Variable "Y"))
          (Present (Member (Variable "X") (Concept "beach")))
          (Present (Member (Variable "Y") (Concept "beach"))))
        "#,
    )
    .expect("join");
    assert_terms(&found, &[member("sea", "beach"), member("sand", "beach")]);
}

#[test]
fn test_two_variables_need_a_shared_container() {
    let shared = r#"
        (Member (Concept "sand") (Concept "beach"))
        (Member (Concept "fish") (Concept "sea"))
        (List
          (Member (Concept "sand") (Concept "beach"))
          (Member (Concept "fish") (Concept "sea")))
        (Join
          (VariableList (Variable "X") (Variable "Y"))
          (Present (Member (Variable "X") (Concept "beach")))
          (Present (Member (Variable "Y") (Concept "sea"))))
        "#;
    let found = containers_of(shared).expect("join");
    let expected = Term::link(
        types::LIST,
        vec![member("sand", "beach"), member("fish", "sea")],
    );
    assert_terms(&found, &[expected]);
}

#[test]
fn test_no_shared_container_is_empty() {
    let found = containers_of(
        r#"
        (Member (Concept "sand") (Concept "beach"))
        (Member (Concept "fish") (Concept "sea"))
        (Join
          (VariableList (Variable "X") (Variable "Y"))
          (Present (Member (Variable "X") (Concept "beach")))
          (Present (Member (Variable "Y") (Concept "sea"))))
        "#,
    )
    .expect("join");
    assert!(found.is_empty(), "disjoint witnesses have no common container: {:?}", found);
}

#[test]
fn test_zero_variable_join_answers_the_constants() {
    let found = containers_of(
        r#"
        (Member (Concept "sand") (Concept "beach"))
        (List (Member (Concept "sand") (Concept "beach")))
        (Join (Present (Member (Concept "sand") (Concept "beach"))))
        "#,
    )
    .expect("join");
    // The constant itself, not its enclosing list.
    assert_terms(&found, &[member("sand", "beach")]);
}

#[test]
fn test_constant_clause_beside_variables() {
    let found = containers_of(
        r#"
        (Member (Concept "sea") (Concept "beach"))
        (List (Concept "tide"))
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach")))
          (Present (Concept "tide")))
        "#,
    )
    .expect("join");
    assert_terms(&found, &[Term::concept("tide"), member("sea", "beach")]);
}

#[test]
fn test_query_artifacts_never_contain() {
    let found = containers_of(
        r#"
        (Member (Concept "sand") (Concept "beach"))
        (Present (Member (Concept "sand") (Concept "beach")))
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach"))))
        "#,
    )
    .expect("join");
    // The stored Present wrapper is not a container.
    assert_terms(&found, &[member("sand", "beach")]);
}

#[test]
fn test_maximal_join_skips_artifact_parents() {
    let found = containers_of(
        r#"
        (Member (Concept "sand") (Concept "beach"))
        (Present (Member (Concept "sand") (Concept "beach")))
        (MaximalJoin (Variable "X")
          (Present (Member (Variable "X") (Concept "beach"))))
        "#,
    )
    .expect("join");
    assert_terms(&found, &[member("sand", "beach")]);
}

#[test]
fn test_empty_join_is_empty() {
    let found = containers_of("(Join)").expect("join");
    assert!(found.is_empty());
}

#[test]
fn test_undeclared_variables_ground_nothing() {
    let found = containers_of(
        r#"
        (Member (Concept "sand") (Concept "beach"))
        (Join (Present (Member (Variable "X") (Concept "beach"))))
        "#,
    )
    .expect("join");
    assert!(found.is_empty(), "an undeclared variable has no groundings: {:?}", found);
}

// ============================================================================
// TYPE DIRECTIVES
// ============================================================================

#[test]
fn test_exact_type_directive() {
    let data = r#"
        (Member (Concept "sand") (Concept "beach"))
        "#;
    let keep = containers_of(&format!(
        r#"{}
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach")))
          (Type "Member"))"#,
        data
    ))
    .expect("join");
    assert_terms(&keep, &[member("sand", "beach")]);

    // Exact means exact: the parent type does not admit.
    let drop = containers_of(&format!(
        r#"{}
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach")))
          (Type "Link"))"#,
        data
    ))
    .expect("join");
    assert!(drop.is_empty(), "exact Link filter kept {:?}", drop);
}

#[test]
fn test_inherited_type_directive() {
    let data = r#"
        (Member (Concept "sand") (Concept "beach"))
        "#;
    let keep = containers_of(&format!(
        r#"{}
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach")))
          (TypeInh "Link"))"#,
        data
    ))
    .expect("join");
    assert_terms(&keep, &[member("sand", "beach")]);

    let drop = containers_of(&format!(
        r#"{}
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach")))
          (TypeInh "List"))"#,
        data
    ))
    .expect("join");
    assert!(drop.is_empty());
}

#[test]
fn test_type_choice_directive() {
    let data = r#"
        (Member (Concept "sand") (Concept "beach"))
        "#;
    let keep = containers_of(&format!(
        r#"{}
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach")))
          (TypeChoice (Type "List") (Type "Member")))"#,
        data
    ))
    .expect("join");
    assert_terms(&keep, &[member("sand", "beach")]);

    let drop = containers_of(&format!(
        r#"{}
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach")))
          (TypeChoice (Type "List") (Type "Evaluation")))"#,
        data
    ))
    .expect("join");
    assert!(drop.is_empty());
}

#[test]
fn test_typed_variable_narrows_groundings() {
    let found = containers_of(
        r#"
        (Member (Concept "sea") (Concept "beach"))
        (Member (Predicate "grainy") (Concept "beach"))
        (Join (TypedVariable (Variable "X") (TypeInh "Concept"))
          (Present (Member (Variable "X") (Concept "beach"))))
        "#,
    )
    .expect("join");
    assert_terms(&found, &[member("sea", "beach")]);
}

// ============================================================================
// REPLACEMENT DIRECTIVES
// ============================================================================

#[test]
fn test_unique_replacement_rewrites_results() {
    let found = containers_of(
        r#"
        (Member (Concept "sand") (Concept "beach"))
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach")))
          (Replacement (Variable "X") (Concept "shore")))
        "#,
    )
    .expect("join");
    assert_terms(&found, &[member("shore", "beach")]);
}

#[test]
fn test_replacements_chain_through_intermediates() {
    let found = containers_of(
        r#"
        (Member (Concept "sand") (Concept "beach"))
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach")))
          (Replacement (Variable "X") (Concept "mid"))
          (Replacement (Concept "mid") (Concept "final")))
        "#,
    )
    .expect("join");
    assert_terms(&found, &[member("final", "beach")]);
}

#[test]
fn test_ambiguous_replacement_is_rejected() {
    let result = containers_of(
        r#"
        (Member (Concept "sea") (Concept "beach"))
        (Member (Concept "sand") (Concept "beach"))
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach")))
          (Replacement (Variable "X") (Concept "shore")))
        "#,
    );
    match result {
        Err(JoinError::AmbiguousReplacement { count, .. }) => assert_eq!(count, 2),
        other => panic!("expected an ambiguous replacement, got {:?}", other),
    }
}

#[test]
fn test_unbound_replacement_is_rejected() {
    let result = containers_of(
        r#"
        (Member (Concept "sand") (Concept "beach"))
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach")))
          (Replacement (Concept "nowhere") (Concept "shore")))
        "#,
    );
    match result {
        Err(JoinError::UnboundReplacement(_)) => {}
        other => panic!("expected an unbound replacement, got {:?}", other),
    }
}

#[test]
fn test_replacement_arity_is_checked() {
    let result = containers_of(
        r#"
        (Member (Concept "sand") (Concept "beach"))
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach")))
          (Replacement (Variable "X")))
        "#,
    );
    assert_eq!(result, Err(JoinError::ReplacementArity(1)));
}

// ============================================================================
// SPEC CONSTRUCTION ERRORS
// ============================================================================

#[test]
fn test_operand_must_be_a_join() {
    let (store, ids) = loaded(r#"(Member (Concept "a") (Concept "b"))"#);
    match JoinSpec::new(&store, ids[0]) {
        Err(JoinError::NotAJoin(name)) => assert_eq!(name, "Member"),
        other => panic!("expected not-a-join, got {:?}", other),
    }

    // A Meet is a sibling scope, not a join.
    let (store, ids) = loaded(r#"(Meet (Variable "X") (Present (Variable "X")))"#);
    match JoinSpec::new(&store, *ids.last().expect("meet")) {
        Err(JoinError::NotAJoin(name)) => assert_eq!(name, "Meet"),
        other => panic!("expected not-a-join, got {:?}", other),
    }
}

#[test]
fn test_unsupported_clause_type() {
    let result = containers_of(r#"(Join (Variable "X") (List (Variable "X")))"#);
    assert_eq!(result, Err(JoinError::UnsupportedClause("List".into())));
}

#[test]
fn test_bad_declaration_arity() {
    let result = containers_of(
        r#"(Join
             (TypedVariable (Variable "X") (Type "Concept") (Type "Node"))
             (Present (Variable "X")))"#,
    );
    match result {
        Err(JoinError::BadDeclaration(msg)) => {
            assert!(msg.contains("found 3"), "message was {:?}", msg)
        }
        other => panic!("expected a declaration error, got {:?}", other),
    }
}

#[test]
fn test_declaration_must_bind_a_variable() {
    let result = containers_of(
        r#"(Join
             (TypedVariable (Concept "a") (Type "Concept"))
             (Present (Concept "a")))"#,
    );
    match result {
        Err(JoinError::BadDeclaration(msg)) => {
            assert!(msg.contains("Concept"), "message was {:?}", msg)
        }
        other => panic!("expected a declaration error, got {:?}", other),
    }
}

#[test]
fn test_variable_list_rejects_non_variables() {
    let result = containers_of(
        r#"(Join
             (VariableList (Variable "X") (Concept "a"))
             (Present (Variable "X")))"#,
    );
    assert_eq!(result, Err(JoinError::BadDeclaration("Concept".into())));
}

#[test]
fn test_constraint_must_be_a_plain_type() {
    let result = containers_of(
        r#"(Join
             (TypedVariable (Variable "X") (Concept "c"))
             (Present (Variable "X")))"#,
    );
    assert_eq!(result, Err(JoinError::UnsupportedConstraint("Concept".into())));
}

#[test]
fn test_type_directive_must_name_a_registered_type() {
    // The reader refuses unregistered type payloads, so intern directly.
    let mut store = Store::new();
    let x = store.add_node(types::VARIABLE, "X");
    let ghost = store.add_node(types::TYPE, "Ghost");
    let op = store.add_link(types::JOIN, vec![x, ghost]);
    match JoinSpec::new(&store, op) {
        Err(JoinError::UnknownType(name)) => assert_eq!(name, "Ghost"),
        other => panic!("expected unknown type, got {:?}", other),
    }
}

#[test]
fn test_error_kinds() {
    assert_eq!(
        JoinError::NotAJoin("Member".into()).kind(),
        JoinErrorKind::Construction
    );
    assert_eq!(
        JoinError::AmbiguousReplacement { source: "x".into(), count: 2 }.kind(),
        JoinErrorKind::Construction
    );
    assert_eq!(JoinError::ReplacementArity(1).kind(), JoinErrorKind::Syntax);
    assert_eq!(
        JoinError::UnboundReplacement("x".into()).kind(),
        JoinErrorKind::Syntax
    );
    assert_eq!(
        JoinError::Oracle(QueryError::NotAFilter("List".into())).kind(),
        JoinErrorKind::Oracle
    );
}

// ============================================================================
// EXECUTION
// ============================================================================

#[test]
fn test_execute_delivers_existing_ids() {
    let (mut store, ids) = loaded(
        r#"
        (Member (Concept "sea") (Concept "beach"))
        (Member (Concept "sand") (Concept "beach"))
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach"))))
        "#,
    );
    let spec = JoinSpec::new(&store, *ids.last().expect("op")).expect("spec");
    let before = store.len();

    let queue = spec.execute(&mut store).expect("execute");
    let results: Vec<AtomId> = queue.collect();
    assert_eq!(results.len(), 2);
    assert_eq!(store.len(), before, "verbatim containers are already interned");

    let found: Vec<Term> = results.iter().map(|&id| store.export_term(id)).collect();
    assert_terms(&found, &[member("sea", "beach"), member("sand", "beach")]);
}

#[test]
fn test_execute_interns_rewritten_containers() {
    let (mut store, ids) = loaded(
        r#"
        (Member (Concept "sand") (Concept "beach"))
        (Join (Variable "X")
          (Present (Member (Variable "X") (Concept "beach")))
          (Replacement (Variable "X") (Concept "shore")))
        "#,
    );
    let spec = JoinSpec::new(&store, *ids.last().expect("op")).expect("spec");
    let before = store.len();

    let queue = spec.execute(&mut store).expect("execute");
    let first = queue.recv().expect("one result");
    assert_eq!(queue.recv(), None, "the queue closes after the last result");

    assert_eq!(store.len(), before + 1, "the rewritten container is new");
    assert_eq!(store.export_term(first), member("shore", "beach"));
}

#[test]
fn test_spec_accessors() {
    let (store, ids) = loaded(
        r#"
        (Member (Concept "sand") (Concept "beach"))
        (MaximalJoin (Variable "X")
          (Present (Member (Variable "X") (Concept "beach"))))
        "#,
    );
    let op = *ids.last().expect("op");
    let spec = JoinSpec::new(&store, op).expect("spec");
    assert_eq!(spec.operator(), op);
    assert!(spec.is_maximal());
    assert_eq!(spec.variables().len(), 1);

    let (store, ids) = loaded(r#"(Join (Variable "X") (Present (Variable "X")))"#);
    let spec = JoinSpec::new(&store, *ids.last().expect("op")).expect("spec");
    assert!(!spec.is_maximal());
}
