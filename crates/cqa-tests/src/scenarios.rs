//! End-to-end scenarios through the driver

use cqa::cqa_parser::{parse_problem, SrcId};
use cqa::{evaluate_source, Options, Report};
use cqa_analysis::{AttackGraph, Guardedness};
use cqa_certainty::{is_certain, is_certain_by_repairs};
use cqa_core::Database;
use cqa_rewrite::{evaluate, rewrite};

use crate::witness::key_choices_unattacked;

fn run(source: &str) -> Report {
    match evaluate_source(source, &Options::default()) {
        Ok(report) => report,
        Err(error) => panic!("{}", error.render(source)),
    }
}

/// The recursion, the repair enumeration and the rewriting (when defined)
/// must give the same answer
fn assert_agreement(source: &str) {
    let problem = parse_problem(source, SrcId::empty()).unwrap();
    let db = Database::from_facts(problem.database.iter().cloned()).unwrap();
    let certain = is_certain(&problem.query, &db).unwrap();
    assert_eq!(
        certain,
        is_certain_by_repairs(&problem.query, &db),
        "repairs disagree on {}",
        problem.query
    );
    if let Ok(formula) = rewrite(&problem.query) {
        assert_eq!(
            certain,
            evaluate(&formula, &db),
            "rewriting {} disagrees on {}",
            formula,
            problem.query
        );
    }
}

/// A guarded, acyclic query that every repair satisfies, but through
/// different values of the key the recursion fixes first: the recursion and
/// the rewriting both answer `false`
fn assert_missed_attack(source: &str) {
    let problem = parse_problem(source, SrcId::empty()).unwrap();
    let db = Database::from_facts(problem.database.iter().cloned()).unwrap();
    let query = &problem.query;
    assert!(cqa_analysis::classify(query).is_guarded());
    assert!(AttackGraph::build(query).is_acyclic());
    assert!(!key_choices_unattacked(query), "{} has no hidden attack", query);

    assert!(is_certain_by_repairs(query, &db), "{} fails in some repair", query);
    assert!(!is_certain(query, &db).unwrap());
    assert!(!evaluate(&rewrite(query).unwrap(), &db));
}

const ABSENT_PREDICATE: &str = "
@database
Likes(John, Paris)
Dislikes(John, London)
Hates(John, Berlin)
@query
Likes(p, t), not Dislikes(p, t), not Mayor(t, p)
";

const FRIENDS: &str = "
@database
Friend(John, Mary;)
Friend(Mary, Bob;)
Enemy(Bob, John;)
@query
Friend(x, y;)
Friend(y, z;)
Enemy(z, x;)
";

const ALICE_IS_A_STUDENT: &str = "
@database
Parent(John, Mary)
Parent(Mary, Alice)
Teacher(Mary)
Student(Alice)
@query
Parent(x, y), Teacher(x), not Student(y)
";

const BOB_IS_A_STUDENT: &str = "
@database
Parent(John, Mary)
Parent(Mary, Alice)
Teacher(Mary)
Student(Bob)
@query
Parent(x, y), Teacher(x), not Student(y)
";

const TRIANGLE: &str = "
@database
P(a, b)
Q(a, c)
R(c, b)
@query
P(x, y), Q(x, z), R(z, y), not S(x, y, z)
";

const EMPTY_KEY_CYCLE: &str = "
@database
P(A; B)
Q(B; A)
N(; C)
N(; D)
@query
P(x; y), Q(y; x), not N(; x)
";

const CYCLIC_TRIANGLE: &str = "
@database
P(a; b)
Q(b; c)
R(c; a)
D(a, b, c;)
@query
P(x; y)
Q(y; z)
R(z; x)
not D(x, y, z)
";

const CONFLICTING_RESIDENCE: &str = "
# John's residence is disputed
@database
Likes(John, Paris;)
Lives(John; London)
Lives(John; Paris)
Mayor(Paris; Hidalgo)
Mayor(London; Khan)
@query
Likes(p, t;)
not Lives(p; t)
not Mayor(t; p)
";

#[test]
fn test_absent_predicate_never_matches() {
    let report = run(ABSENT_PREDICATE);
    assert_eq!(report.guardedness, Guardedness::Ngfo);
    assert_eq!(report.acyclic, Some(true));
    assert_eq!(report.certain, Some(true));
    assert!(report.rewriting.is_some());
    assert_agreement(ABSENT_PREDICATE);
}

#[test]
fn test_self_join_stops_the_pipeline() {
    let report = run(FRIENDS);
    assert_eq!(report.guardedness, Guardedness::NotSelfJoinFree);
    assert_eq!(report.acyclic, None);
    assert_eq!(report.certain, None);
    assert_eq!(report.rewriting, None);
}

#[test]
fn test_negation_witness_makes_query_uncertain() {
    let report = run(ALICE_IS_A_STUDENT);
    assert_eq!(report.guardedness, Guardedness::Ngfo);
    assert_eq!(report.acyclic, Some(true));
    assert_eq!(report.certain, Some(false));
    assert_agreement(ALICE_IS_A_STUDENT);
}

#[test]
fn test_missing_witness_makes_query_certain() {
    let report = run(BOB_IS_A_STUDENT);
    assert_eq!(report.guardedness, Guardedness::Ngfo);
    assert_eq!(report.acyclic, Some(true));
    assert_eq!(report.certain, Some(true));
    assert_agreement(BOB_IS_A_STUDENT);
}

#[test]
fn test_weakly_guarded_triangle() {
    let report = run(TRIANGLE);
    assert_eq!(report.guardedness, Guardedness::WeaklyGuarded);
    assert_eq!(report.acyclic, Some(true));
    assert_eq!(report.certain, Some(true));
    assert_agreement(TRIANGLE);
}

#[test]
fn test_cyclic_query_with_empty_key_negation() {
    let report = run(EMPTY_KEY_CYCLE);
    assert_eq!(report.guardedness, Guardedness::Ngfo);
    assert_eq!(report.acyclic, Some(false));
    assert_eq!(report.certain, Some(true));
    assert_eq!(report.rewriting, None);
    let refusal = report.rewrite_refusal.unwrap();
    assert!(refusal.contains("cycle"), "{}", refusal);
    assert!(report.cycle.is_some());
    assert_agreement(EMPTY_KEY_CYCLE);
}

#[test]
fn test_consistent_database_is_evaluated_directly() {
    let report = run(CYCLIC_TRIANGLE);
    assert_eq!(report.guardedness, Guardedness::WeaklyGuarded);
    assert_eq!(report.acyclic, Some(false));
    assert_eq!(report.certain, Some(false));
    assert_agreement(CYCLIC_TRIANGLE);
}

#[test]
fn test_disputed_fact_breaks_certainty() {
    let report = run(CONFLICTING_RESIDENCE);
    assert_eq!(report.guardedness, Guardedness::Ngfo);
    assert_eq!(report.acyclic, Some(true));
    assert_eq!(report.certain, Some(false));
    assert_agreement(CONFLICTING_RESIDENCE);

    // without the disputed fact the only repair satisfies the query
    let settled = CONFLICTING_RESIDENCE.replace("Lives(John; Paris)\n", "");
    assert_eq!(run(&settled).certain, Some(true));
    assert_agreement(&settled);
}

#[test]
fn test_trace_and_json_report() {
    let options = Options {
        trace: true,
        ..Options::default()
    };
    let report = evaluate_source(EMPTY_KEY_CYCLE, &options).unwrap();
    assert!(report.trace.iter().any(|line| line.contains("pivot")));

    let json = report.to_json().unwrap();
    assert!(json.contains("\"certain\": true"));
    assert!(json.contains("\"acyclic\": false"));
}

// Each repair keeps one S fact, and each S fact leaves one y free
const KEYLESS_NEGATION: &str = "
@database
R(A; A)
R(B; A)
S(; A, A)
S(; B, B)
@query
R(y; z), not S(; y, y)
";

// Which R key works depends on the S fact that survives
const KEYLESS_POSITIVE: &str = "
@database
R(A; C)
R(B; D)
S(; E, C)
S(; E, D)
@query
R(y; z), S(; x, z)
";

// R(B; Z) covers the repairs where some S block keeps Z, R(A; _) the rest
const SHARED_NON_KEY: &str = "
@database
R(A; X)
R(A; Y)
R(B; Z)
S(C; X)
S(C; Z)
S(D; Y)
S(D; Z)
@query
R(x; y), S(z; y)
";

// Keeping S(X; A) frees x = B, keeping S(X; B) frees x = A
const NEGATED_BACK_REFERENCE: &str = "
@database
R(A; X)
R(A; Y)
R(B; X)
S(X; A)
S(X; B)
@query
R(x; y), not S(y; x)
";

const COMPOSITE_KEY_BACK_REFERENCE: &str = "
@database
R(A, B; X)
R(A, B; Y)
R(C, B; X)
S(X; A)
S(X; C)
S(Y; A)
@query
R(x, y; z), S(z; x)
";

#[test]
fn test_keyless_negation_escapes_the_closure_rule() {
    assert_missed_attack(KEYLESS_NEGATION);
}

#[test]
fn test_keyless_positive_atom_escapes_the_closure_rule() {
    assert_missed_attack(KEYLESS_POSITIVE);
}

#[test]
fn test_shared_non_key_variable_escapes_the_closure_rule() {
    assert_missed_attack(SHARED_NON_KEY);
}

#[test]
fn test_negated_atom_escapes_the_closure_rule() {
    assert_missed_attack(NEGATED_BACK_REFERENCE);
}

#[test]
fn test_composite_key_escapes_the_closure_rule() {
    assert_missed_attack(COMPOSITE_KEY_BACK_REFERENCE);
}

#[test]
fn test_missed_attack_is_reported_as_uncertain() {
    let report = run(SHARED_NON_KEY);
    assert_eq!(report.guardedness, Guardedness::Ngfo);
    assert_eq!(report.acyclic, Some(true));
    assert_eq!(report.certain, Some(false));
}
