//! Property-based tests for classification and the certainty check
//!
//! Repair enumeration is the reference answer. A `true` from the recursion
//! must hold in every repair on any query. Equivalence is checked on guarded
//! queries with an acyclic attack graph, leaving out those where a key
//! valuation fixes an atom attacked along a witness path.

use cqa_analysis::{classify, AttackGraph};
use cqa_ast::{Atom, Query};
use cqa_certainty::{is_certain, is_certain_by_repairs, Certifier};
use cqa_core::satisfies;
use proptest::prelude::*;

use crate::strategies::{
    all_key_query, any_query, empty_key_query, problem, query_with_repeats, single_keyed_query,
};
use crate::witness::key_choices_unattacked;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn test_classification_is_stable(query in query_with_repeats()) {
        let first = classify(&query);
        prop_assert_eq!(first, classify(&query));

        // atom order plays no part
        let mut atoms = query.atoms.clone();
        atoms.reverse();
        prop_assert_eq!(first, classify(&Query::new(atoms)));
    }

    #[test]
    fn test_all_key_queries_evaluate_directly((query, db) in problem(all_key_query())) {
        prop_assert!(query.iter().all(Atom::is_all_key));
        let certain = is_certain(&query, &db).unwrap();
        prop_assert_eq!(certain, satisfies(&query, &db));
        prop_assert_eq!(certain, is_certain_by_repairs(&query, &db));
    }

    #[test]
    fn test_empty_keys_match_repairs((query, db) in problem(empty_key_query())) {
        let certain = is_certain(&query, &db).unwrap();
        prop_assert_eq!(
            certain,
            is_certain_by_repairs(&query, &db),
            "query {} on {} facts", query, db.len()
        );
    }

    #[test]
    fn test_single_keyed_atom_matches_repairs((query, db) in problem(single_keyed_query())) {
        let certain = is_certain(&query, &db).unwrap();
        prop_assert_eq!(
            certain,
            is_certain_by_repairs(&query, &db),
            "query {} on {} facts", query, db.len()
        );
    }

    #[test]
    fn test_certain_answers_hold_in_every_repair((query, db) in problem(any_query())) {
        if is_certain(&query, &db).unwrap() {
            prop_assert!(
                is_certain_by_repairs(&query, &db),
                "query {} on {} facts", query, db.len()
            );
        }
    }

    #[test]
    fn test_certifier_is_reproducible((query, db) in problem(any_query())) {
        let mut certifier = Certifier::new().with_trace();
        let first = certifier.is_certain(&query, &db).unwrap();
        let trace = certifier.trace().to_vec();
        let steps = certifier.steps();

        prop_assert_eq!(first, certifier.is_certain(&query, &db).unwrap());
        prop_assert_eq!(trace, certifier.trace().to_vec());
        prop_assert_eq!(steps, certifier.steps());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_guarded_acyclic_queries_match_repairs((query, db) in problem(any_query())) {
        let covered = classify(&query).is_guarded()
            && AttackGraph::build(&query).is_acyclic()
            && key_choices_unattacked(&query);
        if covered {
            prop_assert_eq!(
                is_certain(&query, &db).unwrap(),
                is_certain_by_repairs(&query, &db),
                "query {} on {} facts", query, db.len()
            );
        }
    }
}
