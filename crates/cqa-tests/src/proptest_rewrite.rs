//! Property-based tests for the first-order rewriting

use cqa_analysis::{classify, AttackGraph, Guardedness};
use cqa_certainty::is_certain;
use cqa_rewrite::{evaluate, rewrite, RewriteError};
use proptest::prelude::*;

use crate::strategies::{any_query, empty_key_query, problem, single_keyed_query};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn test_rewriting_defined_exactly_when_acyclic(query in any_query()) {
        let result = rewrite(&query);
        match classify(&query) {
            Guardedness::Unguarded => {
                prop_assert_eq!(result, Err(RewriteError::Unguarded));
            }
            _ if AttackGraph::build(&query).is_acyclic() => {
                prop_assert!(result.is_ok(), "{} refused: {:?}", query, result);
            }
            _ => {
                prop_assert!(
                    matches!(result, Err(RewriteError::Cyclic(_))),
                    "{} gave {:?}", query, result
                );
            }
        }
    }

    #[test]
    fn test_rewriting_is_closed_and_reproducible(query in any_query()) {
        if let Ok(formula) = rewrite(&query) {
            prop_assert!(formula.is_closed(), "free variables in {}", formula);
            prop_assert_eq!(Ok(formula), rewrite(&query));
        }
    }

    #[test]
    fn test_rewriting_agrees_with_certainty((query, db) in problem(any_query())) {
        if let Ok(formula) = rewrite(&query) {
            prop_assert_eq!(
                evaluate(&formula, &db),
                is_certain(&query, &db).unwrap(),
                "{} rewritten to {}", query, formula
            );
        }
    }

    #[test]
    fn test_rewriting_agrees_on_empty_keys((query, db) in problem(empty_key_query())) {
        if let Ok(formula) = rewrite(&query) {
            prop_assert_eq!(
                evaluate(&formula, &db),
                is_certain(&query, &db).unwrap(),
                "{} rewritten to {}", query, formula
            );
        }
    }

    #[test]
    fn test_rewriting_agrees_on_single_keyed_atom((query, db) in problem(single_keyed_query())) {
        if let Ok(formula) = rewrite(&query) {
            prop_assert_eq!(
                evaluate(&formula, &db),
                is_certain(&query, &db).unwrap(),
                "{} rewritten to {}", query, formula
            );
        }
    }
}
