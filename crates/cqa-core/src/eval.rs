//! Direct evaluation of a query on one database instance
//!
//! Positive atoms are joined left to right by backtracking; each complete
//! binding is then checked against the negated atoms. Variables that occur
//! only in a negated atom are local to it: `¬R(x, y)` with `y` unbound fails
//! as soon as some `R(x, _)` fact exists.
//!
//! # Example
//!
//! ```
//! use cqa_ast::{sym, Atom, Fact, Query};
//! use cqa_core::{evaluate_query, Database};
//!
//! let db = Database::from_facts(vec![
//!     Fact::from_strs("Parent", 2, &["John", "Mary"]),
//!     Fact::from_strs("Parent", 2, &["Mary", "Alice"]),
//!     Fact::from_strs("Student", 1, &["Alice"]),
//! ])
//! .unwrap();
//! let query = Query::new(vec![
//!     Atom::positive("Parent", 2, &["x", "y"]),
//!     Atom::negative("Student", 1, &["y"]),
//! ]);
//! let answers = evaluate_query(&query, &db);
//! assert_eq!(answers.len(), 1);
//! assert_eq!(answers[0].get(&sym("y")), Some(&sym("Mary")));
//! ```

use cqa_ast::{Atom, Query};
use tracing::trace;

use crate::{match_atom, Bindings, Database};

/// All bindings of the positive variables that satisfy the query
pub fn evaluate_query(query: &Query, db: &Database) -> Vec<Bindings> {
    let positives: Vec<&Atom> = query.positive().collect();
    let negatives: Vec<&Atom> = query.negative().collect();
    let mut answers = Vec::new();
    search(&positives, &negatives, db, Bindings::new(), &mut answers, false);
    answers
}

/// Whether the query holds in `db`
pub fn satisfies(query: &Query, db: &Database) -> bool {
    let positives: Vec<&Atom> = query.positive().collect();
    let negatives: Vec<&Atom> = query.negative().collect();
    let mut answers = Vec::new();
    let holds = search(&positives, &negatives, db, Bindings::new(), &mut answers, true);
    trace!(%query, holds, "direct evaluation");
    holds
}

fn search(
    positives: &[&Atom],
    negatives: &[&Atom],
    db: &Database,
    bindings: Bindings,
    answers: &mut Vec<Bindings>,
    first_only: bool,
) -> bool {
    let Some((atom, rest)) = positives.split_first() else {
        if negatives.iter().all(|atom| negation_holds(atom, db, &bindings)) {
            answers.push(bindings);
            return true;
        }
        return false;
    };

    let mut found = false;
    for fact in db.facts(&atom.predicate) {
        let mut extended = bindings.clone();
        if match_atom(atom, fact, &mut extended)
            && search(rest, negatives, db, extended, answers, first_only)
        {
            found = true;
            if first_only {
                return true;
            }
        }
    }
    found
}

/// No fact matches the negated atom under `bindings`
pub fn negation_holds(atom: &Atom, db: &Database, bindings: &Bindings) -> bool {
    let pattern = bindings.apply_atom(atom);
    !db.facts(&pattern.predicate)
        .iter()
        .any(|fact| match_atom(&pattern, fact, &mut Bindings::new()))
}
