//! Guardedness classification
//!
//! Negation is tractable when every negated atom is *guarded* by the positive
//! part of the query.
//!
//! # Classes
//!
//! 1. Two positive atoms share a predicate: [`Guardedness::NotSelfJoinFree`]
//! 2. Every negated atom's variables all occur in one positive atom:
//!    [`Guardedness::Ngfo`]
//! 3. Every pair of variables of a negated atom occurs together in some
//!    positive atom: [`Guardedness::WeaklyGuarded`]
//! 4. Anything else: [`Guardedness::Unguarded`]
//!
//! # Example
//!
//! ```
//! use cqa_analysis::{classify, Guardedness};
//! use cqa_ast::{Atom, Query};
//!
//! // no positive atom holds {x, y, z}, but every pair co-occurs somewhere
//! let query = Query::new(vec![
//!     Atom::positive("P", 1, &["x", "y"]),
//!     Atom::positive("Q", 1, &["x", "z"]),
//!     Atom::positive("R", 1, &["z", "y"]),
//!     Atom::negative("S", 3, &["x", "y", "z"]),
//! ]);
//! assert_eq!(classify(&query), Guardedness::WeaklyGuarded);
//! ```

use cqa_ast::{Atom, Query, Symbol};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Guardedness {
    NotSelfJoinFree,
    Ngfo,
    WeaklyGuarded,
    Unguarded,
}

impl Guardedness {
    /// NGFO and weakly-guarded queries can go through certainty and rewriting
    pub fn is_guarded(&self) -> bool {
        matches!(self, Guardedness::Ngfo | Guardedness::WeaklyGuarded)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Guardedness::NotSelfJoinFree => "not self-join-free",
            Guardedness::Ngfo => "NGFO",
            Guardedness::WeaklyGuarded => "weakly guarded",
            Guardedness::Unguarded => "unguarded",
        }
    }
}

impl fmt::Display for Guardedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A pair of variables of a negated atom that no positive atom holds together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnguardedPair {
    pub atom: Atom,
    pub pair: (Symbol, Symbol),
}

impl fmt::Display for UnguardedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} and {} of {} share no positive atom",
            self.pair.0.as_str(),
            self.pair.1.as_str(),
            self.atom
        )
    }
}

pub fn classify(query: &Query) -> Guardedness {
    if !repeated_positive_predicates(query).is_empty() {
        return Guardedness::NotSelfJoinFree;
    }
    if is_ngfo(query) {
        return Guardedness::Ngfo;
    }
    if unguarded_pairs(query).is_empty() {
        return Guardedness::WeaklyGuarded;
    }
    Guardedness::Unguarded
}

/// Predicates carried by more than one positive atom
pub fn repeated_positive_predicates(query: &Query) -> Vec<Symbol> {
    repeated(query.positive())
}

/// Predicates carried by more than one atom of either polarity
pub fn repeated_predicates(query: &Query) -> Vec<Symbol> {
    repeated(query.iter())
}

fn repeated<'a>(atoms: impl Iterator<Item = &'a Atom>) -> Vec<Symbol> {
    let mut seen = Vec::new();
    let mut repeated = Vec::new();
    for atom in atoms {
        if seen.contains(&atom.predicate) {
            if !repeated.contains(&atom.predicate) {
                repeated.push(atom.predicate);
            }
        } else {
            seen.push(atom.predicate);
        }
    }
    repeated
}

fn is_ngfo(query: &Query) -> bool {
    query.negative().all(|negated| {
        let vars = negated.variables();
        vars.is_empty()
            || query
                .positive()
                .any(|guard| vars.iter().all(|var| guard.mentions(var)))
    })
}

/// Variable pairs that break weak guardedness, in query order
pub fn unguarded_pairs(query: &Query) -> Vec<UnguardedPair> {
    let mut pairs = Vec::new();
    for negated in query.negative() {
        let vars = negated.variables();
        for (i, first) in vars.iter().enumerate() {
            for second in &vars[i + 1..] {
                let guarded = query
                    .positive()
                    .any(|guard| guard.mentions(first) && guard.mentions(second));
                if !guarded {
                    pairs.push(UnguardedPair {
                        atom: negated.clone(),
                        pair: (*first, *second),
                    });
                }
            }
        }
    }
    pairs
}
