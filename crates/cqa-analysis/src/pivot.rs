//! Pivot selection
//!
//! Certainty checking and rewriting both peel off one atom at a time. The
//! atom must not be all-key, and a negated atom only qualifies when each of
//! its key variables occurs in some positive atom.
//!
//! Among those, the first atom with no attacker wins. Failing that, the first
//! atom attacked only by all-key atoms is taken; all-key atoms have exactly
//! one repair and do not constrain the choice.

use cqa_ast::{Atom, Query};
use tracing::trace;

use crate::AttackGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pivot {
    /// Query position of the chosen atom
    Atom(usize),
    /// Every atom is all-key
    AllKey,
    /// Every eligible atom is attacked
    Attacked,
    /// No atom is eligible: the remaining negations have unguarded keys
    Unguarded,
}

pub fn select_pivot(query: &Query, graph: &AttackGraph) -> Pivot {
    let eligible: Vec<usize> = query
        .iter()
        .enumerate()
        .filter(|(_, atom)| is_eligible(query, atom))
        .map(|(position, _)| position)
        .collect();

    if eligible.is_empty() {
        return if query.iter().all(Atom::is_all_key) {
            Pivot::AllKey
        } else {
            Pivot::Unguarded
        };
    }

    let unattacked = eligible
        .iter()
        .find(|&&position| graph.in_degree(graph.node_of(position)) == 0);
    if let Some(&position) = unattacked {
        trace!(atom = %query.atoms[position], "pivot without attackers");
        return Pivot::Atom(position);
    }

    let attacked_by_all_key_only = eligible.iter().find(|&&position| {
        graph
            .attackers(graph.node_of(position))
            .into_iter()
            .all(|attacker| graph.node(attacker).is_all_key())
    });
    match attacked_by_all_key_only {
        Some(&position) => {
            trace!(atom = %query.atoms[position], "pivot attacked by all-key atoms only");
            Pivot::Atom(position)
        }
        None => Pivot::Attacked,
    }
}

fn is_eligible(query: &Query, atom: &Atom) -> bool {
    if atom.is_all_key() {
        return false;
    }
    if !atom.negated {
        return true;
    }
    atom.key_variables()
        .iter()
        .all(|var| query.positive().any(|guard| guard.mentions(var)))
}
