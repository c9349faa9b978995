//! Attacks along witness paths
//!
//! `F` attacks `G` along a witness path when a chain of atoms leads from `F`
//! to `G` and every two neighbours in it share a variable outside `F⁺`, the
//! closure of `F`'s key under the dependencies of the other positive atoms.
//!
//! The attack graph's closure rule does not see every such attack. When the
//! certainty check fixes the key of an atom that is attacked along a witness
//! path, a single key value may not serve every repair, and the recursion can
//! answer `false` on a certain query. Answers of `true` are not affected.

use cqa_analysis::{closure, functional_dependencies, select_pivot, AttackGraph, Pivot};
use cqa_ast::{sym, Atom, Query, Symbol, Term};

/// Whether another atom attacks `query.atoms[target]` along a witness path
pub fn attacked_along_witness_path(query: &Query, target: usize) -> bool {
    (0..query.len()).any(|attacker| attacker != target && attacks(query, attacker, target))
}

fn attacks(query: &Query, from: usize, to: usize) -> bool {
    let attacker = &query.atoms[from];
    let dependencies: Vec<_> = functional_dependencies(query)
        .into_iter()
        .filter(|dependency| dependency.source != attacker.predicate)
        .collect();
    let reached = closure(&attacker.key_variables(), &dependencies);

    let mut visited = vec![false; query.len()];
    visited[from] = true;
    let mut stack = vec![from];
    while let Some(current) = stack.pop() {
        if current == to {
            return true;
        }
        let links: Vec<Symbol> = query.atoms[current]
            .variables()
            .into_iter()
            .filter(|var| !reached.contains(var))
            .collect();
        for (next, atom) in query.atoms.iter().enumerate() {
            if !visited[next] && links.iter().any(|var| atom.mentions(var)) {
                visited[next] = true;
                stack.push(next);
            }
        }
    }
    false
}

/// Whether every key valuation the certainty check makes on `query` fixes a
/// positive atom that no witness path attacks
///
/// Follows the pivots of the recursion on the query alone: pivot selection
/// looks at variables and key positions, never at which constant a variable
/// was replaced with.
pub fn key_choices_unattacked(query: &Query) -> bool {
    if query.iter().all(Atom::is_all_key) {
        return true;
    }
    let graph = AttackGraph::build(query);
    let position = match select_pivot(query, &graph) {
        Pivot::Atom(position) => position,
        Pivot::AllKey => return true,
        Pivot::Attacked | Pivot::Unguarded => return false,
    };

    let pivot = &query.atoms[position];
    let key = pivot.key_variables();
    if !key.is_empty() {
        return !pivot.negated
            && !attacked_along_witness_path(query, position)
            && key_choices_unattacked(&pin(query, &key));
    }

    let vars = pivot.variables();
    if !pivot.negated {
        return key_choices_unattacked(&pin(&query.without(position), &vars));
    }
    // the excluded tuple becomes a negated all-key atom over the same variables
    let mut rest = query.without(position);
    if !vars.is_empty() {
        let name = format!("Excluded{}", query.len());
        let args = vars.iter().map(|var| Term::Variable(*var)).collect();
        rest.push(Atom::new(true, sym(&name), vars.len(), args));
    }
    key_choices_unattacked(&rest)
}

fn pin(query: &Query, vars: &[Symbol]) -> Query {
    query.map_terms(|term| match term {
        Term::Variable(var) if vars.contains(var) => Term::constant("Pinned"),
        other => other.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_non_key_variable_attacks() {
        // R(x; y), S(z; y)
        let query = Query::new(vec![
            Atom::positive("R", 1, &["x", "y"]),
            Atom::positive("S", 1, &["z", "y"]),
        ]);
        assert!(attacked_along_witness_path(&query, 0));
        assert!(attacked_along_witness_path(&query, 1));
        assert!(AttackGraph::build(&query).is_acyclic());
        assert!(!key_choices_unattacked(&query));
    }

    #[test]
    fn test_path_query_has_no_hidden_attack() {
        // R(x; y), S(y; z)
        let query = Query::new(vec![
            Atom::positive("R", 1, &["x", "y"]),
            Atom::positive("S", 1, &["y", "z"]),
        ]);
        assert!(!attacked_along_witness_path(&query, 0));
        assert!(attacked_along_witness_path(&query, 1));
        assert!(key_choices_unattacked(&query));
    }

    #[test]
    fn test_empty_keys_never_take_a_key_valuation() {
        let query = Query::new(vec![
            Atom::positive("R", 0, &["x", "y"]),
            Atom::negative("S", 0, &["y"]),
            Atom::positive("T", 2, &["x", "y"]),
        ]);
        assert!(key_choices_unattacked(&query));
    }
}
