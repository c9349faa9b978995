//! Matching query atoms against ground facts
//!
//! Facts are ground, so unification here is one-sided: a query term either is
//! a constant that must equal the fact value, or a variable that is bound to it
//! (or must agree with an earlier binding).
//!
//! # Example
//!
//! ```
//! use cqa_ast::{sym, Atom, Fact};
//! use cqa_core::{match_atom, Bindings};
//!
//! let atom = Atom::positive("R", 1, &["x", "y"]);
//! let mut bindings = Bindings::new();
//! assert!(match_atom(&atom, &Fact::from_strs("R", 1, &["A", "B"]), &mut bindings));
//! assert_eq!(bindings.get(&sym("x")), Some(&sym("A")));
//! assert_eq!(bindings.get(&sym("y")), Some(&sym("B")));
//! ```

use cqa_ast::{Atom, Fact, Query, Symbol, Term};
use std::collections::HashMap;
use std::fmt;

/// A substitution maps variables to constants
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bindings {
    bindings: HashMap<Symbol, Symbol>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable to a value
    pub fn bind(&mut self, var: Symbol, value: Symbol) {
        self.bindings.insert(var, value);
    }

    pub fn get(&self, var: &Symbol) -> Option<&Symbol> {
        self.bindings.get(var)
    }

    pub fn contains(&self, var: &Symbol) -> bool {
        self.bindings.contains_key(var)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Symbol)> {
        self.bindings.iter()
    }

    /// Apply the substitution to a term
    pub fn apply(&self, term: &Term) -> Term {
        match term {
            Term::Variable(var) => match self.get(var) {
                Some(value) => Term::Constant(*value),
                None => *term,
            },
            Term::Constant(_) => *term,
        }
    }

    pub fn apply_atom(&self, atom: &Atom) -> Atom {
        atom.map_terms(|term| self.apply(term))
    }

    pub fn apply_query(&self, query: &Query) -> Query {
        query.map_terms(|term| self.apply(term))
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs: Vec<String> = self
            .bindings
            .iter()
            .map(|(var, value)| format!("{} ↦ {}", var.as_str(), value.as_str()))
            .collect();
        pairs.sort();
        write!(f, "{{{}}}", pairs.join(", "))
    }
}

/// Unify a query term with a ground value
pub fn unify(pattern: &Term, value: &Symbol, bindings: &mut Bindings) -> bool {
    match pattern {
        Term::Constant(constant) => constant == value,
        Term::Variable(var) => match bindings.get(var) {
            Some(bound) => bound == value,
            None => {
                bindings.bind(*var, *value);
                true
            }
        },
    }
}

fn unify_all(patterns: &[Term], values: &[Symbol], bindings: &mut Bindings) -> bool {
    patterns.len() == values.len()
        && patterns
            .iter()
            .zip(values)
            .all(|(pattern, value)| unify(pattern, value, bindings))
}

/// Match every argument of `atom` against `fact`
///
/// On failure `bindings` may hold partial bindings; callers that backtrack
/// work on a clone.
pub fn match_atom(atom: &Atom, fact: &Fact, bindings: &mut Bindings) -> bool {
    atom.predicate == fact.predicate && unify_all(&atom.args, &fact.args, bindings)
}

/// Match only the key positions of `atom` against `fact`
pub fn match_key(atom: &Atom, fact: &Fact, bindings: &mut Bindings) -> bool {
    atom.predicate == fact.predicate
        && atom.arity() == fact.arity()
        && unify_all(atom.key_args(), &fact.args[..atom.key_length], bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqa_ast::sym;

    #[test]
    fn test_unify_constants() {
        let mut bindings = Bindings::new();
        assert!(unify(&Term::constant("A"), &sym("A"), &mut bindings));
        assert!(!unify(&Term::constant("A"), &sym("B"), &mut bindings));
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_unify_variable_with_constant() {
        let mut bindings = Bindings::new();
        assert!(unify(&Term::var("x"), &sym("A"), &mut bindings));
        assert_eq!(bindings.apply(&Term::var("x")), Term::constant("A"));
        assert!(!unify(&Term::var("x"), &sym("B"), &mut bindings));
    }

    #[test]
    fn test_lowercase_value_stays_constant() {
        let mut bindings = Bindings::new();
        bindings.bind(sym("x"), sym("a"));
        assert_eq!(bindings.apply(&Term::var("x")), Term::constant("a"));
    }

    #[test]
    fn test_match_atom_repeated_variable() {
        let atom = Atom::positive("R", 1, &["x", "x"]);
        let mut bindings = Bindings::new();
        assert!(match_atom(
            &atom,
            &Fact::from_strs("R", 1, &["A", "A"]),
            &mut bindings
        ));
        let mut bindings = Bindings::new();
        assert!(!match_atom(
            &atom,
            &Fact::from_strs("R", 1, &["A", "B"]),
            &mut bindings
        ));
    }

    #[test]
    fn test_match_atom_wrong_predicate_or_arity() {
        let atom = Atom::positive("R", 1, &["x", "y"]);
        let mut bindings = Bindings::new();
        assert!(!match_atom(
            &atom,
            &Fact::from_strs("S", 1, &["A", "B"]),
            &mut bindings
        ));
        assert!(!match_atom(
            &atom,
            &Fact::from_strs("R", 1, &["A"]),
            &mut bindings
        ));
    }

    #[test]
    fn test_match_key_ignores_non_key() {
        let atom = Atom::positive("R", 1, &["x", "C"]);
        let fact = Fact::from_strs("R", 1, &["A", "B"]);
        let mut bindings = Bindings::new();
        assert!(match_key(&atom, &fact, &mut bindings));
        assert_eq!(bindings.get(&sym("x")), Some(&sym("A")));
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_apply_query() {
        let query = Query::new(vec![
            Atom::positive("R", 1, &["x", "y"]),
            Atom::negative("S", 1, &["y"]),
        ]);
        let mut bindings = Bindings::new();
        bindings.bind(sym("y"), sym("B"));
        let applied = bindings.apply_query(&query);
        assert_eq!(applied.atoms[0], Atom::positive("R", 1, &["x", "B"]));
        assert_eq!(applied.atoms[1], Atom::negative("S", 1, &["B"]));
    }

    #[test]
    fn test_display_is_sorted() {
        let mut bindings = Bindings::new();
        bindings.bind(sym("y"), sym("B"));
        bindings.bind(sym("x"), sym("A"));
        assert_eq!(bindings.to_string(), "{x ↦ A, y ↦ B}");
    }
}
