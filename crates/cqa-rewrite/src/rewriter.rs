//! Consistent first-order rewriting
//!
//! The rewriting follows the same case split as the certainty check. Where
//! the check substitutes database values, the rewriter quantifies a variable
//! and pins it: the query keeps a placeholder constant, and every atom built
//! from the query turns the placeholder back into the quantified variable.
//!
//! # Example
//!
//! ```
//! use cqa_ast::{Atom, Fact, Query};
//! use cqa_core::Database;
//! use cqa_rewrite::{evaluate, rewrite};
//!
//! // R(x; y), S(y)
//! let query = Query::new(vec![
//!     Atom::positive("R", 1, &["x", "y"]),
//!     Atom::positive("S", 1, &["y"]),
//! ]);
//! let formula = rewrite(&query).unwrap();
//! assert!(formula.is_closed());
//!
//! // the block of key A holds a fact whose value is not in S
//! let db = Database::from_facts(vec![
//!     Fact::from_strs("R", 1, &["A", "B"]),
//!     Fact::from_strs("R", 1, &["A", "C"]),
//!     Fact::from_strs("S", 1, &["B"]),
//! ])
//! .unwrap();
//! assert!(!evaluate(&formula, &db));
//! ```

use cqa_analysis::{
    classify, repeated_predicates, select_pivot, AttackGraph, Guardedness, Pivot,
};
use cqa_ast::{sym, Atom, Query, Symbol, Term};
use cqa_core::FreshNames;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::{FoTerm, Formula};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("query is not self-join-free")]
    NotSelfJoinFree,
    #[error("query has unguarded negation")]
    Unguarded,
    #[error("predicate {0} occurs more than once")]
    RepeatedPredicate(String),
    #[error("attack graph has a cycle: {0}")]
    Cyclic(String),
}

/// Rewrite `query` into a closed formula that holds on a database exactly
/// when the query is certain on it
pub fn rewrite(query: &Query) -> Result<Formula, RewriteError> {
    Rewriter::new().rewrite(query)
}

/// Owns the fresh names of one rewriting at a time
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
    fresh: FreshNames,
    /// Placeholder constant to the variable it stands for
    pins: HashMap<Symbol, Symbol>,
    /// Fresh relation to its single tuple
    tuples: HashMap<Symbol, Vec<FoTerm>>,
    /// Symbols of the input query
    reserved: Vec<Symbol>,
    /// Constants of the input query
    constants: Vec<Symbol>,
}

impl Rewriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rewrite(&mut self, query: &Query) -> Result<Formula, RewriteError> {
        match classify(query) {
            Guardedness::NotSelfJoinFree => return Err(RewriteError::NotSelfJoinFree),
            Guardedness::Unguarded => return Err(RewriteError::Unguarded),
            Guardedness::Ngfo | Guardedness::WeaklyGuarded => {}
        }
        if let Some(predicate) = repeated_predicates(query).first() {
            return Err(RewriteError::RepeatedPredicate(predicate.as_str().to_string()));
        }
        if let Some(cycle) = AttackGraph::build(query).describe_cycle() {
            return Err(RewriteError::Cyclic(cycle));
        }

        self.fresh.reset();
        self.pins.clear();
        self.tuples.clear();
        self.reserved = query.symbols();
        self.constants = query
            .iter()
            .flat_map(|atom| atom.args.iter())
            .filter(|term| term.is_constant())
            .map(Term::symbol)
            .collect();

        let body = self.rw(query);
        let formula = Formula::exists(body.free_variables(), body);
        debug!(%query, size = formula.size(), "rewritten");
        Ok(formula)
    }

    fn rw(&mut self, query: &Query) -> Formula {
        if query.is_empty() {
            return Formula::True;
        }
        if query.iter().all(Atom::is_all_key) {
            return self.all_key(query);
        }
        let graph = AttackGraph::build(query);
        match select_pivot(query, &graph) {
            Pivot::Atom(position) => {
                let pivot = &query.atoms[position];
                match (pivot.key_variables().is_empty(), pivot.negated) {
                    (false, false) => self.positive_key(query, position),
                    (false, true) => self.negated_key(query, position),
                    (true, false) => self.positive_block(query, position),
                    (true, true) => self.negated_block(query, position),
                }
            }
            Pivot::AllKey => self.all_key(query),
            Pivot::Attacked | Pivot::Unguarded => Formula::False,
        }
    }

    fn variable(&mut self, base: &str) -> Symbol {
        let reserved = &self.reserved;
        self.fresh
            .variable(base, |name| reserved.iter().any(|symbol| symbol.as_str() == name))
    }

    /// Replace `var` by a placeholder standing for `target`
    fn pin(&mut self, query: &Query, var: Symbol, target: Symbol) -> Query {
        let constants = &self.constants;
        let taken = |symbol: &Symbol, pins: &HashMap<Symbol, Symbol>| {
            constants.contains(symbol) || pins.get(symbol).is_some_and(|pinned| *pinned != target)
        };
        let placeholder = if taken(&target, &self.pins) {
            let pins = &self.pins;
            self.fresh
                .variable(target.as_str(), |name| taken(&sym(name), pins))
        } else {
            target
        };
        self.pins.insert(placeholder, target);
        query.map_terms(|term| match term {
            Term::Variable(name) if *name == var => Term::Constant(placeholder),
            other => other.clone(),
        })
    }

    fn term(&self, term: &Term) -> FoTerm {
        match term {
            Term::Variable(var) => FoTerm::Var(*var),
            Term::Constant(value) => match self.pins.get(value) {
                Some(var) => FoTerm::Var(*var),
                None => FoTerm::Const(*value),
            },
        }
    }

    fn atom(&self, atom: &Atom) -> Formula {
        Formula::atom(
            atom.predicate,
            atom.args.iter().map(|arg| self.term(arg)).collect(),
        )
    }

    /// Every atom all-key: the query itself, with negation scoped per atom
    fn all_key(&self, query: &Query) -> Formula {
        let outer = query.positive_variables();
        let mut conjuncts: Vec<Formula> = query.positive().map(|atom| self.atom(atom)).collect();
        for negated in query.negative() {
            conjuncts.push(self.negation(negated, &outer));
        }
        Formula::exists(outer, Formula::and(conjuncts))
    }

    fn negation(&self, atom: &Atom, outer: &[Symbol]) -> Formula {
        let locals: Vec<Symbol> = atom
            .variables()
            .into_iter()
            .filter(|var| !outer.contains(var))
            .collect();
        let args: Vec<FoTerm> = atom.args.iter().map(|arg| self.term(arg)).collect();

        if let Some(tuple) = self.tuples.get(&atom.predicate) {
            let fresh = Formula::Fresh {
                relation: atom.predicate,
                args,
                tuple: tuple.clone(),
            };
            return Formula::not(Formula::exists(locals, fresh));
        }
        if locals.is_empty() {
            return Formula::not(Formula::atom(atom.predicate, args));
        }
        let repeated = locals.iter().any(|local| {
            atom.args
                .iter()
                .filter(|arg| **arg == Term::Variable(*local))
                .count()
                > 1
        });
        if repeated {
            return Formula::not(Formula::exists(locals, Formula::atom(atom.predicate, args)));
        }
        let correlations = atom
            .args
            .iter()
            .enumerate()
            .filter(|(_, arg)| !matches!(arg, Term::Variable(var) if locals.contains(var)))
            .map(|(position, arg)| (position, self.term(arg)))
            .collect();
        Formula::NotExists {
            predicate: atom.predicate,
            arity: atom.arity(),
            correlations,
        }
    }

    /// `R(k̄; _)` with fresh variables at every non-key position
    fn key_guard(&mut self, atom: &Atom) -> (Vec<Symbol>, Formula) {
        let mut args: Vec<FoTerm> = atom.key_args().iter().map(|arg| self.term(arg)).collect();
        let mut fresh = Vec::new();
        for _ in atom.non_key_args() {
            let var = self.variable("z");
            fresh.push(var);
            args.push(FoTerm::Var(var));
        }
        (fresh, Formula::atom(atom.predicate, args))
    }

    /// Pin every key variable, guarded by some fact of the pivot's relation
    fn positive_key(&mut self, query: &Query, position: usize) -> Formula {
        let pivot = query.atoms[position].clone();
        let keys = pivot.key_variables();
        let (fresh, guard) = self.key_guard(&pivot);

        let mut pinned = query.clone();
        for var in &keys {
            pinned = self.pin(&pinned, *var, *var);
        }
        let inner = self.rw(&pinned);
        Formula::exists(keys, Formula::and(vec![Formula::exists(fresh, guard), inner]))
    }

    /// Pin every key variable of a negated pivot, each guarded by the first
    /// positive atom that mentions it
    fn negated_key(&mut self, query: &Query, position: usize) -> Formula {
        let pivot = query.atoms[position].clone();
        let keys = pivot.key_variables();

        let mut guards = Vec::new();
        for var in &keys {
            let Some(guard) = query.positive().find(|atom| atom.mentions(var)).cloned() else {
                return Formula::False;
            };
            let mut renamed: Vec<(Symbol, Symbol)> = Vec::new();
            let mut args = Vec::new();
            for arg in &guard.args {
                match arg {
                    Term::Variable(other) if other != var => {
                        let fresh = match renamed.iter().find(|(name, _)| name == other) {
                            Some((_, fresh)) => *fresh,
                            None => {
                                let fresh = self.variable("w");
                                renamed.push((*other, fresh));
                                fresh
                            }
                        };
                        args.push(FoTerm::Var(fresh));
                    }
                    other => args.push(self.term(other)),
                }
            }
            let locals: Vec<Symbol> = renamed.into_iter().map(|(_, fresh)| fresh).collect();
            guards.push(Formula::exists(locals, Formula::atom(guard.predicate, args)));
        }

        let mut pinned = query.clone();
        for var in &keys {
            pinned = self.pin(&pinned, *var, *var);
        }
        guards.push(self.rw(&pinned));
        Formula::exists(keys, Formula::and(guards))
    }

    /// Equalities a tuple `z̄` of the pivot's non-key positions must satisfy
    /// to match it, and the variable each pivot variable is bound to
    fn block_match(
        &self,
        pivot: &Atom,
        fresh: &[Symbol],
    ) -> (Vec<Formula>, Vec<(Symbol, Symbol)>) {
        let mut equalities = Vec::new();
        let mut bound: Vec<(Symbol, Symbol)> = Vec::new();
        for (arg, z) in pivot.non_key_args().iter().zip(fresh) {
            match arg {
                Term::Variable(var) => match bound.iter().find(|(name, _)| name == var) {
                    Some((_, first)) => {
                        equalities.push(Formula::Eq(FoTerm::Var(*z), FoTerm::Var(*first)))
                    }
                    None => bound.push((*var, *z)),
                },
                constant => equalities.push(Formula::Eq(FoTerm::Var(*z), self.term(constant))),
            }
        }
        (equalities, bound)
    }

    /// Ground-key positive pivot: its block is non-empty and every fact in
    /// it matches and makes the rest certain
    fn positive_block(&mut self, query: &Query, position: usize) -> Formula {
        let pivot = query.atoms[position].clone();
        let (fresh, guard) = self.key_guard(&pivot);
        let (equalities, bound) = self.block_match(&pivot, &fresh);

        let mut rest = query.without(position);
        for (var, z) in &bound {
            rest = self.pin(&rest, *var, *z);
        }
        let mut conclusion = equalities;
        conclusion.push(self.rw(&rest));

        Formula::and(vec![
            Formula::exists(fresh.clone(), guard.clone()),
            Formula::forall(fresh, Formula::implies(guard, Formula::and(conclusion))),
        ])
    }

    /// Ground-key negated pivot: the rest is certain, and each fact of the
    /// block that matches the pivot is excluded through a fresh relation
    fn negated_block(&mut self, query: &Query, position: usize) -> Formula {
        let pivot = query.atoms[position].clone();
        let rest = query.without(position);
        let without_pivot = self.rw(&rest);

        let (fresh, guard) = self.key_guard(&pivot);
        let (equalities, bound) = self.block_match(&pivot, &fresh);

        let excluded = if bound.is_empty() {
            Formula::not(Formula::and(equalities))
        } else {
            let reserved = &self.reserved;
            let relation = self
                .fresh
                .relation(|name| reserved.iter().any(|symbol| symbol.as_str() == name));
            let tuple = bound.iter().map(|(_, z)| FoTerm::Var(*z)).collect();
            self.tuples.insert(relation, tuple);

            let vars: Vec<Term> = bound.iter().map(|(var, _)| Term::Variable(*var)).collect();
            let mut extended = rest.clone();
            extended.push(Atom::new(true, relation, vars.len(), vars));
            Formula::implies(Formula::and(equalities), self.rw(&extended))
        };

        Formula::and(vec![
            without_pivot,
            Formula::forall(fresh, Formula::implies(guard, excluded)),
        ])
    }
}
