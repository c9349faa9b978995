//! Evaluating formulas on a database
//!
//! Quantifiers range over the active domain: every value in the database and
//! every constant in the formula. Quantified variables are bound from atom
//! conjuncts first, so the domain is only enumerated for variables no atom
//! guards. `∀x̄ (φ → ψ)` is checked as `¬∃x̄ (φ ∧ ¬ψ)`.

use cqa_ast::Symbol;
use cqa_core::Database;
use std::collections::HashMap;

use crate::{FoAtom, FoTerm, Formula};

type Env = HashMap<Symbol, Symbol>;

/// Truth of a closed formula on `db`; free variables make atoms false
pub fn evaluate(formula: &Formula, db: &Database) -> bool {
    Evaluator::new(formula, db).holds(formula, &Env::new())
}

struct Evaluator<'a> {
    db: &'a Database,
    domain: Vec<Symbol>,
}

impl<'a> Evaluator<'a> {
    fn new(formula: &Formula, db: &'a Database) -> Self {
        let mut domain: Vec<Symbol> = Vec::new();
        for fact in db.iter() {
            for value in &fact.args {
                if !domain.contains(value) {
                    domain.push(*value);
                }
            }
        }
        collect_constants(formula, &mut domain);
        Evaluator { db, domain }
    }

    fn resolve(&self, term: &FoTerm, env: &Env) -> Option<Symbol> {
        match term {
            FoTerm::Var(var) => env.get(var).copied(),
            FoTerm::Const(value) => Some(*value),
        }
    }

    fn holds(&self, formula: &Formula, env: &Env) -> bool {
        match formula {
            Formula::True => true,
            Formula::False => false,
            Formula::Atom(atom) => self.atom_holds(atom, env),
            Formula::Eq(left, right) => match (self.resolve(left, env), self.resolve(right, env)) {
                (Some(left), Some(right)) => left == right,
                _ => false,
            },
            Formula::Not(inner) => !self.holds(inner, env),
            Formula::And(conjuncts) => conjuncts.iter().all(|conjunct| self.holds(conjunct, env)),
            Formula::Implies(premise, conclusion) => {
                !self.holds(premise, env) || self.holds(conclusion, env)
            }
            Formula::Exists(vars, body) => {
                let conjuncts = conjuncts_of(body);
                self.search(vars, &conjuncts, &scoped(env, vars))
            }
            Formula::Forall(vars, body) => {
                let counterexample = match body.as_ref() {
                    Formula::Implies(premise, conclusion) => {
                        let mut conjuncts = conjuncts_of(premise);
                        conjuncts.push(Formula::not(conclusion.as_ref().clone()));
                        conjuncts
                    }
                    other => vec![Formula::not(other.clone())],
                };
                !self.search(vars, &counterexample, &scoped(env, vars))
            }
            Formula::NotExists {
                predicate,
                arity,
                correlations,
            } => {
                let Some(values) = correlations
                    .iter()
                    .map(|(position, term)| self.resolve(term, env).map(|value| (*position, value)))
                    .collect::<Option<Vec<_>>>()
                else {
                    return false;
                };
                !self.db.facts(predicate).iter().any(|fact| {
                    fact.arity() == *arity
                        && values
                            .iter()
                            .all(|(position, value)| fact.args.get(*position) == Some(value))
                })
            }
            Formula::Fresh { args, tuple, .. } => {
                args.len() == tuple.len()
                    && args.iter().zip(tuple).all(|(arg, value)| {
                        match (self.resolve(arg, env), self.resolve(value, env)) {
                            (Some(arg), Some(value)) => arg == value,
                            _ => false,
                        }
                    })
            }
        }
    }

    fn atom_holds(&self, atom: &FoAtom, env: &Env) -> bool {
        let Some(values) = atom
            .args
            .iter()
            .map(|arg| self.resolve(arg, env))
            .collect::<Option<Vec<_>>>()
        else {
            return false;
        };
        self.db
            .facts(&atom.predicate)
            .iter()
            .any(|fact| fact.args == values)
    }

    /// Some extension of `env` to `vars` satisfies every conjunct
    fn search(&self, vars: &[Symbol], conjuncts: &[Formula], env: &Env) -> bool {
        let unbound: Vec<Symbol> = vars
            .iter()
            .filter(|var| !env.contains_key(*var))
            .copied()
            .collect();
        if unbound.is_empty() {
            return conjuncts.iter().all(|conjunct| self.holds(conjunct, env));
        }

        let guard = conjuncts.iter().find_map(|conjunct| match conjunct {
            Formula::Atom(atom) if mentions_any(&atom.args, &unbound) => Some(atom),
            _ => None,
        });
        if let Some(atom) = guard {
            return self.db.facts(&atom.predicate).iter().any(|fact| {
                let mut extended = env.clone();
                fact.arity() == atom.args.len()
                    && atom
                        .args
                        .iter()
                        .zip(&fact.args)
                        .all(|(arg, value)| bind(arg, *value, &unbound, &mut extended))
                    && self.search(vars, conjuncts, &extended)
            });
        }

        let var = unbound[0];
        self.domain.iter().any(|value| {
            let mut extended = env.clone();
            extended.insert(var, *value);
            self.search(vars, conjuncts, &extended)
        })
    }
}

/// Bind or check one argument position against a fact value
fn bind(term: &FoTerm, value: Symbol, unbound: &[Symbol], env: &mut Env) -> bool {
    match term {
        FoTerm::Const(constant) => *constant == value,
        FoTerm::Var(var) => match env.get(var) {
            Some(bound) => *bound == value,
            None if unbound.contains(var) => {
                env.insert(*var, value);
                true
            }
            None => false,
        },
    }
}

fn mentions_any(args: &[FoTerm], vars: &[Symbol]) -> bool {
    args.iter()
        .any(|arg| matches!(arg, FoTerm::Var(var) if vars.contains(var)))
}

fn conjuncts_of(formula: &Formula) -> Vec<Formula> {
    match formula {
        Formula::And(conjuncts) => conjuncts.clone(),
        other => vec![other.clone()],
    }
}

/// `env` without bindings for variables a quantifier rebinds
fn scoped(env: &Env, vars: &[Symbol]) -> Env {
    let mut inner = env.clone();
    for var in vars {
        inner.remove(var);
    }
    inner
}

fn collect_constants(formula: &Formula, domain: &mut Vec<Symbol>) {
    let add = |terms: &[FoTerm], domain: &mut Vec<Symbol>| {
        for term in terms {
            if let FoTerm::Const(value) = term {
                if !domain.contains(value) {
                    domain.push(*value);
                }
            }
        }
    };
    match formula {
        Formula::True | Formula::False => {}
        Formula::Atom(atom) => add(&atom.args, domain),
        Formula::Eq(left, right) => add(&[left.clone(), right.clone()], domain),
        Formula::NotExists { correlations, .. } => {
            let terms: Vec<FoTerm> = correlations.iter().map(|(_, term)| term.clone()).collect();
            add(&terms, domain)
        }
        Formula::Fresh { args, tuple, .. } => {
            add(args, domain);
            add(tuple, domain);
        }
        Formula::Not(inner) | Formula::Forall(_, inner) | Formula::Exists(_, inner) => {
            collect_constants(inner, domain)
        }
        Formula::And(conjuncts) => {
            for conjunct in conjuncts {
                collect_constants(conjunct, domain);
            }
        }
        Formula::Implies(premise, conclusion) => {
            collect_constants(premise, domain);
            collect_constants(conclusion, domain);
        }
    }
}
