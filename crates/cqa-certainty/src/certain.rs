//! Recursive certainty check
//!
//! # Algorithm
//!
//! 1. A database without key conflicts on the query's predicates has one
//!    repair: evaluate directly
//! 2. The empty query is certain; an all-key query is evaluated directly
//! 3. Otherwise pick an unattacked pivot atom `F`
//! 4. If `F`'s key holds variables, try every valuation of them the database
//!    offers; one certain instance suffices
//! 5. If `F`'s key is ground, every repair keeps exactly one fact of `F`'s
//!    block: the query must be certain for each choice
//!
//! A negated pivot with a ground key is replaced, per choice `f`, by a fresh
//! all-key relation holding the one tuple of `f` that `¬F` excludes.

use cqa_analysis::{select_pivot, AttackGraph, Pivot};
use cqa_ast::{sym, Atom, Fact, Query, Symbol, Term};
use cqa_core::{match_atom, match_key, satisfies, Bindings, Database, FreshNames};
use tracing::{debug, trace, warn};

use crate::{CertaintyError, Limit, Limits};

/// Certainty with the default limits, failing closed on selection failures
pub fn is_certain(query: &Query, db: &Database) -> Result<bool, CertaintyError> {
    Certifier::new().is_certain(query, db)
}

/// Configurable certainty checker
///
/// Holds the state of one top-level call at a time; every call starts from
/// fresh counters.
#[derive(Debug, Clone, Default)]
pub struct Certifier {
    limits: Limits,
    strict: bool,
    trace: Option<Vec<String>>,
    fresh: FreshNames,
    steps: u64,
}

impl Certifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Report a pivot-selection failure on an acyclic top-level query as an
    /// error instead of answering `false`
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Record every recursion step as text
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(Vec::new());
        self
    }

    pub fn trace(&self) -> &[String] {
        self.trace.as_deref().unwrap_or(&[])
    }

    /// Steps taken by the last call
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn is_certain(&mut self, query: &Query, db: &Database) -> Result<bool, CertaintyError> {
        self.fresh.reset();
        self.steps = 0;
        if let Some(trace) = &mut self.trace {
            trace.clear();
        }
        let certain = self.certain(query, db, 0)?;
        debug!(%query, certain, steps = self.steps, "certainty decided");
        Ok(certain)
    }

    fn note(&mut self, depth: usize, message: impl FnOnce() -> String) {
        if let Some(trace) = &mut self.trace {
            trace.push(format!("{}{}", "  ".repeat(depth), message()));
        }
    }

    fn step(&mut self, depth: usize) -> Result<(), CertaintyError> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(CertaintyError::ResourceExhausted {
                limit: Limit::Steps,
                value: self.limits.max_steps,
            });
        }
        if depth > self.limits.max_depth {
            return Err(CertaintyError::ResourceExhausted {
                limit: Limit::Depth,
                value: self.limits.max_depth as u64,
            });
        }
        Ok(())
    }

    fn certain(&mut self, query: &Query, db: &Database, depth: usize) -> Result<bool, CertaintyError> {
        self.step(depth)?;
        trace!(depth, %query, "certain");

        if db.is_consistent_for(&query.predicates()) {
            let holds = satisfies(query, db);
            self.note(depth, || format!("{}: consistent, direct evaluation gives {}", query, holds));
            return Ok(holds);
        }
        if query.is_empty() {
            return Ok(true);
        }
        if query.iter().all(Atom::is_all_key) {
            let holds = satisfies(query, db);
            self.note(depth, || format!("{}: all-key, direct evaluation gives {}", query, holds));
            return Ok(holds);
        }

        let graph = AttackGraph::build(query);
        let position = match select_pivot(query, &graph) {
            Pivot::Atom(position) => position,
            Pivot::AllKey => return Ok(satisfies(query, db)),
            failure => return self.selection_failed(query, &graph, failure, depth),
        };

        let pivot = &query.atoms[position];
        self.note(depth, || format!("{}: pivot {}", query, pivot));
        if pivot.key_variables().is_empty() {
            if pivot.negated {
                self.negated_block(query, position, db, depth)
            } else {
                self.positive_block(query, position, db, depth)
            }
        } else {
            self.key_valuations(query, position, db, depth)
        }
    }

    fn selection_failed(
        &mut self,
        query: &Query,
        graph: &AttackGraph,
        failure: Pivot,
        depth: usize,
    ) -> Result<bool, CertaintyError> {
        if self.strict && depth == 0 && failure == Pivot::Attacked && graph.is_acyclic() {
            return Err(CertaintyError::InternalInvariantViolation(format!(
                "no unattacked atom in acyclic query {}",
                query
            )));
        }
        warn!(%query, ?failure, "no pivot atom, answering false");
        self.note(depth, || format!("{}: no pivot ({:?}), false", query, failure));
        Ok(false)
    }

    /// Branch on valuations of the pivot's key variables
    fn key_valuations(
        &mut self,
        query: &Query,
        position: usize,
        db: &Database,
        depth: usize,
    ) -> Result<bool, CertaintyError> {
        let pivot = &query.atoms[position];
        let candidates = if pivot.negated {
            guard_valuations(query, pivot, db)
        } else {
            let mut candidates: Vec<Bindings> = Vec::new();
            for fact in db.facts(&pivot.predicate) {
                let mut bindings = Bindings::new();
                if match_key(pivot, fact, &mut bindings) && !candidates.contains(&bindings) {
                    candidates.push(bindings);
                }
            }
            candidates
        };
        debug!(atom = %pivot, candidates = candidates.len(), "key valuations");

        for bindings in candidates {
            let instance = bindings.apply_query(query);
            if self.certain(&instance, db, depth + 1)? {
                self.note(depth, || format!("{} is certain", bindings));
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Every repair keeps one fact of the positive pivot's block
    fn positive_block(
        &mut self,
        query: &Query,
        position: usize,
        db: &Database,
        depth: usize,
    ) -> Result<bool, CertaintyError> {
        let pivot = &query.atoms[position];
        let block = relevant_facts(pivot, db);
        if block.is_empty() {
            self.note(depth, || format!("{}: empty block, false", pivot));
            return Ok(false);
        }
        let rest = query.without(position);

        for fact in &block {
            let mut bindings = Bindings::new();
            if !match_atom(pivot, fact, &mut bindings) {
                self.note(depth, || format!("{} does not match {}, false", fact, pivot));
                return Ok(false);
            }
            let restricted = db.restrict_block(fact);
            if !self.certain(&bindings.apply_query(&rest), &restricted, depth + 1)? {
                self.note(depth, || format!("choosing {} falsifies the query", fact));
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Every repair keeps one fact of the negated pivot's block
    fn negated_block(
        &mut self,
        query: &Query,
        position: usize,
        db: &Database,
        depth: usize,
    ) -> Result<bool, CertaintyError> {
        let pivot = &query.atoms[position];
        let block = relevant_facts(pivot, db);
        let rest = query.without(position);

        if !self.certain(&rest, db, depth + 1)? {
            return Ok(false);
        }
        if block.is_empty() {
            return Ok(true);
        }

        let vars = pivot.variables();
        for fact in &block {
            let restricted = db.restrict_block(fact);
            let mut bindings = Bindings::new();
            let holds = if !match_atom(&as_positive(pivot), fact, &mut bindings) {
                self.certain(&rest, &restricted, depth + 1)?
            } else if vars.is_empty() {
                false
            } else {
                let relation = self.fresh.relation(|name| {
                    restricted.has_relation(name) || query.predicates().contains(&sym(name))
                });
                let tuple: Vec<Symbol> = vars
                    .iter()
                    .filter_map(|var| bindings.get(var).copied())
                    .collect();
                let excluded = Fact::new(relation, tuple.len(), tuple);
                debug!(%relation, %fact, "fresh relation for excluded tuple");
                self.note(depth, || format!("{} excludes {}", fact, excluded));

                let mut extended = rest.clone();
                extended.push(Atom::new(
                    true,
                    relation,
                    vars.len(),
                    vars.iter().map(|var| Term::Variable(*var)).collect(),
                ));
                let view = restricted.with_relation(relation, vec![excluded]);
                self.certain(&extended, &view, depth + 1)?
            };
            if !holds {
                self.note(depth, || format!("choosing {} falsifies the query", fact));
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn as_positive(atom: &Atom) -> Atom {
    Atom {
        negated: false,
        ..atom.clone()
    }
}

/// Facts of the pivot's predicate in the block named by its ground key
fn relevant_facts(pivot: &Atom, db: &Database) -> Vec<Fact> {
    let key: Vec<Symbol> = pivot.key_args().iter().map(Term::symbol).collect();
    db.facts(&pivot.predicate)
        .iter()
        .filter(|fact| fact.arity() == pivot.arity() && fact.key_args() == key.as_slice())
        .cloned()
        .collect()
}

/// Valuations of a negated atom's key variables drawn from the positive atoms
/// that guard them
fn guard_valuations(query: &Query, pivot: &Atom, db: &Database) -> Vec<Bindings> {
    let mut valuations = vec![Bindings::new()];
    for var in pivot.key_variables() {
        let Some(guard) = query.positive().find(|atom| atom.mentions(&var)) else {
            return Vec::new();
        };
        let mut values: Vec<Symbol> = Vec::new();
        for fact in db.facts(&guard.predicate) {
            let mut bindings = Bindings::new();
            if match_atom(guard, fact, &mut bindings) {
                if let Some(value) = bindings.get(&var) {
                    if !values.contains(value) {
                        values.push(*value);
                    }
                }
            }
        }
        valuations = valuations
            .into_iter()
            .flat_map(|partial| {
                values.iter().map(move |value| {
                    let mut extended = partial.clone();
                    extended.bind(var, *value);
                    extended
                })
            })
            .collect();
    }
    valuations
}
