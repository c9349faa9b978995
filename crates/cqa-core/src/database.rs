//! Fact storage for possibly inconsistent databases
//!
//! A relation is the set of facts of one predicate. All facts of a relation
//! share arity and key length. Facts with equal key arguments form a *block*;
//! a database is consistent when every block holds at most one fact.
//!
//! Relations live behind `Arc`, so cloning a [`Database`] is cheap and the
//! branch-local views built by [`Database::with_relation`] and
//! [`Database::restrict_block`] never affect the database they came from.

use cqa_ast::{sym, Fact, Symbol};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Error type for failed fact insertions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    /// Fact disagrees with the arity or key length already registered for its predicate
    #[error(
        "schema mismatch for {predicate}: expected {expected_arity} arguments with key length {expected_key}, found {found_arity} with key length {found_key}"
    )]
    SchemaMismatch {
        predicate: String,
        expected_arity: usize,
        expected_key: usize,
        found_arity: usize,
        found_key: usize,
    },
}

/// Outcome of a successful insert operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

impl InsertOutcome {
    pub fn is_new(&self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}

#[derive(Debug, Clone)]
struct Relation {
    arity: usize,
    key_length: usize,
    facts: Vec<Fact>,
    index: HashSet<Fact>,
}

impl Relation {
    fn new(arity: usize, key_length: usize) -> Self {
        Relation {
            arity,
            key_length,
            facts: Vec::new(),
            index: HashSet::new(),
        }
    }

    fn from_facts(arity: usize, key_length: usize, facts: Vec<Fact>) -> Self {
        let mut relation = Relation::new(arity, key_length);
        for fact in facts {
            if relation.index.insert(fact.clone()) {
                relation.facts.push(fact);
            }
        }
        relation
    }

    fn is_consistent(&self) -> bool {
        let mut keys: HashSet<&[Symbol]> = HashSet::new();
        self.facts.iter().all(|fact| keys.insert(fact.key_args()))
    }
}

/// A database instance; facts are kept in insertion order
#[derive(Debug, Clone, Default)]
pub struct Database {
    relations: HashMap<Symbol, Arc<Relation>>,
    order: Vec<Symbol>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a database, rejecting facts that break their relation's schema
    pub fn from_facts(facts: impl IntoIterator<Item = Fact>) -> Result<Self, InsertError> {
        let mut db = Database::new();
        for fact in facts {
            db.insert(fact)?;
        }
        Ok(db)
    }

    pub fn insert(&mut self, fact: Fact) -> Result<InsertOutcome, InsertError> {
        if let Some(relation) = self.relations.get(&fact.predicate) {
            if relation.arity != fact.arity() || relation.key_length != fact.key_length {
                return Err(InsertError::SchemaMismatch {
                    predicate: fact.predicate.to_string(),
                    expected_arity: relation.arity,
                    expected_key: relation.key_length,
                    found_arity: fact.arity(),
                    found_key: fact.key_length,
                });
            }
        } else {
            self.order.push(fact.predicate);
        }

        let relation = Arc::make_mut(
            self.relations
                .entry(fact.predicate)
                .or_insert_with(|| Arc::new(Relation::new(fact.arity(), fact.key_length))),
        );
        if relation.index.insert(fact.clone()) {
            relation.facts.push(fact);
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::Duplicate)
        }
    }

    /// Facts of a predicate; unknown predicates have no facts
    pub fn facts(&self, predicate: &Symbol) -> &[Fact] {
        self.relations
            .get(predicate)
            .map(|relation| relation.facts.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, fact: &Fact) -> bool {
        self.relations
            .get(&fact.predicate)
            .is_some_and(|relation| relation.index.contains(fact))
    }

    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.contains_key(&sym(name))
    }

    /// Arity and key length of a predicate, if it has facts
    pub fn schema(&self, predicate: &Symbol) -> Option<(usize, usize)> {
        self.relations
            .get(predicate)
            .map(|relation| (relation.arity, relation.key_length))
    }

    /// Predicates in order of first insertion
    pub fn predicates(&self) -> impl Iterator<Item = &Symbol> {
        self.order.iter()
    }

    /// All facts, grouped by predicate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.order.iter().flat_map(|predicate| self.facts(predicate))
    }

    pub fn len(&self) -> usize {
        self.relations.values().map(|relation| relation.facts.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Facts sharing the block of `predicate` keyed by `key`
    pub fn block(&self, predicate: &Symbol, key: &[Symbol]) -> Vec<&Fact> {
        self.facts(predicate)
            .iter()
            .filter(|fact| fact.key_args() == key)
            .collect()
    }

    /// Blocks of a relation in order of first appearance
    pub fn blocks(&self, predicate: &Symbol) -> Vec<Vec<&Fact>> {
        let mut blocks: Vec<Vec<&Fact>> = Vec::new();
        let mut positions: HashMap<&[Symbol], usize> = HashMap::new();
        for fact in self.facts(predicate) {
            match positions.get(fact.key_args()) {
                Some(&position) => blocks[position].push(fact),
                None => {
                    positions.insert(fact.key_args(), blocks.len());
                    blocks.push(vec![fact]);
                }
            }
        }
        blocks
    }

    pub fn is_consistent(&self) -> bool {
        self.relations.values().all(|relation| relation.is_consistent())
    }

    /// Every block of the given predicates holds at most one fact
    pub fn is_consistent_for(&self, predicates: &[Symbol]) -> bool {
        predicates.iter().all(|predicate| {
            self.relations
                .get(predicate)
                .is_none_or(|relation| relation.is_consistent())
        })
    }

    /// A view with `predicate` replaced by `facts`
    ///
    /// The schema is taken from the first fact; an empty list removes the relation.
    pub fn with_relation(&self, predicate: Symbol, facts: Vec<Fact>) -> Database {
        let mut view = self.clone();
        match facts.first().map(|first| (first.arity(), first.key_length)) {
            Some((arity, key_length)) => {
                let relation = Relation::from_facts(arity, key_length, facts);
                if view.relations.insert(predicate, Arc::new(relation)).is_none() {
                    view.order.push(predicate);
                }
            }
            None => {
                view.relations.remove(&predicate);
                view.order.retain(|name| *name != predicate);
            }
        }
        view
    }

    /// A view in which the block of `fact` holds only `fact`
    pub fn restrict_block(&self, fact: &Fact) -> Database {
        let kept: Vec<Fact> = self
            .facts(&fact.predicate)
            .iter()
            .filter(|other| !other.conflicts_with(fact))
            .cloned()
            .collect();
        self.with_relation(fact.predicate, kept)
    }
}
