//! Explicit repair enumeration
//!
//! The number of repairs is the product of the sizes of the conflicting
//! blocks, so this is only usable on small databases. It answers the same
//! question as [`crate::Certifier`] by brute force.

use cqa_ast::{Fact, Query};
use cqa_core::{satisfies, Database};

/// A database split into its conflict-free part and its conflicting blocks
#[derive(Debug, Clone)]
pub struct RepairSpace {
    base: Database,
    conflicts: Vec<Vec<Fact>>,
}

impl RepairSpace {
    pub fn new(db: &Database) -> Self {
        let mut conflicts = Vec::new();
        let predicates: Vec<_> = db.predicates().copied().collect();
        for predicate in predicates {
            for block in db.blocks(&predicate) {
                if block.len() > 1 {
                    conflicts.push(block.into_iter().cloned().collect());
                }
            }
        }
        RepairSpace {
            base: db.clone(),
            conflicts,
        }
    }

    /// Facts that every repair keeps
    pub fn singletons(&self) -> Vec<&Fact> {
        self.base
            .iter()
            .filter(|fact| !self.conflicts.iter().any(|block| block.contains(fact)))
            .collect()
    }

    pub fn conflicts(&self) -> &[Vec<Fact>] {
        &self.conflicts
    }

    /// Number of repairs, saturating at `u128::MAX`
    pub fn count(&self) -> u128 {
        self.conflicts
            .iter()
            .fold(1u128, |total, block| total.saturating_mul(block.len() as u128))
    }

    pub fn iter(&self) -> Repairs<'_> {
        Repairs {
            space: self,
            choice: vec![0; self.conflicts.len()],
            done: false,
        }
    }
}

/// Lazily yields every repair of a [`RepairSpace`]
pub struct Repairs<'a> {
    space: &'a RepairSpace,
    choice: Vec<usize>,
    done: bool,
}

impl Iterator for Repairs<'_> {
    type Item = Database;

    fn next(&mut self) -> Option<Database> {
        if self.done {
            return None;
        }
        let mut repair = self.space.base.clone();
        for (block, &chosen) in self.space.conflicts.iter().zip(&self.choice) {
            repair = repair.restrict_block(&block[chosen]);
        }

        // mixed-radix increment, last block fastest
        self.done = true;
        for position in (0..self.choice.len()).rev() {
            self.choice[position] += 1;
            if self.choice[position] < self.space.conflicts[position].len() {
                self.done = false;
                break;
            }
            self.choice[position] = 0;
        }
        Some(repair)
    }
}

/// Whether `query` holds in every repair of `db`
pub fn is_certain_by_repairs(query: &Query, db: &Database) -> bool {
    RepairSpace::new(db).iter().all(|repair| satisfies(query, &repair))
}
