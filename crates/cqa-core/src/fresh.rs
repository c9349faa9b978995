//! Fresh relation and variable names
//!
//! One generator belongs to one top-level call; counters are never shared
//! between calls, so the same input always yields the same names.

use cqa_ast::{sym, Symbol};

#[derive(Debug, Clone, Default)]
pub struct FreshNames {
    relations: usize,
    variables: usize,
}

impl FreshNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Next relation name `E1`, `E2`, ... for which `taken` is false
    pub fn relation(&mut self, taken: impl Fn(&str) -> bool) -> Symbol {
        loop {
            self.relations += 1;
            let name = format!("E{}", self.relations);
            if !taken(&name) {
                return sym(&name);
            }
        }
    }

    /// Next variable name `base'1`, `base'2`, ... for which `taken` is false
    pub fn variable(&mut self, base: &str, taken: impl Fn(&str) -> bool) -> Symbol {
        loop {
            self.variables += 1;
            let name = format!("{}'{}", base, self.variables);
            if !taken(&name) {
                return sym(&name);
            }
        }
    }
}
