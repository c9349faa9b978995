//! Database and evaluation primitives
//!
//! - [`Database`]: relations keyed by predicate, shared copy-on-write so that a
//!   recursion branch can restrict a block or add a fresh relation without
//!   touching its caller's view
//! - [`Bindings`]: variable-to-constant substitutions and matching of atoms
//!   against facts
//! - [`satisfies`]: direct evaluation of a query on a single instance
//! - [`FreshNames`]: per-call generator of relation and variable names

pub mod database;
pub mod eval;
pub mod fresh;
pub mod unification;

pub use database::{Database, InsertError, InsertOutcome};
pub use eval::{evaluate_query, satisfies};
pub use fresh::FreshNames;
pub use unification::{match_atom, match_key, unify, Bindings};
