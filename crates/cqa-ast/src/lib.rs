//! Term model for consistent query answering under primary keys
//!
//! Everything downstream (parser, database, analysis, certainty, rewriting)
//! speaks in these types.
//!
//! # Key Components
//!
//! - **Term**: a variable or a constant; a [`TermClassifier`] decides which
//!   when source text is turned into terms
//! - **Atom**: a possibly negated predicate with a primary-key prefix,
//!   e.g. `R(x, y; z)` has key `(x, y)` and non-key `(z)`
//! - **Fact**: a ground atom stored in a database
//! - **Query**: an ordered conjunction of atoms
//!
//! # Example
//!
//! ```
//! use cqa_ast::{Atom, Query};
//!
//! let query = Query::new(vec![
//!     Atom::positive("Likes", 2, &["p", "t"]),
//!     Atom::negative("Lives", 1, &["p", "t"]),
//! ]);
//! assert_eq!(query.variables().len(), 2);
//! ```

mod ast;
mod classify;

pub use ast::{sym, Atom, Fact, Query, Symbol, Term};
pub use classify::{LowercaseVariables, TermClassifier};
