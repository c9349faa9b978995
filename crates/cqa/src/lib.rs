//! Consistent Query Answering
//!
//! Decides whether a self-join-free conjunctive query with negated atoms is
//! true in every repair of a database that violates its primary keys.
//!
//! # Pipeline
//!
//! 1. Parse the `@database` / `@query` source
//! 2. Classify the negation (NGFO, weakly guarded, unguarded)
//! 3. Build the attack graph and check it for cycles
//! 4. Decide certainty
//! 5. Rewrite the query into first-order logic when the graph is acyclic
//!
//! # Example
//!
//! ```
//! use cqa::{evaluate_source, Options};
//!
//! let report = evaluate_source(
//!     "@database\nLikes(John, Paris;)\n@query\nLikes(p, t;)",
//!     &Options::default(),
//! )
//! .unwrap();
//! assert_eq!(report.certain, Some(true));
//! ```

mod driver;
mod report;

pub use driver::{evaluate, evaluate_source, DriverError, Options};
pub use report::Report;

// Re-export the pipeline crates for advanced usage
pub use cqa_analysis;
pub use cqa_ast;
pub use cqa_certainty;
pub use cqa_core;
pub use cqa_parser;
pub use cqa_rewrite;
