//! Parser for consistent query answering problems
//!
//! This crate implements a parser combinator-based parser using the Chumsky
//! library. It turns the textual `@database` / `@query` format into facts and
//! a [`Query`](cqa_ast::Query), validating relation schemas on the way.
//!
//! # Supported Syntax
//!
//! - **Sections**: `@database` and `@query` (`@Database`, `@Query` also accepted)
//! - **Key split**: `Lives(John; London)`; arguments before `;` form the key,
//!   without `;` every argument is part of the key
//! - **Negation**: `not Lives(p; t)`, `¬Lives(p; t)` or `!Lives(p; t)` (query only)
//! - **Comments**: `#` to end of line
//!
//! # Example
//!
//! ```
//! use cqa_parser::{parse_problem, SrcId};
//!
//! let text = "@database\nLikes(John, Paris;)\n@query\nLikes(p, t;)";
//! let problem = parse_problem(text, SrcId::empty()).expect("Parse error");
//! assert_eq!(problem.database.len(), 1);
//! assert_eq!(problem.query.len(), 1);
//! ```

mod error;
mod parser;
mod span;
mod token;

pub use error::ParseError;
pub use parser::{parse_facts, parse_problem, parse_problem_with, parse_query, Problem};
pub use span::{Span, SrcId};
pub use token::{LexError, Token};
