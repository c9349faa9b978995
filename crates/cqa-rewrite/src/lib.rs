//! First-order rewriting for consistent query answering
//!
//! For a guarded, self-join-free query with an acyclic attack graph,
//! [`rewrite`] produces a closed first-order formula that is true on a
//! database exactly when the query is certain on it. [`evaluate`] checks such
//! a formula directly, and the formula prints as Unicode text or LaTeX.

mod eval;
mod formula;
mod pretty;
mod rewriter;

pub use eval::evaluate;
pub use formula::{FoAtom, FoTerm, Formula};
pub use pretty::to_latex;
pub use rewriter::{rewrite, RewriteError, Rewriter};
