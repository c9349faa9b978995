//! Consistent query answering for primary keys
//!
//! A query is *certain* on an inconsistent database when it holds in every
//! repair, a repair keeping exactly one fact of each block of facts that
//! agree on predicate and key.
//!
//! [`Certifier`] decides certainty by recursion on the attack graph without
//! enumerating repairs. [`repairs`] enumerates them explicitly and serves as
//! the reference answer on small inputs.

mod certain;
mod config;
mod error;
pub mod repairs;

pub use certain::{is_certain, Certifier};
pub use config::Limits;
pub use error::{CertaintyError, Limit};
pub use repairs::{is_certain_by_repairs, RepairSpace};
