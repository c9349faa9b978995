use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Depth,
    Steps,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Depth => write!(f, "recursion depth"),
            Limit::Steps => write!(f, "step count"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CertaintyError {
    /// The configured budget ran out; retrying with larger limits may succeed
    #[error("{limit} limit of {value} exceeded")]
    ResourceExhausted { limit: Limit, value: u64 },
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),
}
