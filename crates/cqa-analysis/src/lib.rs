//! Static analysis of conjunctive queries with negated atoms
//!
//! - [`guardedness`]: self-join-freeness and the NGFO / weakly-guarded tests
//! - [`attack_graph`]: functional-dependency closures and the attack relation
//! - [`cycle`]: depth-first cycle detection over any adjacency list
//! - [`pivot`]: choice of the unattacked atom that drives certainty and rewriting

pub mod attack_graph;
pub mod cycle;
pub mod guardedness;
pub mod pivot;

pub use attack_graph::{closure, functional_dependencies, AttackGraph, FunctionalDependency};
pub use cycle::{find_cycle, has_cycle};
pub use guardedness::{
    classify, repeated_positive_predicates, repeated_predicates, unguarded_pairs, Guardedness,
    UnguardedPair,
};
pub use pivot::{select_pivot, Pivot};
