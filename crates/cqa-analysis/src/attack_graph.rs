//! Attack graphs
//!
//! Every positive atom `R(k̄; v̄)` contributes the functional dependency
//! `vars(k̄) → vars(R)`. The closure of an atom `F` is the fixpoint reached
//! from `F`'s key variables under all of those dependencies.
//!
//! # Attacks
//!
//! `F` attacks `G` when
//!
//! 1. `F` is positive and `F ≠ G`
//! 2. `G` has at least one key variable
//! 3. every key variable of `G` lies in the closure of `F`
//!
//! Negated atoms are nodes of the graph and can be attacked, but never attack.
//! Structurally identical atoms share a node.

use cqa_ast::{Atom, Query, Symbol};
use std::fmt;
use tracing::debug;

use crate::cycle;

/// `from → to`, contributed by the positive atom `source`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionalDependency {
    pub source: Symbol,
    pub from: Vec<Symbol>,
    pub to: Vec<Symbol>,
}

impl fmt::Display for FunctionalDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |vars: &[Symbol]| {
            vars.iter()
                .map(|var| var.as_str().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "{{{}}} → {{{}}}", join(&self.from), join(&self.to))
    }
}

pub fn functional_dependencies(query: &Query) -> Vec<FunctionalDependency> {
    query
        .positive()
        .map(|atom| FunctionalDependency {
            source: atom.predicate,
            from: atom.key_variables(),
            to: atom.variables(),
        })
        .collect()
}

/// Every variable reachable from `start` under `dependencies`
pub fn closure(start: &[Symbol], dependencies: &[FunctionalDependency]) -> Vec<Symbol> {
    let mut reached: Vec<Symbol> = Vec::new();
    for var in start {
        if !reached.contains(var) {
            reached.push(*var);
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for dependency in dependencies {
            if !dependency.from.iter().all(|var| reached.contains(var)) {
                continue;
            }
            for var in &dependency.to {
                if !reached.contains(var) {
                    reached.push(*var);
                    changed = true;
                }
            }
        }
    }
    reached
}

#[derive(Debug, Clone)]
pub struct AttackGraph {
    nodes: Vec<Atom>,
    /// Query position to node
    node_of: Vec<usize>,
    closures: Vec<Vec<Symbol>>,
    successors: Vec<Vec<usize>>,
}

impl AttackGraph {
    pub fn build(query: &Query) -> Self {
        let mut nodes: Vec<Atom> = Vec::new();
        let mut node_of = Vec::with_capacity(query.len());
        for atom in query.iter() {
            let node = match nodes.iter().position(|existing| existing == atom) {
                Some(node) => node,
                None => {
                    nodes.push(atom.clone());
                    nodes.len() - 1
                }
            };
            node_of.push(node);
        }

        let dependencies = functional_dependencies(query);
        let closures: Vec<Vec<Symbol>> = nodes
            .iter()
            .map(|atom| closure(&atom.key_variables(), &dependencies))
            .collect();

        let mut successors = vec![Vec::new(); nodes.len()];
        for (from, attacker) in nodes.iter().enumerate() {
            if attacker.negated {
                continue;
            }
            for (to, target) in nodes.iter().enumerate() {
                if from == to {
                    continue;
                }
                let key = target.key_variables();
                if !key.is_empty() && key.iter().all(|var| closures[from].contains(var)) {
                    successors[from].push(to);
                }
            }
        }

        let graph = AttackGraph {
            nodes,
            node_of,
            closures,
            successors,
        };
        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edge_count(),
            "built attack graph"
        );
        graph
    }

    pub fn nodes(&self) -> &[Atom] {
        &self.nodes
    }

    pub fn node(&self, node: usize) -> &Atom {
        &self.nodes[node]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node holding the query atom at `position`
    pub fn node_of(&self, position: usize) -> usize {
        self.node_of[position]
    }

    pub fn index_of(&self, atom: &Atom) -> Option<usize> {
        self.nodes.iter().position(|node| node == atom)
    }

    pub fn attacks(&self, from: usize, to: usize) -> bool {
        self.successors[from].contains(&to)
    }

    pub fn successors(&self, node: usize) -> &[usize] {
        &self.successors[node]
    }

    pub fn attackers(&self, node: usize) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&from| self.attacks(from, node))
            .collect()
    }

    pub fn in_degree(&self, node: usize) -> usize {
        self.attackers(node).len()
    }

    pub fn closure(&self, node: usize) -> &[Symbol] {
        &self.closures[node]
    }

    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.successors
            .iter()
            .enumerate()
            .flat_map(|(from, targets)| targets.iter().map(move |&to| (from, to)))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(Vec::len).sum()
    }

    pub fn is_acyclic(&self) -> bool {
        !cycle::has_cycle(&self.successors)
    }

    /// Atoms along one cycle, if any
    pub fn find_cycle(&self) -> Option<Vec<&Atom>> {
        cycle::find_cycle(&self.successors)
            .map(|cycle| cycle.into_iter().map(|node| &self.nodes[node]).collect())
    }

    /// `P(x; y) → Q(y; x) → P(x; y)`
    pub fn describe_cycle(&self) -> Option<String> {
        let cycle = self.find_cycle()?;
        let mut names: Vec<String> = cycle.iter().map(|atom| atom.to_string()).collect();
        if let Some(first) = names.first().cloned() {
            names.push(first);
        }
        Some(names.join(" → "))
    }

    /// Graphviz rendering
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph attacks {\n");
        for (node, atom) in self.nodes.iter().enumerate() {
            let shape = if atom.negated { "box" } else { "ellipse" };
            out.push_str(&format!(
                "  n{} [label=\"{}\", shape={}];\n",
                node,
                atom.to_string().replace('"', "\\\""),
                shape
            ));
        }
        for (from, to) in self.edges() {
            out.push_str(&format!("  n{} -> n{};\n", from, to));
        }
        out.push('}');
        out
    }
}

impl fmt::Display for AttackGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edges = self.edges();
        if edges.is_empty() {
            return write!(f, "(no attacks)");
        }
        let lines: Vec<String> = edges
            .iter()
            .map(|&(from, to)| format!("{} ⇝ {}", self.nodes[from], self.nodes[to]))
            .collect();
        write!(f, "{}", lines.join("\n"))
    }
}
