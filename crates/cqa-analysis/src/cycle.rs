//! Cycle detection over adjacency lists
//!
//! Depth-first search with an explicit recursion stack. Every node is used as
//! a start point, so cycles in components unreachable from node 0 are found.

/// Whether the directed graph `successors` has a cycle
pub fn has_cycle(successors: &[Vec<usize>]) -> bool {
    find_cycle(successors).is_some()
}

/// Nodes of one cycle in edge order, without repeating the first node
pub fn find_cycle(successors: &[Vec<usize>]) -> Option<Vec<usize>> {
    let mut visited = vec![false; successors.len()];
    let mut on_stack = vec![false; successors.len()];
    let mut stack = Vec::new();

    for start in 0..successors.len() {
        if visited[start] {
            continue;
        }
        if let Some(cycle) = visit(successors, start, &mut visited, &mut on_stack, &mut stack) {
            return Some(cycle);
        }
    }
    None
}

fn visit(
    successors: &[Vec<usize>],
    node: usize,
    visited: &mut [bool],
    on_stack: &mut [bool],
    stack: &mut Vec<usize>,
) -> Option<Vec<usize>> {
    visited[node] = true;
    on_stack[node] = true;
    stack.push(node);

    for &next in &successors[node] {
        if on_stack[next] {
            let from = stack.iter().position(|&n| n == next).unwrap_or(0);
            return Some(stack[from..].to_vec());
        }
        if !visited[next] {
            if let Some(cycle) = visit(successors, next, visited, on_stack, stack) {
                return Some(cycle);
            }
        }
    }

    on_stack[node] = false;
    stack.pop();
    None
}
