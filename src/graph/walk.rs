//! Branch traversal
//!
//! A branch is the reachability closure from a start node. Traversal is a
//! depth-first pre-order over outgoing edges in declaration order
//! (condition results first, then the default), so the same topology
//! always yields the same visit sequence. Each node is visited once, which
//! handles both merges (shared downstream nodes) and cycles.

use std::collections::HashSet;

use super::model::Graph;

/// Pre-order visit sequence of the branch rooted at `start`.
///
/// Ids listed in `boundary` are never entered; edges into them are treated
/// as leaving the branch. Edges to ids missing from the graph are ignored.
pub fn preorder(graph: &Graph, start: &str, boundary: &HashSet<String>) -> Vec<String> {
    let mut order = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack: Vec<String> = vec![start.to_string()];

    while let Some(id) = stack.pop() {
        if visited.contains(&id) || boundary.contains(&id) {
            continue;
        }
        let Some(node) = graph.get(&id) else {
            continue;
        };
        visited.insert(id.clone());
        order.push(id);

        // Reverse so the first declared edge is popped first
        for next in node.edges().into_iter().rev() {
            if !visited.contains(&next) {
                stack.push(next);
            }
        }
    }

    order
}

/// Set of node ids reachable from `start` (including it)
pub fn closure(graph: &Graph, start: &str, boundary: &HashSet<String>) -> HashSet<String> {
    preorder(graph, start, boundary).into_iter().collect()
}
