use crate::document::{NodeId, WorkflowDocument};
use crate::graph::GraphIndex;
use ahash::AHashMap;
use std::collections::VecDeque;

/// Find the shortest forward path between two nodes using BFS.
///
/// Returns the node ids from `from` to `to` inclusive, or `None` when no
/// forward edge sequence connects them. Ties are broken by link insertion
/// order. `find_path(doc, x, x)` is always `[x]`.
pub fn find_path(doc: &WorkflowDocument, from: NodeId, to: NodeId) -> Option<Vec<NodeId>> {
    let index = GraphIndex::build(doc);

    let mut parents: AHashMap<NodeId, NodeId> = AHashMap::new();
    let mut queue = VecDeque::from([from]);

    while let Some(current) = queue.pop_front() {
        if current == to {
            return Some(reconstruct(&parents, from, to));
        }
        for (next_id, _) in index.successors(current) {
            if *next_id != from && !parents.contains_key(next_id) {
                parents.insert(*next_id, current);
                queue.push_back(*next_id);
            }
        }
    }

    None
}

fn reconstruct(parents: &AHashMap<NodeId, NodeId>, from: NodeId, to: NodeId) -> Vec<NodeId> {
    let mut path = vec![to];
    let mut current = to;
    while current != from {
        current = parents[&current];
        path.push(current);
    }
    path.reverse();
    path
}
