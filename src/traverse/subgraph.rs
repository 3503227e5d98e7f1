use crate::document::{NodeId, WorkflowDocument};
use crate::error::GraphError;
use crate::graph::GraphIndex;
use ahash::{AHashMap, AHashSet};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};

/// The node/edge set lying on some path between two designated nodes.
#[derive(Debug)]
pub struct Subgraph {
    pub start_id: NodeId,
    pub end_id: NodeId,
    /// Nodes forward-reachable from start that can also reach end.
    pub nodes: AHashSet<NodeId>,
    /// Induced edges `(src, dst, dtype)` in link insertion order.
    pub edges: Vec<(NodeId, NodeId, String)>,
    /// Topological order of the induced subgraph. Nodes on a cycle are
    /// omitted rather than reported as an error.
    pub sorted: Vec<NodeId>,
}

/// Extract the subgraph between `start_id` and `end_id`.
///
/// Computes forward reachability from the start intersected with backward
/// reachability from the end, then a Kahn topological order over the
/// induced edges; zero-in-degree ties resolve in ascending node id.
pub fn find_subgraph(
    doc: &WorkflowDocument,
    start_id: NodeId,
    end_id: NodeId,
) -> Result<Subgraph, GraphError> {
    let index = GraphIndex::build(doc);
    if index.node(start_id).is_none() {
        return Err(GraphError::NodeNotFound(start_id));
    }
    if index.node(end_id).is_none() {
        return Err(GraphError::NodeNotFound(end_id));
    }

    let reachable_from_start = flood(start_id, |id| index.successors(id));
    let can_reach_end = flood(end_id, |id| index.predecessors(id));

    let between: AHashSet<NodeId> = reachable_from_start
        .intersection(&can_reach_end)
        .copied()
        .collect();
    if between.is_empty() {
        return Err(GraphError::NoPath {
            from: start_id,
            to: end_id,
        });
    }

    let edges: Vec<(NodeId, NodeId, String)> = doc
        .links
        .iter()
        .filter(|l| between.contains(&l.src_id()) && between.contains(&l.dst_id()))
        .map(|l| (l.src_id(), l.dst_id(), l.dtype().to_string()))
        .collect();

    let sorted = topological_order(&between, &edges);

    Ok(Subgraph {
        start_id,
        end_id,
        nodes: between,
        edges,
        sorted,
    })
}

fn flood<'a>(
    origin: NodeId,
    neighbours: impl Fn(NodeId) -> &'a [(NodeId, String)],
) -> AHashSet<NodeId> {
    let mut seen = AHashSet::new();
    let mut queue = VecDeque::from([origin]);
    while let Some(node_id) = queue.pop_front() {
        if !seen.insert(node_id) {
            continue;
        }
        for (next_id, _) in neighbours(node_id) {
            queue.push_back(*next_id);
        }
    }
    seen
}

/// Kahn's algorithm over the induced edge list. Cycle participants never
/// reach zero in-degree and are left out of the result.
fn topological_order(nodes: &AHashSet<NodeId>, edges: &[(NodeId, NodeId, String)]) -> Vec<NodeId> {
    let mut in_degree: AHashMap<NodeId, usize> = nodes.iter().map(|&id| (id, 0)).collect();
    let mut forward: AHashMap<NodeId, Vec<NodeId>> = AHashMap::new();
    for (src, dst, _) in edges {
        if let Some(degree) = in_degree.get_mut(dst) {
            *degree += 1;
        }
        forward.entry(*src).or_default().push(*dst);
    }

    let mut ready: BinaryHeap<Reverse<NodeId>> = in_degree
        .iter()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(&id, _)| Reverse(id))
        .collect();

    let mut sorted = Vec::with_capacity(nodes.len());
    while let Some(Reverse(node_id)) = ready.pop() {
        sorted.push(node_id);
        if let Some(successors) = forward.get(&node_id) {
            for &dst in successors {
                if let Some(degree) = in_degree.get_mut(&dst) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(dst));
                    }
                }
            }
        }
    }

    sorted
}
