use crate::document::{Link, LinkId, NodeId, WorkflowDocument};
use crate::error::GraphError;
use crate::graph::GraphIndex;
use ahash::{AHashMap, AHashSet};
use std::collections::VecDeque;

/// One traversed link, with both endpoints resolved for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalEdge {
    pub src_id: NodeId,
    pub src_type: String,
    pub src_slot_name: String,
    pub dst_id: NodeId,
    pub dst_type: String,
    pub dst_slot_name: String,
    pub dtype: String,
}

/// Result of a bounded upstream or downstream closure.
#[derive(Debug, Default)]
pub struct Traversal {
    /// The node the traversal was anchored on (depth 0).
    pub anchor: NodeId,
    /// Every visited node and its minimum depth from the anchor.
    pub nodes: AHashMap<NodeId, usize>,
    /// Every traversed link id.
    pub links: AHashSet<LinkId>,
    /// Reconstructed `(src, dst)` detail for every traversed link,
    /// in link insertion order.
    pub edges: Vec<TraversalEdge>,
}

/// Find all nodes upstream of `target_id`, up to `max_depth` hops away.
///
/// With `input_filter` set, the traversal starts only from the first input
/// slot whose name contains the filter (case-insensitive); otherwise from
/// every connected input. The depth bound is inclusive: a node discovered
/// exactly at `max_depth` is recorded but not expanded further.
pub fn find_upstream(
    doc: &WorkflowDocument,
    target_id: NodeId,
    max_depth: usize,
    input_filter: Option<&str>,
) -> Result<Traversal, GraphError> {
    let index = GraphIndex::build(doc);
    let target = index.node(target_id).ok_or(GraphError::NodeNotFound(target_id))?;

    // dst id -> incoming links
    let mut backward: AHashMap<NodeId, Vec<&Link>> = AHashMap::new();
    for link in &doc.links {
        backward.entry(link.dst_id()).or_default().push(link);
    }

    let mut starts: Vec<(NodeId, LinkId)> = Vec::new();
    if let Some(filter) = input_filter {
        let filter = filter.to_lowercase();
        for input in &target.inputs {
            if input.name.to_lowercase().contains(&filter) {
                if let Some(link) = input.link.and_then(|id| index.link(id)) {
                    starts.push((link.src_id(), link.id()));
                }
                break;
            }
        }
    } else {
        for input in &target.inputs {
            if let Some(link) = input.link.and_then(|id| index.link(id)) {
                starts.push((link.src_id(), link.id()));
            }
        }
    }

    Ok(walk(doc, &index, target_id, starts, max_depth, |node_id| {
        backward
            .get(&node_id)
            .map(|links| links.iter().map(|l| (l.src_id(), l.id())).collect())
            .unwrap_or_default()
    }))
}

/// Find all nodes downstream of `source_id`, up to `max_depth` hops away.
///
/// With `output_filter` set, the traversal starts only from the first
/// output slot whose name contains the filter (case-insensitive).
pub fn find_downstream(
    doc: &WorkflowDocument,
    source_id: NodeId,
    max_depth: usize,
    output_filter: Option<&str>,
) -> Result<Traversal, GraphError> {
    let index = GraphIndex::build(doc);
    let source = index.node(source_id).ok_or(GraphError::NodeNotFound(source_id))?;

    // src id -> outgoing links
    let mut forward: AHashMap<NodeId, Vec<&Link>> = AHashMap::new();
    for link in &doc.links {
        forward.entry(link.src_id()).or_default().push(link);
    }

    let mut starts: Vec<(NodeId, LinkId)> = Vec::new();
    if let Some(filter) = output_filter {
        let filter = filter.to_lowercase();
        for output in &source.outputs {
            if output.name.to_lowercase().contains(&filter) {
                for link_id in output.link_ids() {
                    if let Some(link) = index.link(*link_id) {
                        starts.push((link.dst_id(), link.id()));
                    }
                }
                break;
            }
        }
    } else {
        for output in &source.outputs {
            for link_id in output.link_ids() {
                if let Some(link) = index.link(*link_id) {
                    starts.push((link.dst_id(), link.id()));
                }
            }
        }
    }

    Ok(walk(doc, &index, source_id, starts, max_depth, |node_id| {
        forward
            .get(&node_id)
            .map(|links| links.iter().map(|l| (l.dst_id(), l.id())).collect())
            .unwrap_or_default()
    }))
}

/// BFS over either adjacency direction, recording minimum depths and every
/// traversed link.
fn walk(
    doc: &WorkflowDocument,
    index: &GraphIndex<'_>,
    anchor: NodeId,
    starts: Vec<(NodeId, LinkId)>,
    max_depth: usize,
    neighbours: impl Fn(NodeId) -> Vec<(NodeId, LinkId)>,
) -> Traversal {
    let mut nodes: AHashMap<NodeId, usize> = AHashMap::from([(anchor, 0)]);
    let mut links: AHashSet<LinkId> = AHashSet::new();
    let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();

    for (next_id, link_id) in starts {
        links.insert(link_id);
        if !nodes.contains_key(&next_id) {
            nodes.insert(next_id, 1);
            if 1 < max_depth {
                queue.push_back((next_id, 1));
            }
        }
    }

    while let Some((node_id, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for (next_id, link_id) in neighbours(node_id) {
            links.insert(link_id);
            if !nodes.contains_key(&next_id) {
                nodes.insert(next_id, depth + 1);
                queue.push_back((next_id, depth + 1));
            }
        }
    }

    let edges = collect_edges(doc, index, &links);

    Traversal {
        anchor,
        nodes,
        links,
        edges,
    }
}

/// Resolve slot names by position for every visited link. Endpoints that
/// fall outside their node's slot collections render as `?` rather than
/// failing the traversal.
fn collect_edges(
    doc: &WorkflowDocument,
    index: &GraphIndex<'_>,
    visited: &AHashSet<LinkId>,
) -> Vec<TraversalEdge> {
    let mut edges = Vec::with_capacity(visited.len());
    for link in &doc.links {
        if !visited.contains(&link.id()) {
            continue;
        }

        let src = index.node(link.src_id());
        let dst = index.node(link.dst_id());

        let src_slot_name = src
            .and_then(|n| n.outputs.get(link.src_slot()))
            .map(|slot| slot.name.clone())
            .unwrap_or_else(|| "?".to_string());
        let dst_slot_name = dst
            .and_then(|n| n.inputs.get(link.dst_slot()))
            .map(|slot| slot.name.clone())
            .unwrap_or_else(|| "?".to_string());

        edges.push(TraversalEdge {
            src_id: link.src_id(),
            src_type: src.map(|n| n.ntype.clone()).unwrap_or_else(|| "?".to_string()),
            src_slot_name,
            dst_id: link.dst_id(),
            dst_type: dst.map(|n| n.ntype.clone()).unwrap_or_else(|| "?".to_string()),
            dst_slot_name,
            dtype: link.dtype().to_string(),
        });
    }
    edges
}
