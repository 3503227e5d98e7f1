use crate::document::{Link, LinkId, Node, NodeId, WorkflowDocument};
use ahash::AHashMap;

/// Snapshot indices over a workflow document.
///
/// Built in a single pass over the node and link collections. The index
/// borrows the document; any structural mutation invalidates it and callers
/// must rebuild after every edit. Duplicate node ids are malformed input
/// and resolve to whichever node appears last.
pub struct GraphIndex<'a> {
    /// node id -> node
    pub nodes: AHashMap<NodeId, &'a Node>,
    /// link id -> link tuple
    pub links: AHashMap<LinkId, &'a Link>,
    /// src id -> [(dst id, dtype)] in link insertion order
    pub forward: AHashMap<NodeId, Vec<(NodeId, String)>>,
    /// dst id -> [(src id, dtype)] in link insertion order
    pub reverse: AHashMap<NodeId, Vec<(NodeId, String)>>,
}

impl<'a> GraphIndex<'a> {
    pub fn build(doc: &'a WorkflowDocument) -> Self {
        let mut nodes = AHashMap::with_capacity(doc.nodes.len());
        for node in &doc.nodes {
            nodes.insert(node.id, node);
        }

        let mut links = AHashMap::with_capacity(doc.links.len());
        let mut forward: AHashMap<NodeId, Vec<(NodeId, String)>> = AHashMap::new();
        let mut reverse: AHashMap<NodeId, Vec<(NodeId, String)>> = AHashMap::new();

        for link in &doc.links {
            links.insert(link.id(), link);
            forward
                .entry(link.src_id())
                .or_default()
                .push((link.dst_id(), link.dtype().to_string()));
            reverse
                .entry(link.dst_id())
                .or_default()
                .push((link.src_id(), link.dtype().to_string()));
        }

        Self {
            nodes,
            links,
            forward,
            reverse,
        }
    }

    pub fn node(&self, node_id: NodeId) -> Option<&'a Node> {
        self.nodes.get(&node_id).copied()
    }

    pub fn link(&self, link_id: LinkId) -> Option<&'a Link> {
        self.links.get(&link_id).copied()
    }

    /// Forward neighbours of `node_id`, empty when it has no outgoing links.
    pub fn successors(&self, node_id: NodeId) -> &[(NodeId, String)] {
        self.forward.get(&node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reverse neighbours of `node_id`, empty when it has no incoming links.
    pub fn predecessors(&self, node_id: NodeId) -> &[(NodeId, String)] {
        self.reverse.get(&node_id).map(Vec::as_slice).unwrap_or(&[])
    }
}
