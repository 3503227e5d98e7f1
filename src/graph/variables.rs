//! Named-variable (alias) resolution.
//!
//! A `SetNode` publishes a value under a name derived from its title
//! (`Set_<name>`); every `GetNode` whose title derives the same name
//! consumes it. The pairing is recomputed from titles on every analysis
//! call and never persisted. For structural analysis the resolver
//! synthesizes implicit backward edges bridging each resolved `GetNode`
//! to whatever feeds its `SetNode`.

use crate::document::{LinkId, Node, NodeId, WorkflowDocument};
use ahash::AHashMap;

pub const SET_NODE_TYPE: &str = "SetNode";
pub const GET_NODE_TYPE: &str = "GetNode";
pub const SET_TITLE_PREFIX: &str = "Set_";
pub const GET_TITLE_PREFIX: &str = "Get_";

/// Variable name a set/get node derives from its title, if any.
///
/// The known prefix is stripped when present; matching between set and get
/// sides is exact and case-sensitive.
pub fn title_alias_name(node: &Node, prefix: &str) -> Option<String> {
    let title = node.title.as_deref()?;
    let name = title.strip_prefix(prefix).unwrap_or(title);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Variable name read from the node's ordered payload — the persisted
/// alias form used by the inlining pass.
pub fn widget_alias_name(node: &Node) -> Option<String> {
    match node.widgets_values.as_ref()?.first()? {
        serde_json::Value::String(name) if !name.is_empty() => Some(name.clone()),
        _ => None,
    }
}

/// The title-derived set/get pairing of one document snapshot.
#[derive(Debug, Default)]
pub struct AliasResolution {
    /// variable name -> publishing set node
    pub set_by_name: AHashMap<String, NodeId>,
    /// resolved get node -> its set node
    pub get_to_set: AHashMap<NodeId, NodeId>,
}

impl AliasResolution {
    pub fn resolve(doc: &WorkflowDocument) -> Self {
        let mut set_by_name = AHashMap::new();
        for node in &doc.nodes {
            if node.ntype == SET_NODE_TYPE
                && let Some(name) = title_alias_name(node, SET_TITLE_PREFIX)
            {
                set_by_name.insert(name, node.id);
            }
        }

        let mut get_to_set = AHashMap::new();
        for node in &doc.nodes {
            if node.ntype == GET_NODE_TYPE
                && let Some(name) = title_alias_name(node, GET_TITLE_PREFIX)
                && let Some(&set_id) = set_by_name.get(&name)
            {
                get_to_set.insert(node.id, set_id);
            }
        }

        Self {
            set_by_name,
            get_to_set,
        }
    }

    /// True when at least one get node resolves to this set node.
    pub fn has_consumer(&self, set_id: NodeId) -> bool {
        self.get_to_set.values().any(|&sid| sid == set_id)
    }
}

/// One backward edge in the analysis adjacency. Real links carry their
/// link id; alias-synthesized edges carry `None` and must never be
/// serialized back into the document.
#[derive(Debug, Clone)]
pub struct UpstreamEdge {
    pub src_id: NodeId,
    pub link: Option<LinkId>,
    pub dtype: String,
}

/// Backward adjacency overlay used by entry/exit/pipeline analysis:
/// every real link plus the synthetic edges bridging resolved alias pairs.
#[derive(Debug, Default)]
pub struct BackwardOverlay {
    edges: AHashMap<NodeId, Vec<UpstreamEdge>>,
}

impl BackwardOverlay {
    pub fn build(doc: &WorkflowDocument, aliases: &AliasResolution) -> Self {
        let mut edges: AHashMap<NodeId, Vec<UpstreamEdge>> = AHashMap::new();
        for link in &doc.links {
            edges.entry(link.dst_id()).or_default().push(UpstreamEdge {
                src_id: link.src_id(),
                link: Some(link.id()),
                dtype: link.dtype().to_string(),
            });
        }

        // Bridge each resolved get node to whatever feeds its set node.
        for (&get_id, &set_id) in &aliases.get_to_set {
            let bridged: Vec<UpstreamEdge> = edges
                .get(&set_id)
                .map(|set_inputs| {
                    set_inputs
                        .iter()
                        .map(|edge| UpstreamEdge {
                            src_id: edge.src_id,
                            link: None,
                            dtype: edge.dtype.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            edges.entry(get_id).or_default().extend(bridged);
        }

        Self { edges }
    }

    pub fn upstream(&self, node_id: NodeId) -> &[UpstreamEdge] {
        self.edges.get(&node_id).map(Vec::as_slice).unwrap_or(&[])
    }
}
