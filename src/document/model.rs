use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a node within one workflow document.
pub type NodeId = u64;
/// Identifier of a link within one workflow document.
pub type LinkId = u64;

/// The opaque parameter payload of a node.
///
/// Node editors persist this either as an ordered list or as a named mapping,
/// depending on the node implementation. The core never interprets the
/// contents; it only addresses entries by index (ordered) or key (named).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WidgetValues {
    Ordered(Vec<Value>),
    Named(Map<String, Value>),
}

impl WidgetValues {
    /// First entry of an ordered payload, if any.
    pub fn first(&self) -> Option<&Value> {
        match self {
            WidgetValues::Ordered(values) => values.first(),
            WidgetValues::Named(_) => None,
        }
    }
}

/// A single-valued input connection point on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSlot {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub dtype: String,
    #[serde(default)]
    pub link: Option<LinkId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A multi-valued output connection point on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSlot {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub dtype: String,
    /// Editors persist `null` for never-connected outputs, so this stays
    /// an `Option` to round-trip faithfully. Use [`OutputSlot::link_ids`].
    #[serde(default)]
    pub links: Option<Vec<LinkId>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OutputSlot {
    /// The link ids attached to this output, treating `null` as empty.
    pub fn link_ids(&self) -> &[LinkId] {
        self.links.as_deref().unwrap_or(&[])
    }
}

/// A directed, typed connection serialized as the 6-element array
/// `[id, src_node, src_slot, dst_node, dst_slot, dtype]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link(
    pub LinkId,
    pub NodeId,
    pub usize,
    pub NodeId,
    pub usize,
    pub Option<String>,
);

impl Link {
    pub fn new(
        id: LinkId,
        src_id: NodeId,
        src_slot: usize,
        dst_id: NodeId,
        dst_slot: usize,
        dtype: impl Into<String>,
    ) -> Self {
        Link(id, src_id, src_slot, dst_id, dst_slot, Some(dtype.into()))
    }

    pub fn id(&self) -> LinkId {
        self.0
    }
    pub fn src_id(&self) -> NodeId {
        self.1
    }
    pub fn src_slot(&self) -> usize {
        self.2
    }
    pub fn dst_id(&self) -> NodeId {
        self.3
    }
    pub fn dst_slot(&self) -> usize {
        self.4
    }

    /// The carried data type, `""` when the editor left it untyped.
    pub fn dtype(&self) -> &str {
        self.5.as_deref().unwrap_or("")
    }

    /// True when this link touches `node_id` as either endpoint.
    pub fn touches(&self, node_id: NodeId) -> bool {
        self.src_id() == node_id || self.dst_id() == node_id
    }
}

/// A typed unit in the workflow graph.
///
/// Fields the core never reads (position, size, flags, properties, ...)
/// are preserved verbatim in `extra` so a mutated document still contains
/// everything the editor wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub ntype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<Value>,
    #[serde(default)]
    pub inputs: Vec<InputSlot>,
    #[serde(default)]
    pub outputs: Vec<OutputSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widgets_values: Option<WidgetValues>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Display title: `Type "title"` when a custom title is set, else the type.
    pub fn display_title(&self) -> String {
        match &self.title {
            Some(title) if title != &self.ntype => format!("{} \"{}\"", self.ntype, title),
            _ => self.ntype.clone(),
        }
    }

    /// Display form with the node id: `[id] Type "title"`.
    pub fn display_ref(&self) -> String {
        format!("[{}] {}", self.id, self.display_title())
    }
}

/// A complete workflow document: every node, every link, and the two
/// monotonic id counters the editor uses to mint fresh identities.
///
/// Top-level fields the core does not model (editor version, groups,
/// canvas config, ...) are carried in `extra` and round-trip untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub last_node_id: NodeId,
    #[serde(default)]
    pub last_link_id: LinkId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkflowDocument {
    /// Parse a document from its JSON text.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Find a node by id. Linear scan; use [`GraphIndex`](crate::graph::GraphIndex)
    /// when many lookups are needed.
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == node_id)
    }

    /// Find a link by id.
    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.links.iter().find(|l| l.id() == link_id)
    }

    /// All nodes whose type contains `pattern`, case-insensitively.
    pub fn nodes_by_type(&self, pattern: &str) -> Vec<&Node> {
        let pattern = pattern.to_lowercase();
        self.nodes
            .iter()
            .filter(|n| n.ntype.to_lowercase().contains(&pattern))
            .collect()
    }

    /// Mint a fresh node id, advancing the document counter.
    pub fn mint_node_id(&mut self) -> NodeId {
        self.last_node_id += 1;
        self.last_node_id
    }

    /// Mint a fresh link id, advancing the document counter.
    pub fn mint_link_id(&mut self) -> LinkId {
        self.last_link_id += 1;
        self.last_link_id
    }
}
