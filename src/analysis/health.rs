//! Orphaned-input and dangling-output detection.

use crate::document::{LinkId, NodeId, WorkflowDocument};
use crate::graph::GraphIndex;

/// Node types whose inputs are predominantly optional; unconnected inputs
/// on these are not flagged as likely required.
const OPTIONAL_HEAVY_TYPES: &[&str] = &[
    "WanVideoSampler",
    "WanVideoModelLoader",
    "WanVideoVACEEncode",
    "VHS_LoadVideo",
    "WanVideoEncode",
    "WanVideoLoraSelect",
];

/// Node types expected to have unconnected outputs (sinks, displays,
/// annotations); these never report dangling outputs.
const TERMINAL_TYPES: &[&str] = &[
    "VHS_VideoCombine",
    "SaveImage",
    "PreviewImage",
    "SetNode",
    "Display Any (rgthree)",
    "Display Int (rgthree)",
    "DisplayAny",
    "Note",
    "Label (rgthree)",
    "Reroute",
];

/// An input slot with no connection, or one referencing a link that is
/// missing from the link collection (a broken link).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanInput {
    pub node_id: NodeId,
    pub node_type: String,
    pub input_slot: usize,
    pub input_name: String,
    pub input_type: String,
    pub likely_required: bool,
    pub is_primary: bool,
    /// Set when the slot references a link id absent from the document.
    pub broken_link: Option<LinkId>,
}

/// An output slot with zero connections on a non-terminal node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingOutput {
    pub node_id: NodeId,
    pub node_type: String,
    pub output_slot: usize,
    pub output_name: String,
    pub output_type: String,
}

/// Find all unconnected or broken input slots.
///
/// With `primary_only`, only each node's first input slot is examined.
/// Broken links are always reported as likely required.
pub fn find_orphans(doc: &WorkflowDocument, primary_only: bool) -> Vec<OrphanInput> {
    let index = GraphIndex::build(doc);

    let mut orphans = Vec::new();
    for node in &doc.nodes {
        for (i, input) in node.inputs.iter().enumerate() {
            if primary_only && i > 0 {
                continue;
            }

            let input_name = if input.name.is_empty() {
                format!("input_{}", i)
            } else {
                input.name.clone()
            };
            let input_type = if input.dtype.is_empty() {
                "?".to_string()
            } else {
                input.dtype.clone()
            };

            match input.link {
                None => {
                    let likely_required = i == 0
                        || (!input_name.to_lowercase().contains("optional")
                            && !OPTIONAL_HEAVY_TYPES.contains(&node.ntype.as_str()));
                    orphans.push(OrphanInput {
                        node_id: node.id,
                        node_type: node.ntype.clone(),
                        input_slot: i,
                        input_name,
                        input_type,
                        likely_required,
                        is_primary: i == 0,
                        broken_link: None,
                    });
                }
                Some(link_id) if index.link(link_id).is_none() => {
                    orphans.push(OrphanInput {
                        node_id: node.id,
                        node_type: node.ntype.clone(),
                        input_slot: i,
                        input_name,
                        input_type,
                        likely_required: true,
                        is_primary: i == 0,
                        broken_link: Some(link_id),
                    });
                }
                Some(_) => {}
            }
        }
    }

    orphans
}

/// Find all output slots with zero link ids on non-terminal nodes.
pub fn find_dangling(doc: &WorkflowDocument) -> Vec<DanglingOutput> {
    let mut dangling = Vec::new();
    for node in &doc.nodes {
        if TERMINAL_TYPES.contains(&node.ntype.as_str()) {
            continue;
        }
        for (i, output) in node.outputs.iter().enumerate() {
            if output.link_ids().is_empty() {
                dangling.push(DanglingOutput {
                    node_id: node.id,
                    node_type: node.ntype.clone(),
                    output_slot: i,
                    output_name: if output.name.is_empty() {
                        format!("output_{}", i)
                    } else {
                        output.name.clone()
                    },
                    output_type: if output.dtype.is_empty() {
                        "?".to_string()
                    } else {
                        output.dtype.clone()
                    },
                });
            }
        }
    }
    dangling
}
