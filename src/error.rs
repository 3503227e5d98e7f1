use crate::document::NodeId;
use thiserror::Error;

/// Errors from read-only graph queries (traversal, analysis).
///
/// A missing anchor node is a structured result, never a panic; malformed
/// document shapes (missing slot collections, dangling link references)
/// are tolerated by the analysis functions and reported as broken elements.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Node {0} not found in the workflow")]
    NodeNotFound(NodeId),

    #[error("No path from [{from}] to [{to}]")]
    NoPath { from: NodeId, to: NodeId },
}

/// A slot specification that could not be resolved to a concrete index.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error("slot {index} out of range ({available} slots available)")]
    OutOfRange { index: usize, available: usize },

    #[error("slot '{spec}' not found (available: {available})")]
    NoMatch { spec: String, available: String },
}

/// Errors from mutation operations.
///
/// Mutations fail fast when the named target of the operation does not
/// exist and make no partial edit in that case. Individually-bad entries
/// inside bulk operations surface as warnings on the result instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Node {0} not found in the workflow")]
    NodeNotFound(NodeId),

    #[error("Source node {node_id}: {source}")]
    SourceSlot { node_id: NodeId, source: SlotError },

    #[error("Destination node {node_id}: {source}")]
    DestinationSlot { node_id: NodeId, source: SlotError },
}

/// Errors from loading or saving a workflow document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read or write workflow file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse workflow JSON: {0}")]
    Json(#[from] serde_json::Error),
}
