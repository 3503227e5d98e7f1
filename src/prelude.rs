//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types and functions of the kairo
//! crate so consumers can bring the whole surface in with one `use`.

// Document model
pub use crate::document::{
    InputSlot, Link, LinkId, Node, NodeId, OutputSlot, WidgetValues, WorkflowDocument,
};

// Graph indices and resolution
pub use crate::graph::{
    AliasResolution, BackwardOverlay, GraphIndex, SlotDirection, SlotSpec, resolve_slot,
};

// Traversal
pub use crate::traverse::{
    Subgraph, Traversal, TraversalEdge, find_downstream, find_path, find_subgraph, find_upstream,
};

// Analysis
pub use crate::analysis::{
    DanglingOutput, OrphanInput, Pipeline, VariableBinding, WorkflowAnalysis, WorkflowInfo,
    analyze_workflow, find_dangling, find_orphans, workflow_info,
};

// Mutation
pub use crate::edit::{
    CopyResult, DeleteReport, DisconnectResult, InlineReport, SlotDecl, WidgetKey, WireResult,
    copy_node, create_node, delete_nodes, disconnect_node, inline_variables, parse_value,
    set_widget_values, wire_nodes,
};

// Error types
pub use crate::error::{DocumentError, EditError, GraphError, SlotError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
