//! The workflow document data model and its file I/O.

pub mod io;
mod model;

pub use model::{
    InputSlot, Link, LinkId, Node, NodeId, OutputSlot, WidgetValues, WorkflowDocument,
};
