//! Graph indices, slot resolution, and variable-alias resolution.

mod accessor;
mod slots;
pub mod variables;

pub use accessor::GraphIndex;
pub use slots::{SlotDirection, SlotSpec, resolve_slot};
pub use variables::{AliasResolution, BackwardOverlay, UpstreamEdge};
