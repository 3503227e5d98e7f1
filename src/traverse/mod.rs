//! BFS/DFS traversal primitives: shortest path, bounded closures, and
//! subgraph extraction with topological ordering.

mod closure;
mod path;
mod subgraph;

pub use closure::{Traversal, TraversalEdge, find_downstream, find_upstream};
pub use path::find_path;
pub use subgraph::{Subgraph, find_subgraph};
