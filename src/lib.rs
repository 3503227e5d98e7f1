//! # Kairo - Workflow Graph Analysis and Mutation Engine
//!
//! **Kairo** manipulates node-graph workflow documents: the directed graphs
//! of typed nodes connected by typed, single-valued links that visual
//! graph-authoring tools persist as JSON. It answers structural questions
//! (entry/exit detection, shortest paths, bounded upstream/downstream
//! closures, subgraph extraction, pipeline tracing, loop and variable-alias
//! detection) and transforms the graph in place (copy, wire, disconnect,
//! delete, create, variable inlining) while preserving its link-consistency
//! invariants.
//!
//! ## Core Workflow
//!
//! 1.  **Load**: parse a workflow JSON into a [`WorkflowDocument`]
//!     (`document::io::load`, or `WorkflowDocument::from_json`). Fields the
//!     engine does not model round-trip untouched.
//! 2.  **Analyze**: build a [`graph::GraphIndex`] snapshot and run the
//!     `analysis` and `traverse` functions. All analysis is pure.
//! 3.  **Mutate**: apply `edit` operations. Every successful mutation
//!     leaves the document consistent; indices built before the mutation
//!     must be rebuilt.
//! 4.  **Persist**: save the document back out (`document::io::save`).
//!
//! ## Quick Start
//!
//! ```rust
//! use kairo::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let doc_json = serde_json::json!({
//!         "nodes": [
//!             {"id": 1, "type": "LoadImage", "inputs": [],
//!              "outputs": [{"name": "IMAGE", "type": "IMAGE", "links": [1]}]},
//!             {"id": 2, "type": "SaveImage",
//!              "inputs": [{"name": "images", "type": "IMAGE", "link": 1}],
//!              "outputs": []},
//!         ],
//!         "links": [[1, 1, 0, 2, 0, "IMAGE"]],
//!         "last_node_id": 2,
//!         "last_link_id": 1,
//!     });
//!     let mut doc: WorkflowDocument = serde_json::from_value(doc_json)?;
//!
//!     // Structural analysis
//!     let analysis = analyze_workflow(&doc);
//!     assert_eq!(analysis.entry_points, vec![1]);
//!     assert_eq!(analysis.exit_points, vec![2]);
//!     assert_eq!(find_path(&doc, 1, 2), Some(vec![1, 2]));
//!
//!     // Mutation: replace the connection through the named slots
//!     let wired = wire_nodes(&mut doc, 1, "IMAGE", 2, "images")?;
//!     assert_eq!(wired.replaced_link, Some(1));
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod document;
pub mod edit;
pub mod error;
pub mod graph;
pub mod prelude;
pub mod traverse;
