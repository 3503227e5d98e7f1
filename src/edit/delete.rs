use crate::document::{LinkId, NodeId, WorkflowDocument};
use crate::edit::clear_link_references;
use crate::graph::GraphIndex;
use std::collections::BTreeSet;

/// An input on a surviving node that loses its connection when the
/// deletion commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanedInput {
    pub node_id: NodeId,
    pub node_type: String,
    pub input_name: String,
    pub was_connected_to: NodeId,
    pub was_connected_type: String,
}

/// An output on a surviving node whose consumer is being deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LostOutput {
    pub node_id: NodeId,
    pub node_type: String,
    pub output_name: String,
    pub was_connected_to: NodeId,
    pub was_connected_type: String,
}

/// Impact report of a node deletion; also the dry-run result.
#[derive(Debug, Clone, Default)]
pub struct DeleteReport {
    pub deleted_nodes: BTreeSet<NodeId>,
    pub removed_links: BTreeSet<LinkId>,
    pub orphaned_inputs: Vec<OrphanedInput>,
    pub lost_outputs: Vec<LostOutput>,
    pub warnings: Vec<String>,
}

/// Delete nodes and every link touching them.
///
/// The impact on surviving nodes (newly orphaned inputs, lost outputs) is
/// computed before committing so callers can warn the user; with `dry_run`
/// the same report is returned and the document is left untouched.
/// Nonexistent ids are reported as warnings and skipped, not fatal.
pub fn delete_nodes(doc: &mut WorkflowDocument, node_ids: &[NodeId], dry_run: bool) -> DeleteReport {
    let mut report = DeleteReport::default();

    {
        let index = GraphIndex::build(doc);

        for &node_id in node_ids {
            if index.node(node_id).is_none() {
                report
                    .warnings
                    .push(format!("Node {} not found, skipping", node_id));
            } else {
                report.deleted_nodes.insert(node_id);
            }
        }

        for link in &doc.links {
            if report.deleted_nodes.contains(&link.src_id())
                || report.deleted_nodes.contains(&link.dst_id())
            {
                report.removed_links.insert(link.id());
            }
        }

        // Impact on survivors: inputs losing their feeder.
        for node in &doc.nodes {
            if report.deleted_nodes.contains(&node.id) {
                continue;
            }
            for (i, input) in node.inputs.iter().enumerate() {
                let Some(link) = input
                    .link
                    .filter(|id| report.removed_links.contains(id))
                    .and_then(|id| index.link(id))
                else {
                    continue;
                };
                report.orphaned_inputs.push(OrphanedInput {
                    node_id: node.id,
                    node_type: node.ntype.clone(),
                    input_name: if input.name.is_empty() {
                        format!("input_{}", i)
                    } else {
                        input.name.clone()
                    },
                    was_connected_to: link.src_id(),
                    was_connected_type: index
                        .node(link.src_id())
                        .map(|n| n.ntype.clone())
                        .unwrap_or_else(|| "?".to_string()),
                });
            }
        }

        // Impact on survivors: outputs losing a consumer.
        for node in &doc.nodes {
            if report.deleted_nodes.contains(&node.id) {
                continue;
            }
            for (i, output) in node.outputs.iter().enumerate() {
                for link_id in output.link_ids() {
                    if !report.removed_links.contains(link_id) {
                        continue;
                    }
                    let Some(link) = index.link(*link_id) else {
                        continue;
                    };
                    if !report.deleted_nodes.contains(&link.dst_id()) {
                        continue;
                    }
                    report.lost_outputs.push(LostOutput {
                        node_id: node.id,
                        node_type: node.ntype.clone(),
                        output_name: if output.name.is_empty() {
                            format!("output_{}", i)
                        } else {
                            output.name.clone()
                        },
                        was_connected_to: link.dst_id(),
                        was_connected_type: index
                            .node(link.dst_id())
                            .map(|n| n.ntype.clone())
                            .unwrap_or_else(|| "?".to_string()),
                    });
                }
            }
        }
    }

    if dry_run {
        return report;
    }

    doc.nodes.retain(|n| !report.deleted_nodes.contains(&n.id));
    doc.links.retain(|l| !report.removed_links.contains(&l.id()));
    clear_link_references(doc, &report.removed_links);

    report
}
