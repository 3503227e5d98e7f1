use crate::document::{Link, LinkId, NodeId, WorkflowDocument};
use crate::edit::clear_link_references;
use crate::graph::GraphIndex;
use crate::graph::variables::{GET_NODE_TYPE, SET_NODE_TYPE, widget_alias_name};
use ahash::AHashMap;
use std::collections::BTreeSet;

/// A matched set/get pair scheduled for inlining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasPair {
    pub name: String,
    pub set_id: NodeId,
    pub get_ids: Vec<NodeId>,
}

/// A direct connection that replaces a variable hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLink {
    pub src_id: NodeId,
    pub src_slot: usize,
    pub dst_id: NodeId,
    pub dst_slot: usize,
    pub dtype: String,
}

/// Plan (and, unless dry-run, outcome) of variable inlining.
#[derive(Debug, Clone, Default)]
pub struct InlineReport {
    pub pairs: Vec<AliasPair>,
    pub nodes_to_delete: BTreeSet<NodeId>,
    pub links_to_create: Vec<PlannedLink>,
    pub links_to_remove: BTreeSet<LinkId>,
    /// Ids of the links actually created; empty on dry runs.
    pub created_links: Vec<LinkId>,
}

/// Replace every set/get variable pair with direct connections.
///
/// Pairing here uses the persisted alias form — the variable name stored
/// in the node payload — rather than display titles. For each pair, every
/// consumer of a get node is rewired straight to whatever feeds the set
/// node; both sides of the pair and all links touching them are then
/// removed. A set node with no connected upstream input is skipped.
pub fn inline_variables(doc: &mut WorkflowDocument, dry_run: bool) -> InlineReport {
    let mut report = InlineReport::default();

    {
        let index = GraphIndex::build(doc);

        // name -> winning set node (last wins), names in first-seen order
        let mut set_by_name: AHashMap<String, NodeId> = AHashMap::new();
        let mut set_names: Vec<String> = Vec::new();
        let mut gets_by_name: AHashMap<String, Vec<NodeId>> = AHashMap::new();

        for node in &doc.nodes {
            if node.ntype == SET_NODE_TYPE {
                if let Some(name) = widget_alias_name(node) {
                    if !set_by_name.contains_key(&name) {
                        set_names.push(name.clone());
                    }
                    set_by_name.insert(name, node.id);
                }
            } else if node.ntype == GET_NODE_TYPE
                && let Some(name) = widget_alias_name(node)
            {
                gets_by_name.entry(name).or_default().push(node.id);
            }
        }

        for name in &set_names {
            let set_id = set_by_name[name];
            let Some(get_ids) = gets_by_name.get(name) else {
                continue;
            };

            // What feeds the set node: its single input link.
            let Some(set_link) = index
                .node(set_id)
                .and_then(|n| n.inputs.first())
                .and_then(|input| input.link)
                .and_then(|id| index.link(id))
            else {
                continue;
            };

            report.pairs.push(AliasPair {
                name: name.clone(),
                set_id,
                get_ids: get_ids.clone(),
            });
            report.nodes_to_delete.insert(set_id);
            report.links_to_remove.insert(set_link.id());

            let src_id = set_link.src_id();
            let src_slot = set_link.src_slot();
            let dtype = set_link.dtype().to_string();

            for &get_id in get_ids {
                report.nodes_to_delete.insert(get_id);

                let get_links = index
                    .node(get_id)
                    .and_then(|n| n.outputs.first())
                    .map(|output| output.link_ids().to_vec())
                    .unwrap_or_default();

                for get_link_id in get_links {
                    let Some(get_link) = index.link(get_link_id) else {
                        continue;
                    };
                    report.links_to_remove.insert(get_link_id);
                    report.links_to_create.push(PlannedLink {
                        src_id,
                        src_slot,
                        dst_id: get_link.dst_id(),
                        dst_slot: get_link.dst_slot(),
                        dtype: dtype.clone(),
                    });
                }
            }
        }

        // Sweep up every other link touching a deleted node (a wired set
        // passthrough output, extra get outputs) so none survive with an
        // endpoint gone.
        for link in &doc.links {
            if report.nodes_to_delete.contains(&link.src_id())
                || report.nodes_to_delete.contains(&link.dst_id())
            {
                report.links_to_remove.insert(link.id());
            }
        }
    }

    if dry_run {
        return report;
    }

    doc.links
        .retain(|l| !report.links_to_remove.contains(&l.id()));

    for planned in &report.links_to_create {
        let link_id = doc.mint_link_id();
        doc.links.push(Link::new(
            link_id,
            planned.src_id,
            planned.src_slot,
            planned.dst_id,
            planned.dst_slot,
            planned.dtype.clone(),
        ));
        report.created_links.push(link_id);

        if let Some(dst) = doc.node_mut(planned.dst_id)
            && let Some(input) = dst.inputs.get_mut(planned.dst_slot)
        {
            input.link = Some(link_id);
        }
        if let Some(src) = doc.node_mut(planned.src_id)
            && let Some(output) = src.outputs.get_mut(planned.src_slot)
        {
            output.links.get_or_insert_with(Vec::new).push(link_id);
        }
    }

    doc.nodes
        .retain(|n| !report.nodes_to_delete.contains(&n.id));
    clear_link_references(doc, &report.links_to_remove);

    report
}
