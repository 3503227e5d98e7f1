//! Structural analysis of a workflow document: entry/exit points,
//! classification, pipeline tracing, loops, variables, and sections.

mod health;
pub mod roles;

pub use health::{DanglingOutput, OrphanInput, find_dangling, find_orphans};
pub use roles::{categorize_pipeline, detect_workflow_type, node_role};

use crate::document::{Link, Node, NodeId, WidgetValues, WorkflowDocument};
use crate::graph::variables::{
    SET_NODE_TYPE, SET_TITLE_PREFIX, title_alias_name,
};
use crate::graph::{AliasResolution, BackwardOverlay, GraphIndex};
use ahash::{AHashMap, AHashSet};
use serde_json::{Value, json};

/// Cap on exhaustively enumerated root-to-exit paths per exit point.
/// Backward DFS is exponential on richly connected graphs; tracing stops
/// recording once this many paths exist for one exit.
const MAX_TRACED_PATHS: usize = 4096;

/// The representative data path ending at one exit point: the longest
/// root-to-exit path, with the data type carried into each node.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub exit_id: NodeId,
    pub exit_type: String,
    /// `(node_id, dtype)` from root to exit; the exit entry carries `""`.
    pub path: Vec<(NodeId, String)>,
    pub category: &'static str,
}

/// A downstream consumer of a variable, reached through one of its get nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableConsumer {
    pub node_id: NodeId,
    pub node_type: String,
    pub input_slot: usize,
    pub dtype: String,
}

/// One named variable binding: the set node, whatever feeds it, and all
/// resolved get nodes with their consumers.
#[derive(Debug, Clone)]
pub struct VariableBinding {
    pub name: String,
    pub set_id: NodeId,
    pub source_id: Option<NodeId>,
    pub source_type: Option<String>,
    pub get_ids: Vec<NodeId>,
    pub consumers: Vec<VariableConsumer>,
}

/// Reverse lookup entry: which variable a get node resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRef {
    pub name: String,
    pub source_id: Option<NodeId>,
    pub source_type: Option<String>,
}

/// Where a loop's iteration count comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationCount {
    /// The count input traces directly to a numeric literal node.
    Constant(i64),
    /// The count is produced dynamically by this node.
    Dynamic { node_id: NodeId, node_type: String },
}

/// A matched loop-start/loop-end pair.
#[derive(Debug, Clone)]
pub struct LoopInfo {
    pub start_id: NodeId,
    pub start_type: String,
    pub name: String,
    pub end_id: NodeId,
    pub end_type: String,
    pub iterations: Option<IterationCount>,
}

/// A label node grouping a region of the canvas.
#[derive(Debug, Clone)]
pub struct Section {
    pub title: String,
    pub pos: Value,
}

/// The full structural analysis of one document snapshot.
#[derive(Debug)]
pub struct WorkflowAnalysis {
    /// Nodes with no effective incoming connections, ascending id.
    pub entry_points: Vec<NodeId>,
    /// Nodes with no effective outgoing connections, ascending id.
    pub exit_points: Vec<NodeId>,
    pub primary_inputs: Vec<NodeId>,
    pub model_loaders: Vec<NodeId>,
    pub primary_outputs: Vec<NodeId>,
    pub workflow_type: &'static str,
    pub pipelines: Vec<Pipeline>,
    pub variables: Vec<VariableBinding>,
    /// get node id -> the variable it resolves to
    pub var_lookup: AHashMap<NodeId, VariableRef>,
    pub loops: Vec<LoopInfo>,
    /// label node id -> section
    pub sections: AHashMap<NodeId, Section>,
}

/// Basic document statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowInfo {
    pub node_count: usize,
    pub link_count: usize,
    pub last_node_id: NodeId,
    pub last_link_id: NodeId,
    pub type_counts: AHashMap<String, usize>,
}

pub fn workflow_info(doc: &WorkflowDocument) -> WorkflowInfo {
    let mut type_counts: AHashMap<String, usize> = AHashMap::new();
    for node in &doc.nodes {
        *type_counts.entry(node.ntype.clone()).or_default() += 1;
    }
    WorkflowInfo {
        node_count: doc.nodes.len(),
        link_count: doc.links.len(),
        last_node_id: doc.last_node_id,
        last_link_id: doc.last_link_id,
        type_counts,
    }
}

/// Analyze the document structure. Pure: the document is not modified and
/// no state is carried across calls.
pub fn analyze_workflow(doc: &WorkflowDocument) -> WorkflowAnalysis {
    let index = GraphIndex::build(doc);
    let aliases = AliasResolution::resolve(doc);
    let backward = BackwardOverlay::build(doc, &aliases);

    let entry_points = collect_entry_points(doc, &aliases);
    let exit_points = collect_exit_points(doc, &aliases);

    let (primary_inputs, model_loaders) = roles::categorize_entry_points(&entry_points, &index);
    let primary_outputs = roles::categorize_exit_points(&exit_points, &index);
    let workflow_type = roles::detect_workflow_type(doc);

    let pipelines = trace_pipelines(&exit_points, &index, &backward);
    let variables = collect_variables(doc, &index, &aliases, &backward);
    let loops = detect_loops(doc, &index);
    let sections = collect_sections(doc);

    let mut var_lookup = AHashMap::new();
    for var in &variables {
        for &get_id in &var.get_ids {
            var_lookup.insert(
                get_id,
                VariableRef {
                    name: var.name.clone(),
                    source_id: var.source_id,
                    source_type: var.source_type.clone(),
                },
            );
        }
    }

    WorkflowAnalysis {
        entry_points,
        exit_points,
        primary_inputs,
        model_loaders,
        primary_outputs,
        workflow_type,
        pipelines,
        variables,
        var_lookup,
        loops,
        sections,
    }
}

/// Nodes with no input slots or all inputs unconnected. Cosmetic nodes and
/// get nodes with a resolved variable source are excluded.
fn collect_entry_points(doc: &WorkflowDocument, aliases: &AliasResolution) -> Vec<NodeId> {
    let mut entry_points: Vec<NodeId> = doc
        .nodes
        .iter()
        .filter(|node| !roles::is_cosmetic(node))
        .filter(|node| !aliases.get_to_set.contains_key(&node.id))
        .filter(|node| node.inputs.iter().all(|inp| inp.link.is_none()))
        .map(|node| node.id)
        .collect();
    entry_points.sort_unstable();
    entry_points
}

/// Nodes with no output slots or all outputs unconnected. Cosmetic nodes
/// are excluded, as are set nodes whose variable has at least one get
/// consumer (the variable is their outgoing connection).
fn collect_exit_points(doc: &WorkflowDocument, aliases: &AliasResolution) -> Vec<NodeId> {
    let mut exit_points = Vec::new();
    for node in &doc.nodes {
        if roles::is_cosmetic(node) {
            continue;
        }

        if node.ntype == SET_NODE_TYPE
            && let Some(name) = title_alias_name(node, SET_TITLE_PREFIX)
            && let Some(&set_id) = aliases.set_by_name.get(&name)
            && aliases.has_consumer(set_id)
        {
            continue;
        }

        if node.outputs.iter().all(|out| out.link_ids().is_empty()) {
            exit_points.push(node.id);
        }
    }
    exit_points.sort_unstable();
    exit_points
}

/// Exhaustive backward DFS from each exit point, keeping the longest
/// root-to-exit path (ties: first found) as that exit's pipeline.
fn trace_pipelines(
    exit_points: &[NodeId],
    index: &GraphIndex<'_>,
    backward: &BackwardOverlay,
) -> Vec<Pipeline> {
    let mut pipelines = Vec::new();
    for &exit_id in exit_points {
        let Some(exit_node) = index.node(exit_id) else {
            continue;
        };

        let mut paths = Vec::new();
        let mut stack = Vec::new();
        let mut on_path = AHashSet::new();
        trace_paths(exit_id, String::new(), index, backward, &mut stack, &mut on_path, &mut paths);

        let main_path = paths
            .iter()
            .fold(None::<&Vec<(NodeId, String)>>, |best, path| match best {
                Some(best) if best.len() >= path.len() => Some(best),
                _ => Some(path),
            });
        let Some(main_path) = main_path else { continue };

        if main_path.len() >= 2 {
            let dtypes: Vec<&str> = main_path
                .iter()
                .map(|(_, dtype)| dtype.as_str())
                .filter(|dtype| !dtype.is_empty())
                .collect();
            pipelines.push(Pipeline {
                exit_id,
                exit_type: exit_node.ntype.clone(),
                path: main_path.clone(),
                category: categorize_pipeline(&dtypes),
            });
        }
    }
    pipelines
}

/// Depth-first path enumeration over the backward overlay. A revisit guard
/// per branch keeps cyclic feedback from recursing forever, and recording
/// stops once `MAX_TRACED_PATHS` paths exist.
fn trace_paths(
    node_id: NodeId,
    dtype: String,
    index: &GraphIndex<'_>,
    backward: &BackwardOverlay,
    stack: &mut Vec<(NodeId, String)>,
    on_path: &mut AHashSet<NodeId>,
    paths: &mut Vec<Vec<(NodeId, String)>>,
) {
    if paths.len() >= MAX_TRACED_PATHS || index.node(node_id).is_none() {
        return;
    }

    stack.push((node_id, dtype));
    on_path.insert(node_id);

    let upstream = backward.upstream(node_id);
    let mut expanded = false;
    for edge in upstream {
        if on_path.contains(&edge.src_id) {
            continue;
        }
        expanded = true;
        trace_paths(edge.src_id, edge.dtype.clone(), index, backward, stack, on_path, paths);
    }

    if !expanded {
        // Root reached (or every upstream edge loops back onto this branch).
        let mut path = stack.clone();
        path.reverse();
        paths.push(path);
    }

    on_path.remove(&node_id);
    stack.pop();
}

/// Build the variable bindings in document order, winners only when set
/// titles collide.
fn collect_variables(
    doc: &WorkflowDocument,
    index: &GraphIndex<'_>,
    aliases: &AliasResolution,
    backward: &BackwardOverlay,
) -> Vec<VariableBinding> {
    let mut variables = Vec::new();
    for node in &doc.nodes {
        if node.ntype != SET_NODE_TYPE {
            continue;
        }
        let Some(name) = title_alias_name(node, SET_TITLE_PREFIX) else {
            continue;
        };
        if aliases.set_by_name.get(&name) != Some(&node.id) {
            continue;
        }
        let set_id = node.id;

        let source_id = backward.upstream(set_id).first().map(|edge| edge.src_id);
        let source_type = source_id
            .and_then(|id| index.node(id))
            .map(|n| n.ntype.clone());

        let get_ids: Vec<NodeId> = doc
            .nodes
            .iter()
            .filter(|n| aliases.get_to_set.get(&n.id) == Some(&set_id))
            .map(|n| n.id)
            .collect();

        let mut consumers = Vec::new();
        for &get_id in &get_ids {
            for link in &doc.links {
                if link.src_id() == get_id
                    && let Some(consumer) = index.node(link.dst_id())
                {
                    consumers.push(VariableConsumer {
                        node_id: link.dst_id(),
                        node_type: consumer.ntype.clone(),
                        input_slot: link.dst_slot(),
                        dtype: link.dtype().to_string(),
                    });
                }
            }
        }

        variables.push(VariableBinding {
            name,
            set_id,
            source_id,
            source_type,
            get_ids,
            consumers,
        });
    }
    variables
}

/// Pair loop-start nodes with their loop-end nodes by following each end
/// node's input link backward; a start already closed by an earlier end is
/// skipped. Iteration counts are read off numeric literal feeders.
fn detect_loops(doc: &WorkflowDocument, index: &GraphIndex<'_>) -> Vec<LoopInfo> {
    struct Draft {
        start_type: String,
        name: String,
        iterations: Option<IterationCount>,
        closed: bool,
    }

    let mut drafts: AHashMap<NodeId, Draft> = AHashMap::new();
    for node in &doc.nodes {
        let ntype = node.ntype.to_lowercase();
        if !(ntype.contains("loopstart") || ntype.contains("forstart") || ntype.contains("whilestart")) {
            continue;
        }
        let name = node.title.clone().unwrap_or_else(|| node.ntype.clone());
        drafts.insert(
            node.id,
            Draft {
                start_type: node.ntype.clone(),
                name,
                iterations: loop_iteration_count(node, index),
                closed: false,
            },
        );
    }

    let mut loops = Vec::new();
    for node in &doc.nodes {
        let ntype = node.ntype.to_lowercase();
        if !(ntype.contains("loopend") || ntype.contains("forend") || ntype.contains("whileend")) {
            continue;
        }
        for input in &node.inputs {
            let Some(link) = input.link.and_then(|id| index.link(id)) else {
                continue;
            };
            let start_id = link.src_id();
            if let Some(draft) = drafts.get_mut(&start_id)
                && !draft.closed
            {
                draft.closed = true;
                loops.push(LoopInfo {
                    start_id,
                    start_type: draft.start_type.clone(),
                    name: draft.name.clone(),
                    end_id: node.id,
                    end_type: node.ntype.clone(),
                    iterations: draft.iterations.clone(),
                });
                break;
            }
        }
    }
    loops
}

/// Resolve the iteration count of a loop-start node from its first
/// count-like input (name containing total/iteration/count).
fn loop_iteration_count(node: &Node, index: &GraphIndex<'_>) -> Option<IterationCount> {
    for input in &node.inputs {
        let input_name = input.name.to_lowercase();
        if !(input_name.contains("total")
            || input_name.contains("iteration")
            || input_name.contains("count"))
        {
            continue;
        }

        let link: &Link = input.link.and_then(|id| index.link(id))?;
        let src = index.node(link.src_id())?;
        let src_type = src.ntype.to_lowercase();

        if src_type.contains("constant") || src_type.contains("primitive") {
            if let Some(WidgetValues::Ordered(values)) = &src.widgets_values
                && let Some(count) = values.first().and_then(Value::as_f64)
            {
                return Some(IterationCount::Constant(count as i64));
            }
            return None;
        }
        return Some(IterationCount::Dynamic {
            node_id: src.id,
            node_type: src.ntype.clone(),
        });
    }
    None
}

/// Group the canvas by label nodes: any label-kind node with a usable
/// title (explicit title or first widget value, more than two characters).
fn collect_sections(doc: &WorkflowDocument) -> AHashMap<NodeId, Section> {
    let mut sections = AHashMap::new();
    for node in &doc.nodes {
        if !node.ntype.to_lowercase().contains("label") {
            continue;
        }
        let title = node.title.clone().or_else(|| {
            node.widgets_values
                .as_ref()
                .and_then(WidgetValues::first)
                .and_then(Value::as_str)
                .map(str::to_string)
        });
        if let Some(title) = title
            && title.len() > 2
        {
            sections.insert(
                node.id,
                Section {
                    title,
                    pos: node.pos.clone().unwrap_or_else(|| json!([0, 0])),
                },
            );
        }
    }
    sections
}
