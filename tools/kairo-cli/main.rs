use clap::{Parser, Subcommand};
use kairo::analysis::node_role;
use kairo::document::io;
use kairo::prelude::*;
use std::path::PathBuf;

/// A workflow graph analysis and mutation CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the workflow JSON file
    workflow: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show basic workflow statistics
    Info,
    /// Analyze the workflow structure (entries, exits, pipelines, variables, loops)
    Analyze,
    /// Find the shortest path between two nodes
    Path { from: NodeId, to: NodeId },
    /// List everything upstream of a node
    Upstream {
        node: NodeId,
        #[arg(short, long, default_value_t = 999)]
        depth: usize,
        /// Only follow inputs whose name contains this substring
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// List everything downstream of a node
    Downstream {
        node: NodeId,
        #[arg(short, long, default_value_t = 999)]
        depth: usize,
        /// Only follow outputs whose name contains this substring
        #[arg(short, long)]
        filter: Option<String>,
    },
    /// Extract the subgraph between two nodes, topologically ordered
    Subgraph { start: NodeId, end: NodeId },
    /// List nodes whose type contains a pattern (case-insensitive)
    Find { pattern: String },
    /// List unconnected inputs and outputs
    Unconnected {
        /// Only check each node's first input slot
        #[arg(long)]
        primary_only: bool,
    },
    /// Delete nodes (and every link touching them)
    Delete {
        ids: Vec<NodeId>,
        #[arg(long)]
        dry_run: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Copy a node as an unconnected template
    Copy {
        id: NodeId,
        #[arg(short, long)]
        title: Option<String>,
        /// Widget overrides as key=value pairs
        #[arg(short, long)]
        set: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Wire a source output slot to a destination input slot
    Wire {
        src: NodeId,
        src_slot: String,
        dst: NodeId,
        dst_slot: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Set widget values on a node (key=value pairs)
    Set {
        id: NodeId,
        values: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove all connections to and from a node
    Disconnect {
        id: NodeId,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Create a new node, optionally scaffolding slots as name:TYPE pairs
    Create {
        node_type: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        input: Vec<String>,
        #[arg(short = 'O', long)]
        out: Vec<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace set/get variable pairs with direct connections
    Inline {
        #[arg(long)]
        dry_run: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let mut doc = io::load(&cli.workflow).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to load workflow '{}': {}",
            cli.workflow.display(),
            e
        ))
    });

    match cli.command {
        Command::Info => cmd_info(&doc),
        Command::Analyze => cmd_analyze(&doc),
        Command::Path { from, to } => cmd_path(&doc, from, to),
        Command::Upstream { node, depth, filter } => {
            cmd_closure(find_upstream(&doc, node, depth, filter.as_deref()), "upstream")
        }
        Command::Downstream { node, depth, filter } => cmd_closure(
            find_downstream(&doc, node, depth, filter.as_deref()),
            "downstream",
        ),
        Command::Subgraph { start, end } => cmd_subgraph(&doc, start, end),
        Command::Find { pattern } => cmd_find(&doc, &pattern),
        Command::Unconnected { primary_only } => cmd_unconnected(&doc, primary_only),
        Command::Delete { ids, dry_run, output } => {
            let report = delete_nodes(&mut doc, &ids, dry_run);
            print_delete_report(&report);
            if !dry_run {
                let details = format!(
                    "deleted nodes: {:?}\nremoved links: {:?}",
                    report.deleted_nodes, report.removed_links
                );
                persist(&cli.workflow, output, &doc, "delete", &details);
            }
        }
        Command::Copy { id, title, set, output } => {
            let values = parse_key_values(&set);
            let result = copy_node(&mut doc, id, title.as_deref(), &values)
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            println!(
                "Copied [{}] {} -> new node [{}]",
                id, result.template_type, result.new_id
            );
            print_warnings(&result.warnings);
            let details = format!("copied {} -> {}", id, result.new_id);
            persist(&cli.workflow, output, &doc, "copy", &details);
        }
        Command::Wire { src, src_slot, dst, dst_slot, output } => {
            let result = wire_nodes(&mut doc, src, src_slot.as_str(), dst, dst_slot.as_str())
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            println!(
                "Wired {}:{} -> {}:{} (link {}, type {})",
                src, result.src_slot, dst, result.dst_slot, result.link_id, result.dtype
            );
            if let Some(replaced) = result.replaced_link {
                println!("  Replaced link {}", replaced);
            }
            let details = format!("wired {}:{} -> {}:{}", src, result.src_slot, dst, result.dst_slot);
            persist(&cli.workflow, output, &doc, "wire", &details);
        }
        Command::Set { id, values, output } => {
            let values = parse_key_values(&values);
            let result = set_widget_values(&mut doc, id, &values)
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            for (key, value) in &result.set_values {
                println!("Set [{}] widget {} = {}", id, key, value);
            }
            print_warnings(&result.warnings);
            persist(&cli.workflow, output, &doc, "set", &format!("node {}", id));
        }
        Command::Disconnect { id, output } => {
            let result =
                disconnect_node(&mut doc, id).unwrap_or_else(|e| exit_with_error(&e.to_string()));
            println!(
                "Disconnected [{}]: removed {} links",
                id,
                result.removed_links.len()
            );
            persist(&cli.workflow, output, &doc, "disconnect", &format!("node {}", id));
        }
        Command::Create { node_type, title, input, out, output } => {
            let inputs = parse_slot_decls(&input);
            let outputs = parse_slot_decls(&out);
            let result = create_node(&mut doc, &node_type, title.as_deref(), &inputs, &outputs);
            println!("Created [{}] {}", result.new_id, node_type);
            let details = format!("created {} as {}", node_type, result.new_id);
            persist(&cli.workflow, output, &doc, "create", &details);
        }
        Command::Inline { dry_run, output } => {
            let report = inline_variables(&mut doc, dry_run);
            println!("Found {} variable pair(s)", report.pairs.len());
            for pair in &report.pairs {
                println!(
                    "  '{}': set [{}] with {} get node(s)",
                    pair.name,
                    pair.set_id,
                    pair.get_ids.len()
                );
            }
            println!(
                "  {} node(s) to delete, {} link(s) to create",
                report.nodes_to_delete.len(),
                report.links_to_create.len()
            );
            if !dry_run {
                let details = format!("inlined {} variable pair(s)", report.pairs.len());
                persist(&cli.workflow, output, &doc, "inline", &details);
            }
        }
    }
}

fn cmd_info(doc: &WorkflowDocument) {
    let info = workflow_info(doc);
    println!("Nodes: {}", info.node_count);
    println!("Links: {}", info.link_count);
    println!("Last node id: {}", info.last_node_id);
    println!("Last link id: {}", info.last_link_id);

    let mut counts: Vec<_> = info.type_counts.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    println!("\nNode types:");
    for (ntype, count) in counts {
        println!("  {:4} {}", count, ntype);
    }
}

fn cmd_analyze(doc: &WorkflowDocument) {
    let analysis = analyze_workflow(doc);
    println!("Workflow type: {}", analysis.workflow_type);
    println!("Entry points: {:?}", analysis.entry_points);
    println!("Exit points: {:?}", analysis.exit_points);
    println!("Primary inputs: {:?}", analysis.primary_inputs);
    println!("Model loaders: {:?}", analysis.model_loaders);
    println!("Primary outputs: {:?}", analysis.primary_outputs);

    println!("\nPipelines:");
    for pipeline in &analysis.pipelines {
        let ids: Vec<String> = pipeline.path.iter().map(|(id, _)| id.to_string()).collect();
        println!(
            "  [{}] {} ({}): {}",
            pipeline.exit_id,
            pipeline.exit_type,
            pipeline.category,
            ids.join(" -> ")
        );
    }

    println!("\nVariables:");
    for var in &analysis.variables {
        println!(
            "  '{}': set [{}] source {:?}, gets {:?}",
            var.name, var.set_id, var.source_id, var.get_ids
        );
    }

    println!("\nLoops:");
    for l in &analysis.loops {
        println!(
            "  '{}': [{}] {} .. [{}] {} ({:?})",
            l.name, l.start_id, l.start_type, l.end_id, l.end_type, l.iterations
        );
    }
}

fn cmd_path(doc: &WorkflowDocument, from: NodeId, to: NodeId) {
    match find_path(doc, from, to) {
        Some(path) => {
            let ids: Vec<String> = path.iter().map(|id| id.to_string()).collect();
            println!("{}", ids.join(" -> "));
        }
        None => println!("No path from [{}] to [{}]", from, to),
    }
}

fn cmd_closure(result: std::result::Result<Traversal, GraphError>, direction: &str) {
    let traversal = result.unwrap_or_else(|e| exit_with_error(&e.to_string()));
    println!(
        "{} of [{}]: {} node(s), {} link(s)",
        direction,
        traversal.anchor,
        traversal.nodes.len(),
        traversal.links.len()
    );

    let mut by_depth: Vec<_> = traversal.nodes.iter().collect();
    by_depth.sort_by_key(|(id, depth)| (**depth, **id));
    for (node_id, depth) in by_depth {
        println!("  depth {:2}: [{}]", depth, node_id);
    }

    println!("\nEdges:");
    for edge in &traversal.edges {
        println!(
            "  [{}] {}.{} -> [{}] {}.{} ({})",
            edge.src_id,
            edge.src_type,
            edge.src_slot_name,
            edge.dst_id,
            edge.dst_type,
            edge.dst_slot_name,
            edge.dtype
        );
    }
}

fn cmd_subgraph(doc: &WorkflowDocument, start: NodeId, end: NodeId) {
    let subgraph =
        find_subgraph(doc, start, end).unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let index = GraphIndex::build(doc);
    println!(
        "Subgraph [{}] .. [{}]: {} node(s), {} edge(s)",
        start,
        end,
        subgraph.nodes.len(),
        subgraph.edges.len()
    );
    println!("\nTopological order:");
    for &node_id in &subgraph.sorted {
        let display = index
            .node(node_id)
            .map(|n| n.display_title())
            .unwrap_or_else(|| "?".to_string());
        let role = node_role(node_id, &index, &subgraph.nodes);
        println!("  [{}] {} ({})", node_id, display, role);
    }
}

fn cmd_find(doc: &WorkflowDocument, pattern: &str) {
    let matches = doc.nodes_by_type(pattern);
    println!("{} node(s) matching '{}'", matches.len(), pattern);
    for node in matches {
        println!("  {}", node.display_ref());
    }
}

fn cmd_unconnected(doc: &WorkflowDocument, primary_only: bool) {
    let orphans = find_orphans(doc, primary_only);
    println!("Unconnected inputs: {}", orphans.len());
    for orphan in &orphans {
        let marker = if orphan.broken_link.is_some() {
            " BROKEN LINK"
        } else if orphan.likely_required {
            " (likely required)"
        } else {
            ""
        };
        println!(
            "  [{}] {} input {}:{} ({}){}",
            orphan.node_id,
            orphan.node_type,
            orphan.input_slot,
            orphan.input_name,
            orphan.input_type,
            marker
        );
    }

    let dangling = find_dangling(doc);
    println!("\nDangling outputs: {}", dangling.len());
    for d in &dangling {
        println!(
            "  [{}] {} output {}:{} ({})",
            d.node_id, d.node_type, d.output_slot, d.output_name, d.output_type
        );
    }
}

fn print_delete_report(report: &DeleteReport) {
    println!(
        "Deleting {} node(s), removing {} link(s)",
        report.deleted_nodes.len(),
        report.removed_links.len()
    );
    for orphan in &report.orphaned_inputs {
        println!(
            "  [{}] {} loses input '{}' (was connected to [{}] {})",
            orphan.node_id,
            orphan.node_type,
            orphan.input_name,
            orphan.was_connected_to,
            orphan.was_connected_type
        );
    }
    for lost in &report.lost_outputs {
        println!(
            "  [{}] {} loses output '{}' (was feeding [{}] {})",
            lost.node_id, lost.node_type, lost.output_name, lost.was_connected_to, lost.was_connected_type
        );
    }
    print_warnings(&report.warnings);
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
}

/// Parse `key=value` arguments into widget addressing pairs.
fn parse_key_values(pairs: &[String]) -> Vec<(WidgetKey, serde_json::Value)> {
    pairs
        .iter()
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((WidgetKey::from(key), parse_value(value)))
        })
        .collect()
}

/// Parse `name:TYPE` arguments into slot declarations.
fn parse_slot_decls(specs: &[String]) -> Vec<SlotDecl> {
    specs
        .iter()
        .map(|spec| match spec.split_once(':') {
            Some((name, dtype)) => SlotDecl::new(name, dtype),
            None => SlotDecl::new(spec.as_str(), "*"),
        })
        .collect()
}

/// Save the mutated document (to a fresh versioned path unless an output
/// was given) and append to the changelog.
fn persist(
    input: &PathBuf,
    output: Option<PathBuf>,
    doc: &WorkflowDocument,
    operation: &str,
    details: &str,
) {
    let target = output.unwrap_or_else(|| io::versioned_output(input));
    io::save(doc, &target).unwrap_or_else(|e| {
        exit_with_error(&format!("Failed to save '{}': {}", target.display(), e))
    });
    if let Err(e) = io::append_changelog(input, &target, operation, details) {
        eprintln!("Warning: failed to append changelog: {}", e);
    }
    println!("Saved to '{}'", target.display());
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
