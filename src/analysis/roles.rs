//! Keyword heuristics for classifying nodes, entry/exit points, and
//! pipelines. Every heuristic is an explicit ordered rule table so the
//! priority order stays auditable; first match wins throughout.

use crate::document::{Node, NodeId, WorkflowDocument};
use crate::graph::GraphIndex;
use ahash::AHashSet;

/// Node kinds that are purely cosmetic and excluded from structural
/// analysis (entry/exit detection).
pub const VISUAL_TYPES: &[&str] = &["Note", "MarkdownNote", "Label (rgthree)", "PrimitiveNode"];

/// True for annotation-only nodes: known visual types plus anything with
/// "label" in the type tag.
pub fn is_cosmetic(node: &Node) -> bool {
    VISUAL_TYPES.contains(&node.ntype.as_str()) || node.ntype.to_lowercase().contains("label")
}

/// Entry points whose type matches these are primary media inputs.
pub const PRIMARY_INPUT_KEYWORDS: &[&str] = &["loadvideo", "loadimage", "vhs_load"];
/// Entry points whose type matches these are model/weight loaders.
pub const MODEL_LOADER_KEYWORDS: &[&str] = &["loader", "load", "model", "vae", "lora"];
/// Exit points whose type matches these are primary outputs.
pub const PRIMARY_OUTPUT_KEYWORDS: &[&str] = &["save", "combine", "output"];

fn matches_any(ntype: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| ntype.contains(k))
}

/// Split entry points into primary media inputs and model loaders.
/// The primary-input vocabulary has priority over the loader vocabulary.
pub fn categorize_entry_points(
    entry_points: &[NodeId],
    index: &GraphIndex<'_>,
) -> (Vec<NodeId>, Vec<NodeId>) {
    let mut primary_inputs = Vec::new();
    let mut model_loaders = Vec::new();

    for &node_id in entry_points {
        let ntype = index
            .node(node_id)
            .map(|n| n.ntype.to_lowercase())
            .unwrap_or_default();
        if matches_any(&ntype, PRIMARY_INPUT_KEYWORDS) {
            primary_inputs.push(node_id);
        } else if matches_any(&ntype, MODEL_LOADER_KEYWORDS) {
            model_loaders.push(node_id);
        }
    }

    (primary_inputs, model_loaders)
}

/// Filter exit points down to primary outputs (save/combine/output kinds).
pub fn categorize_exit_points(exit_points: &[NodeId], index: &GraphIndex<'_>) -> Vec<NodeId> {
    exit_points
        .iter()
        .copied()
        .filter(|&node_id| {
            let ntype = index
                .node(node_id)
                .map(|n| n.ntype.to_lowercase())
                .unwrap_or_default();
            matches_any(&ntype, PRIMARY_OUTPUT_KEYWORDS)
        })
        .collect()
}

/// Detect the broad workflow kind from the type vocabulary of all nodes.
pub fn detect_workflow_type(doc: &WorkflowDocument) -> &'static str {
    let video = doc.nodes.iter().any(|n| {
        let ntype = n.ntype.to_lowercase();
        ntype.contains("video") || ntype.contains("vhs")
    });
    if video { "Video" } else { "General" }
}

/// Pipeline categories by carried data type, highest priority first.
/// "VACE" matches by substring; the rest by exact type membership.
const PIPELINE_CATEGORIES: &[(&str, &str)] = &[
    ("LATENT", "Latent"),
    ("IMAGE", "Image"),
    ("VIDEO", "Video"),
];

/// Categorize a pipeline from the set of link data types observed along it.
pub fn categorize_pipeline<S: AsRef<str>>(dtypes: &[S]) -> &'static str {
    let dtype_set: AHashSet<String> = dtypes
        .iter()
        .map(|d| d.as_ref().to_uppercase())
        .filter(|d| !d.is_empty())
        .collect();

    if dtype_set.iter().any(|d| d.contains("VACE")) {
        return "VACE";
    }
    for (dtype, category) in PIPELINE_CATEGORIES {
        if dtype_set.contains(*dtype) {
            return category;
        }
    }
    "Mixed"
}

/// One keyword rule for functional-role classification: the type tag must
/// contain every entry of `all` and, when `any` is non-empty, at least one
/// of `any`.
struct RoleRule {
    all: &'static [&'static str],
    any: &'static [&'static str],
    role: &'static str,
}

const ROLE_RULES: &[RoleRule] = &[
    RoleRule { all: &["load"], any: &["video", "image"], role: "INPUT" },
    RoleRule { all: &[], any: &["save", "combine", "output"], role: "OUTPUT" },
    RoleRule { all: &[], any: &["upscale", "resize"], role: "UPSCALING" },
    RoleRule { all: &[], any: &["sharpen", "blur", "enhance"], role: "ENHANCEMENT" },
    RoleRule { all: &["encode"], any: &[], role: "ENCODING" },
    RoleRule { all: &["decode"], any: &[], role: "DECODING" },
    RoleRule { all: &[], any: &["sampler", "sample"], role: "SAMPLING" },
    RoleRule { all: &[], any: &["math", "expression", "calc"], role: "MATH/LOGIC" },
    RoleRule { all: &[], any: &["switch", "select", "mux"], role: "ROUTING" },
    RoleRule { all: &[], any: &["getnode", "setnode"], role: "VARIABLES" },
    RoleRule { all: &["loop"], any: &[], role: "CONTROL_FLOW" },
    RoleRule { all: &[], any: &["context", "options", "config"], role: "CONFIGURATION" },
    RoleRule { all: &["get", "size"], any: &[], role: "DATA_HANDLING" },
    RoleRule { all: &[], any: &["loader", "load"], role: "MODEL_LOADING" },
];

/// Classify a node's functional role within a subgraph.
///
/// Type-tag keywords are tried first; when none match, the data types of
/// the node's in-subgraph connections decide; the generic "PROCESSING"
/// tag is the final fallback.
pub fn node_role(
    node_id: NodeId,
    index: &GraphIndex<'_>,
    subgraph_nodes: &AHashSet<NodeId>,
) -> &'static str {
    let ntype = index
        .node(node_id)
        .map(|n| n.ntype.to_lowercase())
        .unwrap_or_default();

    for rule in ROLE_RULES {
        let all_hit = rule.all.iter().all(|k| ntype.contains(k));
        let any_hit = rule.any.is_empty() || rule.any.iter().any(|k| ntype.contains(k));
        if all_hit && any_hit {
            return rule.role;
        }
    }

    let out_types: AHashSet<String> = index
        .successors(node_id)
        .iter()
        .filter(|(dst, dtype)| subgraph_nodes.contains(dst) && !dtype.is_empty())
        .map(|(_, dtype)| dtype.to_uppercase())
        .collect();
    let in_types: AHashSet<String> = index
        .predecessors(node_id)
        .iter()
        .filter(|(src, dtype)| subgraph_nodes.contains(src) && !dtype.is_empty())
        .map(|(_, dtype)| dtype.to_uppercase())
        .collect();

    if out_types.contains("LATENT") || in_types.contains("LATENT") {
        return "LATENT_PROCESSING";
    }
    if out_types.contains("IMAGE") && in_types.contains("IMAGE") {
        return "IMAGE_PROCESSING";
    }
    if out_types.contains("MODEL") || out_types.contains("VAE") || out_types.contains("CLIP") {
        return "MODEL_LOADING";
    }

    "PROCESSING"
}
