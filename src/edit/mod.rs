//! Mutation primitives: node copy, wiring, disconnection, creation, and
//! widget value updates. Cascading deletion and alias inlining live in
//! their own modules.
//!
//! Every operation mutates the document in place and restores the link
//! consistency invariant before returning: a link present in the link
//! collection is referenced by both of its endpoints, and no slot
//! references a link the collection does not contain. Graph indices built
//! before a mutation are invalid afterwards and must be rebuilt.

mod delete;
mod inline;

pub use delete::{DeleteReport, LostOutput, OrphanedInput, delete_nodes};
pub use inline::{AliasPair, InlineReport, PlannedLink, inline_variables};

use crate::document::{Link, LinkId, Node, NodeId, WidgetValues, WorkflowDocument};
use crate::error::EditError;
use crate::graph::{SlotDirection, SlotSpec, resolve_slot};
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;
use std::fmt;

/// Addresses one entry of a widget payload: by index for ordered payloads,
/// by key for named payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetKey {
    Index(usize),
    Name(String),
}

impl From<usize> for WidgetKey {
    fn from(index: usize) -> Self {
        WidgetKey::Index(index)
    }
}

impl From<&str> for WidgetKey {
    fn from(key: &str) -> Self {
        match key.parse::<usize>() {
            Ok(index) => WidgetKey::Index(index),
            Err(_) => WidgetKey::Name(key.to_string()),
        }
    }
}

impl fmt::Display for WidgetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetKey::Index(index) => write!(f, "{}", index),
            WidgetKey::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Parse a textual value into a JSON scalar: booleans, null, integers,
/// floats, then quoted or bare strings.
pub fn parse_value(text: &str) -> Value {
    let lower = text.to_lowercase();
    if lower == "true" {
        return Value::Bool(true);
    }
    if lower == "false" {
        return Value::Bool(false);
    }
    if lower == "none" || lower == "null" {
        return Value::Null;
    }

    if text.contains('.') {
        if let Ok(number) = text.parse::<f64>() {
            return json!(number);
        }
    } else if let Ok(number) = text.parse::<i64>() {
        return json!(number);
    }

    let trimmed = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')));
    Value::String(trimmed.unwrap_or(text).to_string())
}

/// Apply addressed values to a widget payload.
///
/// Addressing-mode mismatches (a name on an ordered payload, a numeric key
/// absent from a named payload) produce warnings, never failures.
fn apply_widget_values(
    widgets: &mut WidgetValues,
    values: &[(WidgetKey, Value)],
) -> (Vec<(WidgetKey, Value)>, Vec<String>) {
    let mut applied = Vec::new();
    let mut warnings = Vec::new();

    for (key, value) in values {
        match widgets {
            WidgetValues::Ordered(entries) => match key {
                WidgetKey::Index(index) => {
                    while entries.len() <= *index {
                        entries.push(Value::Null);
                    }
                    entries[*index] = value.clone();
                    applied.push((key.clone(), value.clone()));
                }
                WidgetKey::Name(name) => {
                    warnings.push(format!(
                        "Cannot use key '{}' on list-style widgets (use numeric index)",
                        name
                    ));
                }
            },
            WidgetValues::Named(entries) => {
                let key_text = key.to_string();
                if matches!(key, WidgetKey::Index(_)) && !entries.contains_key(&key_text) {
                    warnings.push(format!(
                        "Numeric key '{}' on dict-style widget - use key name (e.g., 'indexes')",
                        key_text
                    ));
                }
                entries.insert(key_text, value.clone());
                applied.push((key.clone(), value.clone()));
            }
        }
    }

    (applied, warnings)
}

/// Result of [`copy_node`].
#[derive(Debug, Clone)]
pub struct CopyResult {
    pub new_id: NodeId,
    pub template_type: String,
    pub warnings: Vec<String>,
}

/// Duplicate a node as an unconnected template.
///
/// The copy gets a freshly minted id, cleared slot connections, an offset
/// position, and optionally a title and widget value overrides. Mismatched
/// widget addressing is reported as warnings; the copy is appended anyway.
pub fn copy_node(
    doc: &mut WorkflowDocument,
    node_id: NodeId,
    title: Option<&str>,
    set_values: &[(WidgetKey, Value)],
) -> Result<CopyResult, EditError> {
    let template = doc.node(node_id).ok_or(EditError::NodeNotFound(node_id))?;
    let template_type = template.ntype.clone();
    let mut new_node = template.clone();

    new_node.id = doc.mint_node_id();

    for input in &mut new_node.inputs {
        input.link = None;
    }
    for output in &mut new_node.outputs {
        output.links = Some(Vec::new());
    }

    new_node.pos = Some(offset_position(new_node.pos.as_ref()));

    if let Some(title) = title {
        new_node.title = Some(title.to_string());
    }

    let mut warnings = Vec::new();
    if !set_values.is_empty() {
        let mut widgets = new_node
            .widgets_values
            .take()
            .unwrap_or(WidgetValues::Ordered(Vec::new()));
        let (_, value_warnings) = apply_widget_values(&mut widgets, set_values);
        warnings = value_warnings;
        new_node.widgets_values = Some(widgets);
    }

    let new_id = new_node.id;
    doc.nodes.push(new_node);

    Ok(CopyResult {
        new_id,
        template_type,
        warnings,
    })
}

/// Shift a position 50 units right and down, handling both the list and
/// the keyed-object form editors persist.
fn offset_position(pos: Option<&Value>) -> Value {
    match pos {
        Some(Value::Object(map)) => {
            let x = map.get("0").and_then(Value::as_f64).unwrap_or(0.0);
            let y = map.get("1").and_then(Value::as_f64).unwrap_or(0.0);
            json!({"0": x + 50.0, "1": y + 50.0})
        }
        Some(Value::Array(values)) => {
            let x = values.first().and_then(Value::as_f64).unwrap_or(0.0);
            let y = values.get(1).and_then(Value::as_f64).unwrap_or(0.0);
            json!([x + 50.0, y + 50.0])
        }
        _ => json!([50.0, 50.0]),
    }
}

/// Result of [`wire_nodes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResult {
    pub link_id: LinkId,
    pub dtype: String,
    /// Id of the link that previously occupied the destination input, if any.
    pub replaced_link: Option<LinkId>,
    pub src_slot: usize,
    pub dst_slot: usize,
}

/// Connect a source output slot to a destination input slot.
///
/// An existing link on the destination input is removed first (inputs are
/// single-valued) and reported as `replaced_link`. The connection's carried
/// type comes from the source output slot's declared type.
pub fn wire_nodes(
    doc: &mut WorkflowDocument,
    src_id: NodeId,
    src_slot: impl Into<SlotSpec>,
    dst_id: NodeId,
    dst_slot: impl Into<SlotSpec>,
) -> Result<WireResult, EditError> {
    let src_pos = node_position(doc, src_id)?;
    let dst_pos = node_position(doc, dst_id)?;

    let src_slot_idx = resolve_slot(&doc.nodes[src_pos], &src_slot.into(), SlotDirection::Output)
        .map_err(|source| EditError::SourceSlot {
            node_id: src_id,
            source,
        })?;
    let dst_slot_idx = resolve_slot(&doc.nodes[dst_pos], &dst_slot.into(), SlotDirection::Input)
        .map_err(|source| EditError::DestinationSlot {
            node_id: dst_id,
            source,
        })?;

    let declared = &doc.nodes[src_pos].outputs[src_slot_idx].dtype;
    let dtype = if declared.is_empty() {
        "*".to_string()
    } else {
        declared.clone()
    };

    let replaced_link = doc.nodes[dst_pos].inputs[dst_slot_idx].link;
    if let Some(old_id) = replaced_link {
        doc.links.retain(|l| l.id() != old_id);
        for node in &mut doc.nodes {
            for output in &mut node.outputs {
                if let Some(links) = &mut output.links {
                    links.retain(|&id| id != old_id);
                }
            }
        }
    }

    let link_id = doc.mint_link_id();
    doc.links.push(Link::new(
        link_id,
        src_id,
        src_slot_idx,
        dst_id,
        dst_slot_idx,
        dtype.clone(),
    ));

    doc.nodes[dst_pos].inputs[dst_slot_idx].link = Some(link_id);
    doc.nodes[src_pos].outputs[src_slot_idx]
        .links
        .get_or_insert_with(Vec::new)
        .push(link_id);

    Ok(WireResult {
        link_id,
        dtype,
        replaced_link,
        src_slot: src_slot_idx,
        dst_slot: dst_slot_idx,
    })
}

/// Result of [`disconnect_node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectResult {
    pub removed_links: BTreeSet<LinkId>,
}

/// Remove every link touching a node, clearing references on all other
/// nodes that pointed at those links.
pub fn disconnect_node(
    doc: &mut WorkflowDocument,
    node_id: NodeId,
) -> Result<DisconnectResult, EditError> {
    node_position(doc, node_id)?;

    let removed_links: BTreeSet<LinkId> = doc
        .links
        .iter()
        .filter(|l| l.touches(node_id))
        .map(|l| l.id())
        .collect();

    doc.links.retain(|l| !removed_links.contains(&l.id()));
    clear_link_references(doc, &removed_links);

    Ok(DisconnectResult { removed_links })
}

/// Result of [`set_widget_values`].
#[derive(Debug, Clone)]
pub struct SetValuesResult {
    pub set_values: Vec<(WidgetKey, Value)>,
    pub warnings: Vec<String>,
}

/// Set widget payload entries on a node, addressed by index or name.
pub fn set_widget_values(
    doc: &mut WorkflowDocument,
    node_id: NodeId,
    values: &[(WidgetKey, Value)],
) -> Result<SetValuesResult, EditError> {
    let node = doc
        .node_mut(node_id)
        .ok_or(EditError::NodeNotFound(node_id))?;

    let mut widgets = node
        .widgets_values
        .take()
        .unwrap_or(WidgetValues::Ordered(Vec::new()));
    let (set_values, warnings) = apply_widget_values(&mut widgets, values);
    node.widgets_values = Some(widgets);

    Ok(SetValuesResult {
        set_values,
        warnings,
    })
}

/// A named, typed slot declaration used to scaffold created nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDecl {
    pub name: String,
    pub dtype: String,
}

impl SlotDecl {
    pub fn new(name: impl Into<String>, dtype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dtype: dtype.into(),
        }
    }
}

/// Result of [`create_node`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateResult {
    pub new_id: NodeId,
}

/// Append a new node of the given type with empty connections, optionally
/// scaffolded with input and output slot declarations.
pub fn create_node(
    doc: &mut WorkflowDocument,
    node_type: &str,
    title: Option<&str>,
    inputs: &[SlotDecl],
    outputs: &[SlotDecl],
) -> CreateResult {
    let new_id = doc.mint_node_id();

    let mut extra = Map::new();
    extra.insert("size".to_string(), json!([200, 100]));
    extra.insert("flags".to_string(), json!({}));
    extra.insert("order".to_string(), json!(doc.nodes.len()));
    extra.insert("mode".to_string(), json!(0));
    extra.insert("properties".to_string(), json!({}));

    let mut node = Node {
        id: new_id,
        ntype: node_type.to_string(),
        title: title.map(str::to_string),
        pos: Some(json!([100, 100])),
        inputs: Vec::new(),
        outputs: Vec::new(),
        widgets_values: Some(WidgetValues::Ordered(Vec::new())),
        extra,
    };

    for decl in inputs {
        node.inputs.push(crate::document::InputSlot {
            name: decl.name.clone(),
            dtype: decl.dtype.clone(),
            link: None,
            extra: Map::new(),
        });
    }
    for (i, decl) in outputs.iter().enumerate() {
        let mut extra = Map::new();
        extra.insert("slot_index".to_string(), json!(i));
        node.outputs.push(crate::document::OutputSlot {
            name: decl.name.clone(),
            dtype: decl.dtype.clone(),
            links: Some(Vec::new()),
            extra,
        });
    }

    doc.nodes.push(node);
    CreateResult { new_id }
}

pub(crate) fn node_position(doc: &WorkflowDocument, node_id: NodeId) -> Result<usize, EditError> {
    doc.nodes
        .iter()
        .position(|n| n.id == node_id)
        .ok_or(EditError::NodeNotFound(node_id))
}

/// Null out every slot reference to the given link ids on all nodes.
pub(crate) fn clear_link_references(doc: &mut WorkflowDocument, removed: &BTreeSet<LinkId>) {
    for node in &mut doc.nodes {
        for input in &mut node.inputs {
            if input.link.is_some_and(|id| removed.contains(&id)) {
                input.link = None;
            }
        }
        for output in &mut node.outputs {
            if let Some(links) = &mut output.links {
                links.retain(|id| !removed.contains(id));
            }
        }
    }
}
