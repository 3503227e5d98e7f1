//! Tests for document mutation: copy, wire, disconnect, delete, widget
//! values, node creation, and variable inlining.
use kairo::prelude::*;
use serde_json::json;

mod common;
use common::*;

/// Every link in the collection must be referenced by both endpoints, and
/// no slot may reference a link the collection does not contain.
fn assert_link_consistency(doc: &WorkflowDocument) {
    for link in &doc.links {
        let src = doc.node(link.src_id()).expect("link source exists");
        assert!(
            src.outputs[link.src_slot()].link_ids().contains(&link.id()),
            "link {} missing from source output",
            link.id()
        );
        let dst = doc.node(link.dst_id()).expect("link destination exists");
        assert_eq!(dst.inputs[link.dst_slot()].link, Some(link.id()));
    }
    for node in &doc.nodes {
        for input in &node.inputs {
            if let Some(link_id) = input.link {
                assert!(doc.link(link_id).is_some(), "stale input ref {}", link_id);
            }
        }
        for output in &node.outputs {
            for link_id in output.link_ids() {
                assert!(doc.link(*link_id).is_some(), "stale output ref {}", link_id);
            }
        }
    }
}

#[test]
fn test_parse_value_scalars() {
    assert_eq!(parse_value("true"), json!(true));
    assert_eq!(parse_value("False"), json!(false));
    assert_eq!(parse_value("none"), json!(null));
    assert_eq!(parse_value("null"), json!(null));
    assert_eq!(parse_value("42"), json!(42));
    assert_eq!(parse_value("-7"), json!(-7));
    assert_eq!(parse_value("3.5"), json!(3.5));
    assert_eq!(parse_value("'quoted'"), json!("quoted"));
    assert_eq!(parse_value("\"quoted\""), json!("quoted"));
    assert_eq!(parse_value("plain text"), json!("plain text"));
}

#[test]
fn test_copy_node_is_unconnected() {
    let mut doc = simple_chain();
    let result = copy_node(&mut doc, 3, Some("Sampler Copy"), &[]).unwrap();

    assert_eq!(result.new_id, 6);
    assert_eq!(result.template_type, "KSampler");
    assert_eq!(doc.last_node_id, 6);
    assert!(result.warnings.is_empty());

    let copy = doc.node(6).unwrap();
    assert_eq!(copy.ntype, "KSampler");
    assert_eq!(copy.title.as_deref(), Some("Sampler Copy"));
    assert!(copy.inputs.iter().all(|i| i.link.is_none()));
    assert!(copy.outputs.iter().all(|o| o.link_ids().is_empty()));

    // The template is untouched.
    assert_eq!(doc.node(3).unwrap().inputs[0].link, Some(2));
    assert_link_consistency(&doc);
}

#[test]
fn test_copy_node_with_widget_overrides() {
    let mut doc = simple_chain();
    let values = vec![(WidgetKey::from(0usize), json!(99))];
    let result = copy_node(&mut doc, 3, None, &values).unwrap();

    let copy = doc.node(result.new_id).unwrap();
    assert_eq!(
        copy.widgets_values.as_ref().unwrap().first(),
        Some(&json!(99))
    );
}

#[test]
fn test_copy_node_warns_but_still_appends() {
    let mut doc = simple_chain();
    let values = vec![(WidgetKey::from("seed"), json!(99))];
    let result = copy_node(&mut doc, 3, None, &values).unwrap();

    // A name key on an ordered payload cannot be applied, but the copy
    // itself still lands in the document.
    assert_eq!(result.warnings.len(), 1);
    assert!(doc.node(result.new_id).is_some());
}

#[test]
fn test_copy_missing_node() {
    let mut doc = simple_chain();
    let err = copy_node(&mut doc, 99, None, &[]).unwrap_err();
    assert!(matches!(err, EditError::NodeNotFound(99)));
}

#[test]
fn test_wire_nodes_replaces_existing_input_link() {
    let mut doc = simple_chain();

    // Rewire the save node to take the sampler's latent directly.
    let result = wire_nodes(&mut doc, 3, 0usize, 5, "images").unwrap();

    assert_eq!(result.link_id, 5);
    assert_eq!(result.dtype, "LATENT");
    assert_eq!(result.replaced_link, Some(4));
    assert_eq!(result.src_slot, 0);
    assert_eq!(result.dst_slot, 0);

    assert!(doc.link(4).is_none());
    assert_eq!(doc.node(5).unwrap().inputs[0].link, Some(5));
    assert!(doc.node(4).unwrap().outputs[0].link_ids().is_empty());
    assert_link_consistency(&doc);
}

#[test]
fn test_wire_nodes_fresh_connection() {
    let mut doc = simple_chain();
    let result = wire_nodes(&mut doc, 1, "IMAGE", 4, "vae").unwrap();

    assert_eq!(result.replaced_link, None);
    assert_eq!(result.dtype, "IMAGE");
    assert_eq!(doc.node(4).unwrap().inputs[1].link, Some(result.link_id));
    assert_link_consistency(&doc);
}

#[test]
fn test_wire_nodes_slot_errors() {
    let mut doc = simple_chain();

    let err = wire_nodes(&mut doc, 1, "nonsense", 5, "images").unwrap_err();
    assert!(matches!(err, EditError::SourceSlot { node_id: 1, .. }));

    let err = wire_nodes(&mut doc, 1, 0usize, 5, "nonsense").unwrap_err();
    assert!(matches!(err, EditError::DestinationSlot { node_id: 5, .. }));
}

#[test]
fn test_disconnect_node() {
    let mut doc = simple_chain();
    let result = disconnect_node(&mut doc, 3).unwrap();

    assert_eq!(result.removed_links.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
    assert!(doc.node(2).unwrap().outputs[0].link_ids().is_empty());
    assert_eq!(doc.node(4).unwrap().inputs[0].link, None);
    assert_eq!(doc.links.len(), 2);
    assert_link_consistency(&doc);
}

#[test]
fn test_delete_nodes_dry_run_reports_impact_without_mutating() {
    let mut doc = simple_chain();
    let report = delete_nodes(&mut doc, &[3], true);

    assert_eq!(report.deleted_nodes.iter().copied().collect::<Vec<_>>(), vec![3]);
    assert_eq!(report.removed_links.iter().copied().collect::<Vec<_>>(), vec![2, 3]);

    assert_eq!(report.orphaned_inputs.len(), 1);
    assert_eq!(report.orphaned_inputs[0].node_id, 4);
    assert_eq!(report.orphaned_inputs[0].input_name, "samples");
    assert_eq!(report.orphaned_inputs[0].was_connected_to, 3);

    assert_eq!(report.lost_outputs.len(), 1);
    assert_eq!(report.lost_outputs[0].node_id, 2);
    assert_eq!(report.lost_outputs[0].was_connected_to, 3);

    // Dry run leaves everything in place.
    assert_eq!(doc.nodes.len(), 5);
    assert_eq!(doc.links.len(), 4);
    assert_link_consistency(&doc);
}

#[test]
fn test_delete_nodes_commits_and_clears_references() {
    let mut doc = simple_chain();
    delete_nodes(&mut doc, &[3], false);

    assert_eq!(doc.nodes.len(), 4);
    assert!(doc.node(3).is_none());
    assert_eq!(doc.links.len(), 2);
    assert!(doc.node(2).unwrap().outputs[0].link_ids().is_empty());
    assert_eq!(doc.node(4).unwrap().inputs[0].link, None);
    assert_link_consistency(&doc);
}

#[test]
fn test_delete_nodes_skips_unknown_ids() {
    let mut doc = simple_chain();
    let report = delete_nodes(&mut doc, &[99], false);

    assert!(report.deleted_nodes.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(doc.nodes.len(), 5);
}

#[test]
fn test_set_widget_values_ordered_pads_with_null() {
    let mut doc = simple_chain();
    let values = vec![(WidgetKey::from(3usize), json!("padded"))];
    let result = set_widget_values(&mut doc, 1, &values).unwrap();

    assert_eq!(result.set_values.len(), 1);
    assert!(result.warnings.is_empty());

    let node = doc.node(1).unwrap();
    match node.widgets_values.as_ref().unwrap() {
        WidgetValues::Ordered(entries) => {
            assert_eq!(entries.len(), 4);
            assert_eq!(entries[1], json!(null));
            assert_eq!(entries[3], json!("padded"));
        }
        WidgetValues::Named(_) => panic!("expected ordered widgets"),
    }
}

#[test]
fn test_set_widget_values_named() {
    let mut doc = simple_chain();
    doc.node_mut(1).unwrap().widgets_values =
        Some(serde_json::from_value(json!({"image": "a.png"})).unwrap());

    let values = vec![
        (WidgetKey::from("image"), json!("b.png")),
        (WidgetKey::from(0usize), json!("ignored-key-style")),
    ];
    let result = set_widget_values(&mut doc, 1, &values).unwrap();

    // The numeric key on a named payload is warned about but still written.
    assert_eq!(result.warnings.len(), 1);
    match doc.node(1).unwrap().widgets_values.as_ref().unwrap() {
        WidgetValues::Named(entries) => {
            assert_eq!(entries.get("image"), Some(&json!("b.png")));
            assert_eq!(entries.get("0"), Some(&json!("ignored-key-style")));
        }
        WidgetValues::Ordered(_) => panic!("expected named widgets"),
    }
}

#[test]
fn test_create_node_scaffolds_slots() {
    let mut doc = simple_chain();
    let inputs = vec![SlotDecl::new("image", "IMAGE")];
    let outputs = vec![SlotDecl::new("upscaled", "IMAGE")];
    let result = create_node(&mut doc, "ImageUpscale", Some("Upscaler"), &inputs, &outputs);

    assert_eq!(result.new_id, 6);
    let node = doc.node(6).unwrap();
    assert_eq!(node.ntype, "ImageUpscale");
    assert_eq!(node.inputs.len(), 1);
    assert_eq!(node.inputs[0].dtype, "IMAGE");
    assert!(node.inputs[0].link.is_none());
    assert_eq!(node.outputs.len(), 1);
    assert!(node.outputs[0].link_ids().is_empty());
    assert!(node.extra.contains_key("properties"));
}

#[test]
fn test_inline_variables_dry_run_plans_without_mutating() {
    let mut doc = variable_workflow();
    let report = inline_variables(&mut doc, true);

    assert_eq!(report.pairs.len(), 1);
    assert_eq!(report.pairs[0].name, "myimage");
    assert_eq!(report.pairs[0].set_id, 2);
    assert_eq!(report.pairs[0].get_ids, vec![3]);
    assert_eq!(
        report.nodes_to_delete.iter().copied().collect::<Vec<_>>(),
        vec![2, 3]
    );
    assert_eq!(
        report.links_to_remove.iter().copied().collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(report.links_to_create.len(), 1);
    assert_eq!(report.links_to_create[0].src_id, 1);
    assert_eq!(report.links_to_create[0].dst_id, 4);
    assert!(report.created_links.is_empty());

    assert_eq!(doc.nodes.len(), 4);
    assert_eq!(doc.links.len(), 2);
}

#[test]
fn test_inline_variables_rewires_consumers_directly() {
    let mut doc = variable_workflow();
    let report = inline_variables(&mut doc, false);

    assert_eq!(report.created_links, vec![3]);
    assert_eq!(doc.nodes.len(), 2);
    assert!(doc.node(2).is_none());
    assert!(doc.node(3).is_none());

    assert_eq!(doc.links.len(), 1);
    let link = &doc.links[0];
    assert_eq!(link.src_id(), 1);
    assert_eq!(link.dst_id(), 4);
    assert_eq!(link.dtype(), "IMAGE");

    assert_eq!(doc.node(4).unwrap().inputs[0].link, Some(3));
    assert!(doc.node(1).unwrap().outputs[0].link_ids().contains(&3));
    assert_link_consistency(&doc);
}

#[test]
fn test_inline_variables_skips_unfed_set_nodes() {
    let mut doc = variable_workflow();
    // Cut the feed into the set node; the pair can no longer be inlined.
    doc.links.retain(|l| l.id() != 1);
    doc.node_mut(2).unwrap().inputs[0].link = None;

    let report = inline_variables(&mut doc, false);
    assert!(report.pairs.is_empty());
    assert_eq!(doc.nodes.len(), 4);
}

#[test]
fn test_inline_variables_removes_passthrough_links() {
    let mut doc = variable_workflow();
    // Wire the set node's passthrough output to a preview so a link other
    // than the variable hop touches a node being deleted.
    doc.nodes.push(
        serde_json::from_value(json!({
            "id": 5,
            "type": "PreviewImage",
            "inputs": [{"name": "images", "type": "IMAGE", "link": 3}],
            "outputs": []
        }))
        .unwrap(),
    );
    doc.node_mut(2).unwrap().outputs[0].links = Some(vec![3]);
    doc.links.push(Link::new(3, 2, 0, 5, 0, "*"));
    doc.last_node_id = 5;
    doc.last_link_id = 3;

    let report = inline_variables(&mut doc, false);

    assert!(report.links_to_remove.contains(&3));
    assert!(doc.node(2).is_none());
    assert!(
        doc.links.iter().all(|l| !l.touches(2) && !l.touches(3)),
        "links referencing deleted nodes survived"
    );
    assert_eq!(doc.node(5).unwrap().inputs[0].link, None);
    assert_link_consistency(&doc);
}
