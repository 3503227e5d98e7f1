//! End-to-end tests: document round-tripping, file I/O, and analyze-edit
//! cycles over one document.
use kairo::document::io;
use kairo::prelude::*;
use serde_json::json;

mod common;
use common::*;

#[test]
fn test_document_round_trip_preserves_unknown_fields() {
    let raw = json!({
        "nodes": [
            {
                "id": 1,
                "type": "LoadImage",
                "pos": [100, 200],
                "size": [315, 314],
                "flags": {"collapsed": false},
                "order": 0,
                "mode": 0,
                "inputs": [],
                "outputs": [
                    {"name": "IMAGE", "type": "IMAGE", "links": [1], "slot_index": 0}
                ],
                "properties": {"Node name for S&R": "LoadImage"},
                "widgets_values": ["example.png"]
            },
            {
                "id": 2,
                "type": "PreviewImage",
                "inputs": [{"name": "images", "type": "IMAGE", "link": 1, "label": "imgs"}],
                "outputs": []
            }
        ],
        "links": [[1, 1, 0, 2, 0, "IMAGE"]],
        "last_node_id": 2,
        "last_link_id": 1,
        "version": 0.4,
        "groups": [],
        "extra": {"ds": {"scale": 1.0}}
    });

    let doc: WorkflowDocument = serde_json::from_value(raw.clone()).unwrap();
    let round_tripped = serde_json::to_value(&doc).unwrap();

    assert_eq!(round_tripped["version"], json!(0.4));
    assert_eq!(round_tripped["extra"]["ds"]["scale"], json!(1.0));
    assert_eq!(round_tripped["nodes"][0]["flags"]["collapsed"], json!(false));
    assert_eq!(round_tripped["nodes"][0]["size"], json!([315, 314]));
    assert_eq!(
        round_tripped["nodes"][0]["outputs"][0]["slot_index"],
        json!(0)
    );
    assert_eq!(round_tripped["nodes"][1]["inputs"][0]["label"], json!("imgs"));
    // Links serialize back to the compact array form.
    assert_eq!(round_tripped["links"][0], json!([1, 1, 0, 2, 0, "IMAGE"]));
}

#[test]
fn test_untyped_link_round_trips_as_null() {
    let doc: WorkflowDocument = serde_json::from_value(json!({
        "nodes": [],
        "links": [[7, 1, 0, 2, 0, null]],
        "last_node_id": 2,
        "last_link_id": 7
    }))
    .unwrap();

    assert_eq!(doc.links[0].dtype(), "");
    let value = serde_json::to_value(&doc).unwrap();
    assert_eq!(value["links"][0], json!([7, 1, 0, 2, 0, null]));
}

#[test]
fn test_save_and_load() {
    let dir = std::env::temp_dir().join(format!("kairo-io-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let path = dir.join("workflow.json");
    let doc = simple_chain();
    io::save(&doc, &path).unwrap();
    let loaded = io::load(&path).unwrap();
    assert_eq!(loaded, doc);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_versioned_output_probes_upward() {
    let dir = std::env::temp_dir().join(format!("kairo-ver-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let base = dir.join("flow.json");
    // Nothing exists yet: the base path itself is free.
    assert_eq!(io::versioned_output(&base), base);

    std::fs::write(&base, "{}").unwrap();
    assert_eq!(io::versioned_output(&base), dir.join("flow_v2.json"));

    std::fs::write(dir.join("flow_v2.json"), "{}").unwrap();
    assert_eq!(io::versioned_output(&base), dir.join("flow_v3.json"));
    // Starting from a versioned name continues the same sequence.
    assert_eq!(
        io::versioned_output(dir.join("flow_v2.json")),
        dir.join("flow_v3.json")
    );

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_changelog_is_shared_across_versions() {
    let dir = std::env::temp_dir().join(format!("kairo-log-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    io::append_changelog(
        dir.join("flow.json"),
        dir.join("flow_v2.json"),
        "delete",
        "deleted nodes: {3}",
    )
    .unwrap();
    io::append_changelog(
        dir.join("flow_v2.json"),
        dir.join("flow_v3.json"),
        "wire",
        "wired 3:0 -> 5:0",
    )
    .unwrap();

    let log = std::fs::read_to_string(dir.join("flow.changelog")).unwrap();
    assert!(log.contains("delete | flow.json -> flow_v2.json"));
    assert!(log.contains("wire | flow_v2.json -> flow_v3.json"));
    assert!(log.contains("  deleted nodes: {3}"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_analysis_tracks_edits() {
    let mut doc = simple_chain();

    let before = analyze_workflow(&doc);
    assert_eq!(before.exit_points, vec![5]);

    // Deleting the save node turns the decoder into the new exit.
    delete_nodes(&mut doc, &[5], false);
    let after = analyze_workflow(&doc);
    assert_eq!(after.exit_points, vec![4]);
    assert!(after.primary_outputs.is_empty());

    // Wiring a fresh save node restores a primary output.
    let created = create_node(
        &mut doc,
        "SaveImage",
        None,
        &[SlotDecl::new("images", "IMAGE")],
        &[],
    );
    wire_nodes(&mut doc, 4, 0usize, created.new_id, 0usize).unwrap();

    let restored = analyze_workflow(&doc);
    assert_eq!(restored.exit_points, vec![created.new_id]);
    assert_eq!(restored.primary_outputs, vec![created.new_id]);
}

#[test]
fn test_inline_then_analyze_keeps_semantics() {
    let mut doc = variable_workflow();
    let before = analyze_workflow(&doc);
    assert_eq!(before.entry_points, vec![1]);
    assert_eq!(before.exit_points, vec![4]);

    inline_variables(&mut doc, false);

    // The direct wiring preserves the structural boundaries.
    let after = analyze_workflow(&doc);
    assert_eq!(after.entry_points, vec![1]);
    assert_eq!(after.exit_points, vec![4]);
    assert_eq!(find_path(&doc, 1, 4), Some(vec![1, 4]));
    assert!(after.variables.is_empty());
}

#[test]
fn test_from_json_round_trip() {
    let doc = simple_chain();
    let text = serde_json::to_string(&doc).unwrap();
    let parsed = WorkflowDocument::from_json(&text).unwrap();
    assert_eq!(parsed, doc);
}

#[test]
fn test_find_nodes_by_type_and_display() {
    let mut doc = simple_chain();
    doc.node_mut(3).unwrap().title = Some("Main Sampler".to_string());

    let hits = doc.nodes_by_type("vae");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].display_ref(), "[2] VAEEncode");
    assert_eq!(hits[1].display_ref(), "[4] VAEDecode");

    let sampler = doc.node(3).unwrap();
    assert_eq!(sampler.display_title(), "KSampler \"Main Sampler\"");
    assert_eq!(sampler.display_ref(), "[3] KSampler \"Main Sampler\"");
}
