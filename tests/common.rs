//! Common test utilities for building workflow documents.
use kairo::prelude::*;
use serde_json::json;

/// Builds a simple five-node image chain:
///
/// `LoadImage -> VAEEncode -> KSampler -> VAEDecode -> SaveImage`
///
/// The two VAE inputs are deliberately left unconnected so orphan
/// detection has something to find.
#[allow(dead_code)]
pub fn simple_chain() -> WorkflowDocument {
    serde_json::from_value(json!({
        "nodes": [
            {
                "id": 1,
                "type": "LoadImage",
                "inputs": [],
                "outputs": [{"name": "IMAGE", "type": "IMAGE", "links": [1]}],
                "widgets_values": ["example.png"]
            },
            {
                "id": 2,
                "type": "VAEEncode",
                "inputs": [
                    {"name": "pixels", "type": "IMAGE", "link": 1},
                    {"name": "vae", "type": "VAE", "link": null}
                ],
                "outputs": [{"name": "LATENT", "type": "LATENT", "links": [2]}]
            },
            {
                "id": 3,
                "type": "KSampler",
                "inputs": [{"name": "latent_image", "type": "LATENT", "link": 2}],
                "outputs": [{"name": "LATENT", "type": "LATENT", "links": [3]}],
                "widgets_values": [42, "fixed", 20, 8.0]
            },
            {
                "id": 4,
                "type": "VAEDecode",
                "inputs": [
                    {"name": "samples", "type": "LATENT", "link": 3},
                    {"name": "vae", "type": "VAE", "link": null}
                ],
                "outputs": [{"name": "IMAGE", "type": "IMAGE", "links": [4]}]
            },
            {
                "id": 5,
                "type": "SaveImage",
                "inputs": [{"name": "images", "type": "IMAGE", "link": 4}],
                "outputs": [],
                "widgets_values": ["output"]
            }
        ],
        "links": [
            [1, 1, 0, 2, 0, "IMAGE"],
            [2, 2, 0, 3, 0, "LATENT"],
            [3, 3, 0, 4, 0, "LATENT"],
            [4, 4, 0, 5, 0, "IMAGE"]
        ],
        "last_node_id": 5,
        "last_link_id": 4
    }))
    .expect("fixture must deserialize")
}

/// Builds a workflow using a set/get variable pair named `myimage`:
///
/// `LoadImage -> SetNode(myimage)` and `GetNode(myimage) -> SaveImage`
#[allow(dead_code)]
pub fn variable_workflow() -> WorkflowDocument {
    serde_json::from_value(json!({
        "nodes": [
            {
                "id": 1,
                "type": "LoadImage",
                "inputs": [],
                "outputs": [{"name": "IMAGE", "type": "IMAGE", "links": [1]}]
            },
            {
                "id": 2,
                "type": "SetNode",
                "title": "Set_myimage",
                "inputs": [{"name": "IMAGE", "type": "IMAGE", "link": 1}],
                "outputs": [{"name": "*", "type": "*", "links": null}],
                "widgets_values": ["myimage"]
            },
            {
                "id": 3,
                "type": "GetNode",
                "title": "Get_myimage",
                "inputs": [],
                "outputs": [{"name": "IMAGE", "type": "IMAGE", "links": [2]}],
                "widgets_values": ["myimage"]
            },
            {
                "id": 4,
                "type": "SaveImage",
                "inputs": [{"name": "images", "type": "IMAGE", "link": 2}],
                "outputs": []
            }
        ],
        "links": [
            [1, 1, 0, 2, 0, "IMAGE"],
            [2, 3, 0, 4, 0, "IMAGE"]
        ],
        "last_node_id": 4,
        "last_link_id": 2
    }))
    .expect("fixture must deserialize")
}

/// Builds a workflow with a for-loop pair whose count input is fed by a
/// constant node.
#[allow(dead_code)]
pub fn loop_workflow() -> WorkflowDocument {
    serde_json::from_value(json!({
        "nodes": [
            {
                "id": 9,
                "type": "INTConstant",
                "inputs": [],
                "outputs": [{"name": "value", "type": "INT", "links": [1]}],
                "widgets_values": [5]
            },
            {
                "id": 10,
                "type": "EasyForLoopStart",
                "title": "MyLoop",
                "inputs": [{"name": "total", "type": "INT", "link": 1}],
                "outputs": [{"name": "flow", "type": "FLOW", "links": [2]}]
            },
            {
                "id": 12,
                "type": "EasyForLoopEnd",
                "inputs": [{"name": "flow", "type": "FLOW", "link": 2}],
                "outputs": []
            }
        ],
        "links": [
            [1, 9, 0, 10, 0, "INT"],
            [2, 10, 0, 12, 0, "FLOW"]
        ],
        "last_node_id": 12,
        "last_link_id": 2
    }))
    .expect("fixture must deserialize")
}
