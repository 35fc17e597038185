//! Testing utilities for the density-check workspace
//!
//! Shared scene builders and canned trees.

#![allow(missing_docs)]

use density_scene::{Mesh, Representation, SceneNode};
use serde_json::{json, Value};

pub const WALL_TYPE: &str = "Objects.BuiltElements.Wall";
pub const LEVEL_TYPE: &str = "Objects.BuiltElements.Level";
pub const COLLECTION_TYPE: &str = "Speckle.Core.Models.Collection";

/// Mesh through the given points
pub fn mesh_through(points: &[[f64; 3]]) -> Mesh {
    Mesh::from_points(points)
}

/// Axis-aligned box mesh with the given extents in millimetres
pub fn box_mesh(x: f64, y: f64, z: f64) -> Mesh {
    mesh_through(&[[0.0, 0.0, 0.0], [x, y, z]])
}

pub fn mesh_representation(id: &str, mesh: Mesh) -> Representation {
    Representation::mesh(id, mesh)
}

/// Leaf carrying one mesh representation with id `"<id>-mesh"`
pub fn mesh_leaf(id: &str, mesh: Mesh) -> SceneNode {
    SceneNode::new(WALL_TYPE)
        .with_id(id)
        .with_display(vec![mesh_representation(&format!("{id}-mesh"), mesh)])
}

/// Leaf carrying several meshes with ids `"<id>-mesh-<n>"`
pub fn multi_mesh_leaf(id: &str, meshes: Vec<Mesh>) -> SceneNode {
    let representations = meshes
        .into_iter()
        .enumerate()
        .map(|(index, mesh)| mesh_representation(&format!("{id}-mesh-{index}"), mesh))
        .collect();
    SceneNode::new(WALL_TYPE).with_id(id).with_display(representations)
}

pub fn container(type_tag: &str, id: &str, elements: Vec<SceneNode>) -> SceneNode {
    SceneNode::new(type_tag).with_id(id).with_elements(elements)
}

/// Node A: flat 10 x 20 mm panel. Node B: 10 mm cube.
pub fn two_node_scene() -> SceneNode {
    container(
        COLLECTION_TYPE,
        "root",
        vec![
            mesh_leaf("A", mesh_through(&[[0.0, 0.0, 0.0], [10.0, 20.0, 0.0]])),
            mesh_leaf("B", mesh_through(&[[0.0, 0.0, 0.0], [10.0, 10.0, 10.0]])),
        ],
    )
}

/// Two levels, each with walls of increasing density, plus an empty container
pub fn building_scene() -> SceneNode {
    let level = |name: &str, base: u32| {
        container(
            LEVEL_TYPE,
            name,
            (0..3_u32)
                .map(|i| {
                    let side = 1000.0 / f64::from(base + i);
                    mesh_leaf(&format!("{name}-wall-{i}"), box_mesh(side, side, 100.0))
                })
                .collect(),
        )
    };
    container(
        COLLECTION_TYPE,
        "building",
        vec![level("L1", 1), level("L2", 4), container(COLLECTION_TYPE, "empty", Vec::new())],
    )
}

/// Serialized scene using both display aliases and some malformed members
pub fn sample_scene_json() -> Value {
    json!({
        "id": "root",
        "speckle_type": COLLECTION_TYPE,
        "name": "Sample",
        "elements": [
            {
                "id": "wall-1",
                "speckle_type": WALL_TYPE,
                "units": "mm",
                "displayValue": [
                    {
                        "id": "wall-1-mesh",
                        "speckle_type": "Objects.Geometry.Mesh",
                        "vertices": [0.0, 0.0, 0.0, 1000.0, 200.0, 3000.0],
                        "faces": [3, 0, 1, 1]
                    },
                    "not an object"
                ]
            },
            {
                "id": "slab-1",
                "speckle_type": "Objects.BuiltElements.Floor",
                "@displayValue": [
                    {
                        "id": "slab-1-mesh",
                        "speckle_type": "Objects.Geometry.Mesh",
                        "vertices": [0.0, 0.0, 0.0, 5000.0, 5000.0, 0.0]
                    }
                ]
            },
            {
                "id": "group",
                "speckle_type": COLLECTION_TYPE,
                "elements": "corrupt"
            },
            42
        ]
    })
}
