//! Small input files for the export tests

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

/// Two-bone vertical arm. The bones overlap around the elbow at y = 1.
pub const ARM_SKELETON: &str = r#"
[[bones]]
name = "upper"
head = [0.0, 0.0, 0.0]
tail = [0.0, 1.0, 0.0]
head_radius = 0.4
tail_radius = 0.4

[[bones]]
name = "lower"
head = [0.0, 1.0, 0.0]
tail = [0.0, 2.0, 0.0]
head_radius = 0.4
tail_radius = 0.4
"#;

/// Vertices: 0 upper only, 1 elbow (both), 2 lower only, 3 far away (fallback to lower)
pub const ARM_OBJ: &str = "\
# arm sample points
v 0.1 0.2 0.0
v 0.0 1.0 0.2
v -0.1 1.8 0.0
v 0.0 5.0 0.0
f 1 2 3
";

/// Joints root -> spine -> neck, each one unit above its parent
pub const RIG_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [
    { "name": "root", "translation": [0.0, 0.0, 1.0], "children": [1] },
    { "name": "spine", "translation": [0.0, 1.0, 0.0], "children": [2] },
    { "name": "neck", "translation": [0.0, 1.0, 0.0] }
  ],
  "skins": [{ "name": "rig", "joints": [0, 1, 2] }]
}"#;

/// One triangle (0,0,0), (1,0,0), (0,1,0) on a node translated to z = 2
pub const TRIANGLE_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "name": "tri", "mesh": 0, "translation": [0.0, 0.0, 2.0] }],
  "meshes": [{ "name": "tri", "primitives": [{ "attributes": { "POSITION": 0 } }] }],
  "accessors": [{
    "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
    "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
  }],
  "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
  "buffers": [{
    "byteLength": 36,
    "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
  }]
}"#;

pub fn write_file(path: &Path, contents: &str) {
    let mut file = std::fs::File::create(path).expect("Failed to create test asset");
    file.write_all(contents.as_bytes())
        .expect("Failed to write test asset");
}

/// Two joints that list each other as children
pub const CYCLIC_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "nodes": [
    { "name": "a", "children": [1] },
    { "name": "b", "children": [0] }
  ],
  "skins": [{ "joints": [0, 1] }]
}"#;
