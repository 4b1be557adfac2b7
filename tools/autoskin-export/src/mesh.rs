//! Mesh position loading (OBJ and glTF/GLB)
//!
//! Weights are per position, so only vertex positions are read. Vertex `i`
//! of the loaded mesh is the `i`-th position in the file.

use anyhow::{Context, Result, bail};
use glam::{Mat4, Vec3};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::scene::world_matrices;

/// Load mesh positions, picking the reader from the file extension
pub fn load_positions(input: &Path, mesh_name: Option<&str>) -> Result<Vec<Vec3>> {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "obj" => load_obj_positions(input),
        "gltf" | "glb" => load_gltf_positions(input, mesh_name),
        _ => bail!(
            "Unsupported mesh format: {:?} (use .obj, .gltf, or .glb)",
            input
        ),
    }
}

/// Read the `v` records of an OBJ file
pub fn load_obj_positions(input: &Path) -> Result<Vec<Vec3>> {
    let file = File::open(input).with_context(|| format!("Failed to open OBJ: {:?}", input))?;
    parse_obj_positions(BufReader::new(file))
        .with_context(|| format!("Failed to parse OBJ: {:?}", input))
}

/// Parse the `v` records of OBJ text
pub fn parse_obj_positions<R: BufRead>(reader: R) -> Result<Vec<Vec3>> {
    let mut positions = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        if parts.next() != Some("v") {
            continue;
        }

        let coords: Vec<&str> = parts.take(3).collect();
        if coords.len() < 3 {
            bail!("Line {}: vertex needs 3 coordinates", line_no + 1);
        }

        let mut xyz = [0.0f32; 3];
        for (value, text) in xyz.iter_mut().zip(&coords) {
            *value = text
                .parse()
                .with_context(|| format!("Line {}: invalid coordinate '{}'", line_no + 1, text))?;
        }
        positions.push(Vec3::from_array(xyz));
    }

    if positions.is_empty() {
        bail!("No vertices found in OBJ file");
    }

    Ok(positions)
}

/// Read positions of a glTF mesh in world space.
///
/// Uses the first node instancing the mesh (by name, or the first mesh). All
/// primitives are concatenated in order.
pub fn load_gltf_positions(input: &Path, mesh_name: Option<&str>) -> Result<Vec<Vec3>> {
    let (document, buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    let mesh = if let Some(name) = mesh_name {
        document
            .meshes()
            .find(|m| m.name() == Some(name))
            .with_context(|| format!("Mesh '{}' not found in glTF", name))?
    } else {
        document
            .meshes()
            .next()
            .context("No meshes found in glTF file")?
    };

    let mut positions = Vec::new();
    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let prim_positions = reader
            .read_positions()
            .context("Mesh primitive has no positions")?;
        positions.extend(prim_positions.map(Vec3::from_array));
    }

    if positions.is_empty() {
        bail!("No vertices found in glTF mesh");
    }

    // Bring the mesh into world space through the node that instances it
    if let Some(node) = document
        .nodes()
        .find(|n| n.mesh().is_some_and(|m| m.index() == mesh.index()))
    {
        let world = world_matrices(&document)?[node.index()];
        if world != Mat4::IDENTITY {
            autoskin_core::transform_positions(&mut positions, world);
        }
    }

    tracing::info!(
        "Loaded glTF mesh '{}': {} vertices",
        mesh.name().unwrap_or("unnamed"),
        positions.len()
    );

    Ok(positions)
}
