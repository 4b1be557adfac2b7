//! glTF node hierarchy helpers

use anyhow::{Result, bail};
use glam::Mat4;

/// Parent index of every node (None for roots)
pub(crate) fn node_parents(document: &gltf::Document) -> Vec<Option<usize>> {
    let mut parents = vec![None; document.nodes().count()];
    for node in document.nodes() {
        for child in node.children() {
            parents[child.index()] = Some(node.index());
        }
    }
    parents
}

/// World matrix of every node, composed along the parent chain
///
/// Fails when the parent links loop back on themselves, which the glTF
/// loader does not reject.
pub(crate) fn world_matrices(document: &gltf::Document) -> Result<Vec<Mat4>> {
    let parents = node_parents(document);
    let locals: Vec<Mat4> = document
        .nodes()
        .map(|n| Mat4::from_cols_array_2d(&n.transform().matrix()))
        .collect();

    (0..locals.len())
        .map(|start| -> Result<Mat4> {
            let mut node = start;
            let mut world = locals[node];
            // A chain longer than the node count must revisit a node
            for _ in 0..locals.len() {
                let Some(parent) = parents[node] else {
                    return Ok(world);
                };
                world = locals[parent] * world;
                node = parent;
            }
            bail!("glTF node hierarchy contains a cycle (through node {})", start)
        })
        .collect()
}
