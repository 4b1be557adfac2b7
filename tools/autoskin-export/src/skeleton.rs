//! Skeleton loading (TOML bone lists and glTF skins)
//!
//! glTF carries no envelope radii, so bones loaded from a skin take their
//! radii from [`RadiusDefaults`].

use anyhow::{Context, Result, bail};
use autoskin_core::{Bone, Skeleton};
use glam::Vec3;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::scene::{node_parents, world_matrices};

/// Radii used for bones whose source does not provide them.
///
/// Both default to 0.0, which leaves such bones usable only as the
/// closest-bone fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RadiusDefaults {
    #[serde(default)]
    pub head_radius: f32,
    #[serde(default)]
    pub tail_radius: f32,
}

/// On-disk TOML skeleton: a list of `[[bones]]` tables
#[derive(Debug, Deserialize)]
struct SkeletonFile {
    #[serde(default)]
    bones: Vec<BoneEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BoneEntry {
    name: String,
    head: [f32; 3],
    tail: [f32; 3],
    head_radius: Option<f32>,
    tail_radius: Option<f32>,
}

/// Load a skeleton, picking the reader from the file extension
///
/// # Arguments
/// * `input` - Path to a `.toml`, `.gltf` or `.glb` file
/// * `skin_name` - Skin to select in glTF files (first skin if None)
/// * `defaults` - Radii for bones that do not specify their own
pub fn load_skeleton(
    input: &Path,
    skin_name: Option<&str>,
    defaults: RadiusDefaults,
) -> Result<Skeleton> {
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "toml" => load_toml_skeleton(input, defaults),
        "gltf" | "glb" => load_gltf_skeleton(input, skin_name, defaults),
        _ => bail!(
            "Unsupported skeleton format: {:?} (use .toml, .gltf, or .glb)",
            input
        ),
    }
}

/// Load a TOML bone list
pub fn load_toml_skeleton(input: &Path, defaults: RadiusDefaults) -> Result<Skeleton> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read skeleton: {}", input.display()))?;
    parse_toml_skeleton(&content, defaults)
        .with_context(|| format!("Invalid skeleton file: {}", input.display()))
}

/// Parse a TOML bone list from a string
pub fn parse_toml_skeleton(content: &str, defaults: RadiusDefaults) -> Result<Skeleton> {
    let file: SkeletonFile = toml::from_str(content).context("Failed to parse skeleton TOML")?;
    if file.bones.is_empty() {
        bail!("Skeleton file defines no bones");
    }

    let bones = file
        .bones
        .into_iter()
        .map(|entry| {
            Bone::new(
                entry.name,
                Vec3::from_array(entry.head),
                Vec3::from_array(entry.tail),
            )
            .with_radii(
                entry.head_radius.unwrap_or(defaults.head_radius),
                entry.tail_radius.unwrap_or(defaults.tail_radius),
            )
        })
        .collect();

    let skeleton = Skeleton::new(bones);
    skeleton.validate()?;
    Ok(skeleton)
}

/// Build a skeleton from the joints of a glTF skin
///
/// Each joint becomes a bone whose head is the joint's world-space position.
/// The tail is the position of the joint's first child in the same skin; a
/// leaf joint extends its parent joint's direction by the same length, and an
/// isolated joint becomes a zero-length bone.
pub fn load_gltf_skeleton(
    input: &Path,
    skin_name: Option<&str>,
    defaults: RadiusDefaults,
) -> Result<Skeleton> {
    let (document, _buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    // Find skin by name or use first
    let skin = if let Some(name) = skin_name {
        document
            .skins()
            .find(|s| s.name() == Some(name))
            .with_context(|| format!("Skin '{}' not found in glTF", name))?
    } else {
        document
            .skins()
            .next()
            .context("No skins found in glTF file")?
    };

    let joints: Vec<gltf::Node> = skin.joints().collect();
    if joints.is_empty() {
        bail!("No bones found in skin");
    }

    let parents = node_parents(&document);
    let world = world_matrices(&document)?;
    let position = |node: usize| world[node].w_axis.truncate();
    let joint_set: HashSet<usize> = joints.iter().map(|j| j.index()).collect();

    let bones = joints
        .iter()
        .map(|joint| {
            let index = joint.index();
            let head = position(index);

            let child = joint
                .children()
                .map(|c| c.index())
                .find(|c| joint_set.contains(c));
            let parent = parents[index].filter(|p| joint_set.contains(p));

            let tail = match (child, parent) {
                (Some(child), _) => position(child),
                (None, Some(parent)) => head + (head - position(parent)),
                (None, None) => head,
            };

            let name = joint
                .name()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("joint_{}", index));

            Bone::new(name, head, tail).with_radii(defaults.head_radius, defaults.tail_radius)
        })
        .collect();

    let skeleton = Skeleton::new(bones);
    skeleton.validate().with_context(|| {
        format!(
            "Skin '{}' is not a valid skeleton",
            skin.name().unwrap_or("unnamed")
        )
    })?;

    tracing::info!(
        "Loaded skeleton: {} bones from skin '{}'",
        skeleton.len(),
        skin.name().unwrap_or("unnamed")
    );

    Ok(skeleton)
}

/// Log the bones of a skeleton
pub fn list_bones(skeleton: &Skeleton) {
    tracing::info!("{} bones:", skeleton.len());
    for (i, bone) in skeleton.bones().iter().enumerate() {
        tracing::info!(
            "  [{}] '{}': length {:.4}, radius {:.4} -> {:.4}",
            i,
            bone.name,
            bone.length(),
            bone.head_radius,
            bone.tail_radius
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARM: &str = r#"
        [[bones]]
        name = "upper"
        head = [0.0, 0.0, 0.0]
        tail = [0.0, 1.0, 0.0]
        head_radius = 0.3

        [[bones]]
        name = "lower"
        head = [0.0, 1.0, 0.0]
        tail = [0.0, 2.0, 0.0]
    "#;

    #[test]
    fn test_parse_toml_skeleton() {
        let defaults = RadiusDefaults {
            head_radius: 0.1,
            tail_radius: 0.2,
        };
        let skeleton = parse_toml_skeleton(ARM, defaults).unwrap();
        assert_eq!(skeleton.len(), 2);

        let upper = &skeleton.bones()[0];
        assert_eq!(upper.head_radius, 0.3);
        assert_eq!(upper.tail_radius, 0.2);

        let lower = &skeleton.bones()[1];
        assert_eq!(lower.head, Vec3::Y);
        assert_eq!((lower.head_radius, lower.tail_radius), (0.1, 0.2));
    }

    #[test]
    fn test_missing_radii_default_to_zero() {
        let skeleton = parse_toml_skeleton(ARM, RadiusDefaults::default()).unwrap();
        assert_eq!(skeleton.bones()[1].head_radius, 0.0);
    }

    #[test]
    fn test_empty_bone_list_rejected() {
        assert!(parse_toml_skeleton("", RadiusDefaults::default()).is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let doubled = format!(
            "{}\n[[bones]]\nname = \"upper\"\nhead = [0.0, 0.0, 0.0]\ntail = [1.0, 0.0, 0.0]\n",
            ARM
        );
        let err = parse_toml_skeleton(&doubled, RadiusDefaults::default()).unwrap_err();
        assert!(format!("{err:#}").contains("Duplicate bone name 'upper'"));
    }

    #[test]
    fn test_negative_radius_rejected() {
        let bad = r#"
            [[bones]]
            name = "bad"
            head = [0.0, 0.0, 0.0]
            tail = [0.0, 1.0, 0.0]
            tail_radius = -1.0
        "#;
        assert!(parse_toml_skeleton(bad, RadiusDefaults::default()).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_skeleton(Path::new("rig.fbx"), None, RadiusDefaults::default()).unwrap_err();
        assert!(err.to_string().contains("Unsupported skeleton format"));
    }
}
