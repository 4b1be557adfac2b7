//! Weight file formats
//!
//! # JSON (`.json`)
//! ```text
//! { "bones": [names in skeleton order],
//!   "vertex_count": n,
//!   "weights": { bone: { vertex: weight } } }
//! ```
//!
//! # Packed (`.skw`)
//! POD format - no magic bytes.
//! ```text
//! 0x00: vertex_count u32
//! 0x04: bone_count u32
//! 0x08: vertex_count × 8 bytes (bone indices u8×4, weights unorm8×4)
//! ```

use anyhow::{Result, bail};
use autoskin_core::{PackedInfluences, Skeleton, WeightStore};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// File extension for packed weight files
pub const PACKED_WEIGHTS_EXT: &str = "skw";

/// Output format for computed weights
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WeightFormat {
    /// Sparse bone -> vertex -> weight JSON document
    #[default]
    Json,
    /// Fixed 4-influence vertex skinning data
    Packed,
}

impl WeightFormat {
    pub fn extension(self) -> &'static str {
        match self {
            WeightFormat::Json => "json",
            WeightFormat::Packed => PACKED_WEIGHTS_EXT,
        }
    }
}

/// JSON weight document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightsDocument {
    /// Bone names in skeleton order
    pub bones: Vec<String>,
    pub vertex_count: usize,
    pub weights: WeightStore,
}

impl WeightsDocument {
    pub fn new(skeleton: &Skeleton, vertex_count: usize, weights: WeightStore) -> Self {
        Self {
            bones: skeleton.bones().iter().map(|b| b.name.clone()).collect(),
            vertex_count,
            weights,
        }
    }
}

/// Packed weights header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct SkinWeightsHeader {
    pub vertex_count: u32,
    pub bone_count: u32,
}

impl SkinWeightsHeader {
    pub const SIZE: usize = 8;

    pub fn new(vertex_count: u32, bone_count: u32) -> Self {
        Self {
            vertex_count,
            bone_count,
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.bone_count.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            vertex_count: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            bone_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        })
    }
}

/// Write a JSON weight document
pub fn write_weights_json<W: Write>(w: &mut W, document: &WeightsDocument) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, document)?;
    w.write_all(b"\n")?;
    Ok(())
}

/// Write a complete packed weights file
pub fn write_packed_weights<W: Write>(
    w: &mut W,
    bone_count: usize,
    vertices: &[PackedInfluences],
) -> Result<()> {
    let (Ok(vertex_count), Ok(bone_count)) =
        (u32::try_from(vertices.len()), u32::try_from(bone_count))
    else {
        bail!("Too many vertices or bones for packed weights");
    };

    let header = SkinWeightsHeader::new(vertex_count, bone_count);
    w.write_all(&header.to_bytes())?;
    w.write_all(bytemuck::cast_slice(vertices))?;
    Ok(())
}

/// Parse a packed weights file back into header and per-vertex data
pub fn read_packed_weights(data: &[u8]) -> Result<(SkinWeightsHeader, Vec<PackedInfluences>)> {
    let Some(header) = SkinWeightsHeader::from_bytes(data) else {
        bail!("Packed weights too small for header");
    };

    let body = &data[SkinWeightsHeader::SIZE..];
    let expected = header.vertex_count as usize * PackedInfluences::SIZE;
    if body.len() != expected {
        bail!(
            "Packed weights size mismatch: {} vertices need {} bytes, got {}",
            header.vertex_count,
            expected,
            body.len()
        );
    }

    let vertices = body
        .chunks_exact(PackedInfluences::SIZE)
        .map(bytemuck::pod_read_unaligned)
        .collect();
    Ok((header, vertices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoskin_core::Bone;
    use glam::Vec3;

    #[test]
    fn test_header_layout() {
        let header = SkinWeightsHeader::new(3, 2);
        assert_eq!(header.to_bytes(), [3, 0, 0, 0, 2, 0, 0, 0]);
        assert_eq!(SkinWeightsHeader::from_bytes(&header.to_bytes()), Some(header));
        assert_eq!(SkinWeightsHeader::from_bytes(&[0; 4]), None);
    }

    #[test]
    fn test_packed_file() {
        let vertices = [
            PackedInfluences::ROOT,
            PackedInfluences {
                bones: [1, 2, 0, 0],
                weights: [128, 127, 0, 0],
            },
        ];
        let mut data = Vec::new();
        write_packed_weights(&mut data, 3, &vertices).unwrap();
        assert_eq!(data.len(), SkinWeightsHeader::SIZE + 2 * PackedInfluences::SIZE);
        assert_eq!(&data[16..], &[1, 2, 0, 0, 128, 127, 0, 0]);

        let (header, read) = read_packed_weights(&data).unwrap();
        assert_eq!(header, SkinWeightsHeader::new(2, 3));
        assert_eq!(read, vertices);
    }

    #[test]
    fn test_truncated_packed_file() {
        let mut data = SkinWeightsHeader::new(2, 1).to_bytes().to_vec();
        data.extend_from_slice(&[0; 8]);
        assert!(read_packed_weights(&data).is_err());
    }

    #[test]
    fn test_json_document() {
        let skeleton = Skeleton::new(vec![
            Bone::new("root", Vec3::ZERO, Vec3::Y),
            Bone::new("tip", Vec3::Y, Vec3::new(0.0, 2.0, 0.0)),
        ]);
        let mut store = WeightStore::new();
        store.set("tip", 1, 1.0);
        store.set("root", 0, 0.5);
        store.set("tip", 0, 0.5);

        let document = WeightsDocument::new(&skeleton, 2, store);
        let mut out = Vec::new();
        write_weights_json(&mut out, &document).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["bones"], serde_json::json!(["root", "tip"]));
        assert_eq!(value["weights"]["tip"]["1"], 1.0);

        let parsed: WeightsDocument = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, document);
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(WeightFormat::Json.extension(), "json");
        assert_eq!(WeightFormat::Packed.extension(), "skw");
    }
}
