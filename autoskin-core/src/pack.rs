//! GPU-style influence packing
//!
//! Converts per-vertex influences into the fixed 8-byte skinning layout used
//! by vertex buffers: four u8 bone indices followed by four unorm8 weights.

use bytemuck::{Pod, Zeroable};

use crate::error::SkinError;
use crate::skeleton::Skeleton;
use crate::weights::{Influence, WeightStore};

/// Influence slots per packed vertex
pub const MAX_PACKED_INFLUENCES: usize = 4;

/// Bone indices must fit in a u8
pub const MAX_PACKED_BONES: usize = u8::MAX as usize + 1;

/// Packed skinning data for one vertex (8 bytes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct PackedInfluences {
    /// Bone indices into the skeleton
    pub bones: [u8; 4],
    /// Weights as unorm8; always sums to 255
    pub weights: [u8; 4],
}

impl PackedInfluences {
    pub const SIZE: usize = 8;

    /// Full weight on bone 0, used for vertices without influences
    pub const ROOT: Self = Self {
        bones: [0; 4],
        weights: [255, 0, 0, 0],
    };

    /// Decode the weights back to floats
    pub fn unpacked_weights(&self) -> [f32; 4] {
        self.weights.map(|w| w as f32 / 255.0)
    }
}

/// Result of packing a whole weight store
#[derive(Debug, Clone, Default)]
pub struct PackedWeights {
    pub vertices: Vec<PackedInfluences>,
    /// Vertices that had more influences than the slot limit
    pub truncated_vertices: usize,
}

fn f32_to_unorm8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Pack influences for one vertex.
///
/// Keeps the first `max_influences` (clamped to 1..=4) influences, renormalizes
/// them and fixes rounding so the quantized weights sum to exactly 255.
/// An empty influence list packs as [`PackedInfluences::ROOT`].
pub fn pack_influences(
    influences: &[Influence],
    max_influences: usize,
) -> Result<PackedInfluences, SkinError> {
    let limit = max_influences.clamp(1, MAX_PACKED_INFLUENCES);
    let kept = &influences[..influences.len().min(limit)];

    let total: f32 = kept.iter().map(|i| i.weight).sum();
    if kept.is_empty() || total <= 0.0 {
        return Ok(PackedInfluences::ROOT);
    }

    let mut packed = PackedInfluences::default();
    for (slot, influence) in kept.iter().enumerate() {
        packed.bones[slot] = u8::try_from(influence.bone)
            .map_err(|_| SkinError::TooManyBones(influence.bone + 1))?;
        packed.weights[slot] = f32_to_unorm8(influence.weight / total);
    }

    // Push the rounding error onto the heaviest slot
    let sum: i32 = packed.weights.iter().map(|&w| w as i32).sum();
    let heaviest = (0..kept.len())
        .max_by_key(|&slot| (packed.weights[slot], std::cmp::Reverse(slot)))
        .unwrap_or(0);
    let corrected = packed.weights[heaviest] as i32 + (255 - sum);
    packed.weights[heaviest] = corrected.clamp(0, 255) as u8;

    Ok(packed)
}

/// Pack every vertex of `store` against `skeleton`.
pub fn pack_weight_store(
    store: &WeightStore,
    skeleton: &Skeleton,
    vertex_count: usize,
    max_influences: usize,
) -> Result<PackedWeights, SkinError> {
    if skeleton.len() > MAX_PACKED_BONES {
        return Err(SkinError::TooManyBones(skeleton.len()));
    }

    let limit = max_influences.clamp(1, MAX_PACKED_INFLUENCES);
    let mut packed = PackedWeights {
        vertices: Vec::with_capacity(vertex_count),
        truncated_vertices: 0,
    };

    for vertex in 0..vertex_count {
        let influences = store.vertex_influences(skeleton, vertex);
        if influences.len() > limit {
            packed.truncated_vertices += 1;
        }
        packed.vertices.push(pack_influences(&influences, limit)?);
    }

    Ok(packed)
}
