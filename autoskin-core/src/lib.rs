//! Automatic envelope skinning
//!
//! Computes per-vertex bone weights for a mesh bound to a skeleton. Every bone
//! carries a tapered capsule envelope; a vertex is weighted evenly across the
//! bones whose envelopes contain it, and falls back to its closest bone when
//! none do.
//!
//! # Modules
//!
//! - [`geometry`] - Closest-point-on-segment queries
//! - [`skeleton`] - Bones, envelopes and skeleton validation
//! - [`mesh`] - Vertex positions and their weight store
//! - [`weights`] - Sparse bone-indexed weight storage
//! - [`assign`] - The envelope weight assignor
//! - [`pack`] - Packing influences into 8-byte vertex skinning data
//!
//! # Example
//! ```
//! use autoskin_core::{assign_weights, Bone, Mesh, Skeleton};
//! use glam::Vec3;
//!
//! let skeleton = Skeleton::new(vec![
//!     Bone::new("bone", Vec3::ZERO, Vec3::Z).with_radii(0.5, 0.5),
//! ]);
//! let mut mesh = Mesh::new(vec![Vec3::new(0.1, 0.0, 0.5)]);
//!
//! assign_weights(&skeleton, &mut mesh).unwrap();
//! assert_eq!(mesh.weights().get("bone", 0), Some(1.0));
//! ```

pub mod assign;
pub mod error;
pub mod geometry;
pub mod mesh;
pub mod pack;
pub mod skeleton;
pub mod weights;

pub use assign::{
    AssignReport, Classification, DEFAULT_PARALLEL_THRESHOLD, EnvelopeAssignor,
    MIN_ENVELOPE_RADIUS, assign_weights, classify_vertex,
};
pub use error::SkinError;
pub use geometry::{interpolate_radius, segment_distance};
pub use mesh::{Mesh, transform_positions, validate_positions};
pub use pack::{
    MAX_PACKED_BONES, MAX_PACKED_INFLUENCES, PackedInfluences, PackedWeights, pack_influences,
    pack_weight_store,
};
pub use skeleton::{Bone, EnvelopeSample, Skeleton};
pub use weights::{Influence, VertexInfluences, WeightGroup, WeightStore};
