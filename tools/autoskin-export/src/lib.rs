//! autoskin-export library
//!
//! Loads skeletons and meshes from asset files, runs envelope weight
//! assignment and writes the weights. Also usable by other tools that want
//! weights in memory.

pub mod formats;
pub mod job;
pub mod manifest;
pub mod mesh;
mod scene;
pub mod skeleton;
pub mod transform;

// Re-export the core types callers need alongside the loaders
pub use autoskin_core::{AssignReport, Bone, Mesh, Skeleton, WeightStore};

pub use formats::{
    PACKED_WEIGHTS_EXT, SkinWeightsHeader, WeightFormat, WeightsDocument, read_packed_weights,
};
pub use job::{SkinJob, SkinnedWeights, build_all, convert_to_memory, run_job};
pub use manifest::Manifest;
pub use skeleton::{RadiusDefaults, load_skeleton};
pub use transform::ObjectTransform;
