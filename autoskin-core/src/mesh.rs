//! Mesh vertex positions and their weight store

use glam::{Mat4, Vec3};

use crate::error::SkinError;
use crate::weights::WeightStore;

/// Vertex positions plus the bone weights computed for them.
///
/// Positions must be in the same coordinate space as the skeleton the mesh
/// is weighted against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    positions: Vec<Vec3>,
    weights: WeightStore,
}

impl Mesh {
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            weights: WeightStore::new(),
        }
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn weights(&self) -> &WeightStore {
        &self.weights
    }

    /// Swap in a complete weight store, returning the previous one
    pub fn replace_weights(&mut self, weights: WeightStore) -> WeightStore {
        std::mem::replace(&mut self.weights, weights)
    }

    /// Take the weight store, leaving an empty one behind
    pub fn take_weights(&mut self) -> WeightStore {
        std::mem::take(&mut self.weights)
    }

    /// Transform every vertex position by `matrix` (e.g. object-to-world)
    pub fn transform(&mut self, matrix: Mat4) {
        transform_positions(&mut self.positions, matrix);
    }

    /// Check that every position is finite
    pub fn validate(&self) -> Result<(), SkinError> {
        validate_positions(&self.positions)
    }
}

/// Reject the first non-finite position
pub fn validate_positions(positions: &[Vec3]) -> Result<(), SkinError> {
    match positions.iter().position(|p| !p.is_finite()) {
        Some(index) => Err(SkinError::NonFiniteVertex { index }),
        None => Ok(()),
    }
}

/// Transform positions in place by `matrix`
pub fn transform_positions(positions: &mut [Vec3], matrix: Mat4) {
    for p in positions {
        *p = matrix.transform_point3(*p);
    }
}
