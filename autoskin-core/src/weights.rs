//! Bone-indexed weight storage
//!
//! The store maps a bone name to a sparse map of vertex index to weight.
//! A missing entry means weight 0.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::skeleton::Skeleton;

/// Weights of one bone, keyed by vertex index
pub type WeightGroup = BTreeMap<usize, f32>;

/// A single bone influence on a vertex (bone index in skeleton order)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Influence {
    pub bone: usize,
    pub weight: f32,
}

/// Influences on one vertex, in skeleton order
pub type VertexInfluences = SmallVec<[Influence; 4]>;

/// Sparse bone name -> (vertex index -> weight) table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightStore {
    groups: BTreeMap<String, WeightGroup>,
}

impl WeightStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Set the weight of `bone` on `vertex`, replacing any previous value
    pub fn set(&mut self, bone: &str, vertex: usize, weight: f32) {
        match self.groups.get_mut(bone) {
            Some(group) => {
                group.insert(vertex, weight);
            }
            None => {
                self.groups
                    .insert(bone.to_owned(), BTreeMap::from([(vertex, weight)]));
            }
        }
    }

    /// Weight of `bone` on `vertex`, or `None` when the bone has no influence
    pub fn get(&self, bone: &str, vertex: usize) -> Option<f32> {
        self.groups.get(bone)?.get(&vertex).copied()
    }

    pub fn group(&self, bone: &str) -> Option<&WeightGroup> {
        self.groups.get(bone)
    }

    /// Iterate over all non-empty groups in bone-name order
    pub fn groups(&self) -> impl Iterator<Item = (&str, &WeightGroup)> {
        self.groups.iter().map(|(name, group)| (name.as_str(), group))
    }

    /// Sum of all weights assigned to `vertex`
    pub fn vertex_total(&self, vertex: usize) -> f32 {
        self.groups
            .values()
            .filter_map(|group| group.get(&vertex))
            .sum()
    }

    /// Influences on `vertex`, ordered by the bone's position in `skeleton`.
    ///
    /// Groups naming bones absent from `skeleton` are ignored.
    pub fn vertex_influences(&self, skeleton: &Skeleton, vertex: usize) -> VertexInfluences {
        skeleton
            .bones()
            .iter()
            .enumerate()
            .filter_map(|(bone, b)| {
                self.get(&b.name, vertex)
                    .map(|weight| Influence { bone, weight })
            })
            .collect()
    }
}
