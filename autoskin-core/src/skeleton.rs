//! Bones and skeletons
//!
//! A bone is a segment from `head` to `tail` with a linearly tapered envelope
//! described by `head_radius` and `tail_radius`. A skeleton is a flat, ordered
//! list of bones; order is significant because it breaks closest-bone ties.

use glam::{Mat4, Vec3};
use std::collections::HashSet;

use crate::error::SkinError;
use crate::geometry::{interpolate_radius, segment_distance};

/// A single bone with its envelope shape
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Name, unique within the skeleton. Used as the weight store key.
    pub name: String,
    pub head: Vec3,
    pub tail: Vec3,
    /// Envelope radius at the head (non-negative)
    pub head_radius: f32,
    /// Envelope radius at the tail (non-negative)
    pub tail_radius: f32,
}

/// Result of testing a point against a bone's envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeSample {
    /// Distance from the point to the bone segment
    pub distance: f32,
    /// Clamped projection parameter along the bone (0 = head, 1 = tail)
    pub t: f32,
    /// Envelope radius at the projected point
    pub radius: f32,
}

impl Bone {
    /// Create a bone without an envelope (both radii 0)
    pub fn new(name: impl Into<String>, head: Vec3, tail: Vec3) -> Self {
        Self {
            name: name.into(),
            head,
            tail,
            head_radius: 0.0,
            tail_radius: 0.0,
        }
    }

    /// Set the head and tail envelope radii
    pub fn with_radii(mut self, head_radius: f32, tail_radius: f32) -> Self {
        self.head_radius = head_radius;
        self.tail_radius = tail_radius;
        self
    }

    pub fn length(&self) -> f32 {
        self.head.distance(self.tail)
    }

    /// Envelope radius at projection parameter `t`
    pub fn radius_at(&self, t: f32) -> f32 {
        interpolate_radius(self.head_radius, self.tail_radius, t)
    }

    /// Measure `point` against this bone's segment and envelope
    pub fn sample(&self, point: Vec3) -> EnvelopeSample {
        let (distance, t) = segment_distance(point, self.head, self.tail);
        EnvelopeSample {
            distance,
            t,
            radius: self.radius_at(t),
        }
    }

    fn validate(&self) -> Result<(), SkinError> {
        let non_finite = |field| SkinError::NonFiniteBone {
            bone: self.name.clone(),
            field,
        };

        if !self.head.is_finite() {
            return Err(non_finite("head"));
        }
        if !self.tail.is_finite() {
            return Err(non_finite("tail"));
        }

        for (field, value) in [
            ("head radius", self.head_radius),
            ("tail radius", self.tail_radius),
        ] {
            if !value.is_finite() {
                return Err(non_finite(field));
            }
            if value < 0.0 {
                return Err(SkinError::NegativeRadius {
                    bone: self.name.clone(),
                    field,
                    value,
                });
            }
        }

        Ok(())
    }
}

/// Ordered collection of bones
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new(bones: Vec<Bone>) -> Self {
        Self { bones }
    }

    pub fn push(&mut self, bone: Bone) {
        self.bones.push(bone);
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Index of the bone called `name`, if any
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Check that the skeleton can drive weight assignment.
    ///
    /// Rejects empty skeletons, duplicate names, non-finite geometry and
    /// negative radii.
    pub fn validate(&self) -> Result<(), SkinError> {
        if self.bones.is_empty() {
            return Err(SkinError::EmptySkeleton);
        }

        let mut seen = HashSet::with_capacity(self.bones.len());
        for bone in &self.bones {
            if !seen.insert(bone.name.as_str()) {
                return Err(SkinError::DuplicateBoneName(bone.name.clone()));
            }
            bone.validate()?;
        }

        Ok(())
    }

    /// Copy of this skeleton with every head and tail transformed by `matrix`.
    ///
    /// Radii are left as authored.
    pub fn transformed(&self, matrix: Mat4) -> Self {
        let bones = self
            .bones
            .iter()
            .map(|bone| Bone {
                head: matrix.transform_point3(bone.head),
                tail: matrix.transform_point3(bone.tail),
                ..bone.clone()
            })
            .collect();
        Self { bones }
    }
}

impl From<Vec<Bone>> for Skeleton {
    fn from(bones: Vec<Bone>) -> Self {
        Self::new(bones)
    }
}
