//! Envelope weight assignment
//!
//! Each vertex is weighted evenly across every bone whose envelope contains
//! it. A vertex outside all envelopes is bound entirely to its closest bone;
//! ties go to the bone that comes first in the skeleton.
//!
//! The whole store is recomputed on every run and swapped into the mesh only
//! after every vertex has been classified, so a failed or cancelled run leaves
//! the previous weights untouched.

use glam::Vec3;
use rayon::prelude::*;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::SkinError;
use crate::mesh::{Mesh, validate_positions};
use crate::skeleton::Skeleton;
use crate::weights::WeightStore;

/// Envelope radii below this are treated as "no envelope"
pub const MIN_ENVELOPE_RADIUS: f32 = 1e-6;

/// Meshes with at least this many vertices are classified on the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 4096;

/// Bones influencing one vertex, as indices into the skeleton
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Influencing bones in skeleton order (never empty for a non-empty skeleton)
    pub bones: SmallVec<[usize; 4]>,
    /// True when no envelope contained the vertex and the closest bone was used
    pub fallback: bool,
}

impl Classification {
    /// Even weight given to each influencing bone
    pub fn weight(&self) -> f32 {
        1.0 / self.bones.len() as f32
    }
}

/// Summary of a completed assignment run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignReport {
    pub vertex_count: usize,
    pub bone_count: usize,
    /// Vertices that fell outside every envelope
    pub fallback_vertices: usize,
    /// Largest number of bones influencing a single vertex
    pub max_influences: usize,
}

/// Classify one vertex against every bone of `skeleton`.
///
/// Returns an empty classification only when the skeleton has no bones.
pub fn classify_vertex(skeleton: &Skeleton, position: Vec3) -> Classification {
    let mut bones = SmallVec::new();
    let mut closest: Option<(usize, f32)> = None;

    for (index, bone) in skeleton.bones().iter().enumerate() {
        let sample = bone.sample(position);

        // Strict comparison: the earliest bone wins a tie
        if closest.is_none_or(|(_, min_dist)| sample.distance < min_dist) {
            closest = Some((index, sample.distance));
        }

        if sample.radius >= MIN_ENVELOPE_RADIUS && sample.distance <= sample.radius {
            bones.push(index);
        }
    }

    let mut fallback = false;
    if bones.is_empty() {
        if let Some((index, _)) = closest {
            bones.push(index);
            fallback = true;
        }
    }

    Classification { bones, fallback }
}

/// Configurable envelope weight assignor
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeAssignor<'a> {
    parallel_threshold: usize,
    cancel: Option<&'a AtomicBool>,
}

impl Default for EnvelopeAssignor<'_> {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            cancel: None,
        }
    }
}

impl<'a> EnvelopeAssignor<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum vertex count for parallel classification (0 = always parallel)
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Abort with [`SkinError::Cancelled`] once `flag` is set.
    ///
    /// The flag is polled before each vertex.
    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Recompute the weight store of `mesh` from `skeleton`.
    ///
    /// On error the mesh's existing weights are left as they were.
    pub fn assign(&self, skeleton: &Skeleton, mesh: &mut Mesh) -> Result<AssignReport, SkinError> {
        let (store, report) = self.compute(skeleton, mesh.positions())?;
        mesh.replace_weights(store);
        Ok(report)
    }

    /// Compute a fresh weight store for `positions` without touching any mesh
    pub fn compute(
        &self,
        skeleton: &Skeleton,
        positions: &[Vec3],
    ) -> Result<(WeightStore, AssignReport), SkinError> {
        skeleton.validate()?;
        validate_positions(positions)?;

        let classify = |position: &Vec3| {
            if self.is_cancelled() {
                return Err(SkinError::Cancelled);
            }
            Ok(classify_vertex(skeleton, *position))
        };

        let parallel = positions.len() >= self.parallel_threshold;
        let classes: Vec<Classification> = if parallel {
            positions.par_iter().map(classify).collect::<Result<_, _>>()?
        } else {
            positions.iter().map(classify).collect::<Result<_, _>>()?
        };

        let mut store = WeightStore::new();
        let mut report = AssignReport {
            vertex_count: positions.len(),
            bone_count: skeleton.len(),
            ..Default::default()
        };

        for (vertex, class) in classes.iter().enumerate() {
            let weight = class.weight();
            for &bone in &class.bones {
                store.set(&skeleton.bones()[bone].name, vertex, weight);
            }
            if class.fallback {
                report.fallback_vertices += 1;
            }
            report.max_influences = report.max_influences.max(class.bones.len());
        }

        tracing::debug!(
            vertices = report.vertex_count,
            bones = report.bone_count,
            fallback = report.fallback_vertices,
            max_influences = report.max_influences,
            parallel,
            "assigned envelope weights"
        );

        Ok((store, report))
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Replace the weight store of `mesh` with envelope weights from `skeleton`.
///
/// Shorthand for [`EnvelopeAssignor::default`] followed by
/// [`EnvelopeAssignor::assign`].
pub fn assign_weights(skeleton: &Skeleton, mesh: &mut Mesh) -> Result<AssignReport, SkinError> {
    EnvelopeAssignor::default().assign(skeleton, mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Bone;

    fn z_bone(name: &str, x: f32, radius: f32) -> Bone {
        Bone::new(name, Vec3::new(x, 0.0, 0.0), Vec3::new(x, 0.0, 1.0)).with_radii(radius, radius)
    }

    #[test]
    fn test_single_bone_envelope() {
        let skeleton = Skeleton::new(vec![z_bone("bone", 0.0, 0.5)]);
        let mut mesh = Mesh::new(vec![Vec3::new(0.1, 0.0, 0.5)]);

        let report = assign_weights(&skeleton, &mut mesh).unwrap();
        assert_eq!(mesh.weights().get("bone", 0), Some(1.0));
        assert_eq!(report.fallback_vertices, 0);
        assert_eq!(report.max_influences, 1);
    }

    #[test]
    fn test_overlapping_envelopes_split_evenly() {
        let skeleton = Skeleton::new(vec![z_bone("a", 0.0, 0.5), z_bone("b", 0.4, 0.5)]);
        let mut mesh = Mesh::new(vec![Vec3::new(0.2, 0.0, 0.5)]);

        assign_weights(&skeleton, &mut mesh).unwrap();
        assert_eq!(mesh.weights().get("a", 0), Some(0.5));
        assert_eq!(mesh.weights().get("b", 0), Some(0.5));
    }

    #[test]
    fn test_zero_radius_falls_back_to_only_bone() {
        let skeleton = Skeleton::new(vec![z_bone("bone", 0.0, 0.0)]);
        let mut mesh = Mesh::new(vec![Vec3::new(7.0, -3.0, 2.0), Vec3::new(0.0, 0.0, 0.5)]);

        let report = assign_weights(&skeleton, &mut mesh).unwrap();
        assert_eq!(mesh.weights().get("bone", 0), Some(1.0));
        assert_eq!(mesh.weights().get("bone", 1), Some(1.0));
        assert_eq!(report.fallback_vertices, 2);
    }

    #[test]
    fn test_fallback_picks_closest_bone() {
        let skeleton = Skeleton::new(vec![
            z_bone("far", 0.0, 0.1),
            z_bone("near", 2.0, 0.1),
        ]);
        let mut mesh = Mesh::new(vec![Vec3::new(1.5, 0.0, 0.5)]);

        assign_weights(&skeleton, &mut mesh).unwrap();
        assert_eq!(mesh.weights().get("near", 0), Some(1.0));
        assert_eq!(mesh.weights().get("far", 0), None);
    }

    #[test]
    fn test_fallback_tie_goes_to_first_bone() {
        let skeleton = Skeleton::new(vec![
            z_bone("left", -1.0, 0.0),
            z_bone("right", 1.0, 0.0),
        ]);
        let class = classify_vertex(&skeleton, Vec3::new(0.0, 0.0, 0.5));
        assert!(class.fallback);
        assert_eq!(class.bones.as_slice(), &[0]);
    }

    #[test]
    fn test_tiny_radius_is_no_envelope() {
        let skeleton = Skeleton::new(vec![
            z_bone("tiny", 0.0, 1e-7),
            z_bone("wide", 0.5, 1.0),
        ]);
        // On the tiny bone's axis: distance 0 but its envelope is ignored
        let class = classify_vertex(&skeleton, Vec3::new(0.0, 0.0, 0.5));
        assert!(!class.fallback);
        assert_eq!(class.bones.as_slice(), &[1]);
    }

    #[test]
    fn test_minimum_radius_is_an_envelope() {
        let skeleton = Skeleton::new(vec![
            z_bone("thin", 0.0, MIN_ENVELOPE_RADIUS),
            z_bone("far", 5.0, 0.5),
        ]);
        let class = classify_vertex(&skeleton, Vec3::new(0.0, 0.0, 0.5));
        assert!(!class.fallback);
        assert_eq!(class.bones.as_slice(), &[0]);
    }

    #[test]
    fn test_boundary_is_inside() {
        let skeleton = Skeleton::new(vec![z_bone("bone", 0.0, 0.5), z_bone("other", 5.0, 0.5)]);
        let class = classify_vertex(&skeleton, Vec3::new(0.5, 0.0, 0.5));
        assert!(!class.fallback);
        assert_eq!(class.bones.as_slice(), &[0]);
    }

    #[test]
    fn test_empty_mesh_clears_store() {
        let skeleton = Skeleton::new(vec![z_bone("bone", 0.0, 0.5)]);
        let mut mesh = Mesh::new(Vec::new());
        let mut stale = WeightStore::new();
        stale.set("bone", 0, 1.0);
        mesh.replace_weights(stale);

        let report = assign_weights(&skeleton, &mut mesh).unwrap();
        assert!(mesh.weights().is_empty());
        assert_eq!(
            report,
            AssignReport {
                vertex_count: 0,
                bone_count: 1,
                fallback_vertices: 0,
                max_influences: 0,
            }
        );
    }

    #[test]
    fn test_rerun_drops_stale_weights() {
        let mut mesh = Mesh::new(vec![Vec3::new(0.0, 0.0, 0.5)]);
        let before = Skeleton::new(vec![z_bone("a", 0.0, 0.5), z_bone("b", 0.1, 0.5)]);
        assign_weights(&before, &mut mesh).unwrap();
        assert_eq!(mesh.weights().get("b", 0), Some(0.5));

        let after = Skeleton::new(vec![z_bone("a", 0.0, 0.5), z_bone("b", 3.0, 0.5)]);
        assign_weights(&after, &mut mesh).unwrap();
        assert_eq!(mesh.weights().get("a", 0), Some(1.0));
        assert_eq!(mesh.weights().get("b", 0), None);
    }

    #[test]
    fn test_empty_skeleton_leaves_store_untouched() {
        let mut mesh = Mesh::new(vec![Vec3::ZERO]);
        let mut previous = WeightStore::new();
        previous.set("old", 0, 1.0);
        mesh.replace_weights(previous.clone());

        let result = assign_weights(&Skeleton::default(), &mut mesh);
        assert!(matches!(result, Err(SkinError::EmptySkeleton)));
        assert_eq!(mesh.weights(), &previous);
    }

    #[test]
    fn test_nan_vertex_is_rejected() {
        let skeleton = Skeleton::new(vec![z_bone("bone", 0.0, 0.5)]);
        let mut mesh = Mesh::new(vec![Vec3::ZERO, Vec3::new(0.0, f32::NAN, 0.0)]);
        assert!(matches!(
            assign_weights(&skeleton, &mut mesh),
            Err(SkinError::NonFiniteVertex { index: 1 })
        ));
        assert!(mesh.weights().is_empty());
    }

    #[test]
    fn test_cancel_leaves_store_untouched() {
        let skeleton = Skeleton::new(vec![z_bone("bone", 0.0, 0.5)]);
        let mut mesh = Mesh::new(vec![Vec3::ZERO; 16]);
        let mut previous = WeightStore::new();
        previous.set("bone", 0, 1.0);
        mesh.replace_weights(previous.clone());

        let cancel = AtomicBool::new(true);
        let result = EnvelopeAssignor::new()
            .with_cancel_flag(&cancel)
            .assign(&skeleton, &mut mesh);
        assert!(matches!(result, Err(SkinError::Cancelled)));
        assert_eq!(mesh.weights(), &previous);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let skeleton = Skeleton::new(vec![
            z_bone("a", 0.0, 0.6),
            z_bone("b", 0.5, 0.6),
            z_bone("c", 1.0, 0.0),
        ]);
        let positions: Vec<Vec3> = (0..500)
            .map(|i| {
                let f = i as f32 * 0.01;
                Vec3::new(f.sin() * 1.5, f.cos(), f * 0.2)
            })
            .collect();

        let (sequential, _) = EnvelopeAssignor::new()
            .with_parallel_threshold(usize::MAX)
            .compute(&skeleton, &positions)
            .unwrap();
        let (parallel, _) = EnvelopeAssignor::new()
            .with_parallel_threshold(0)
            .compute(&skeleton, &positions)
            .unwrap();
        assert_eq!(sequential, parallel);
    }
}
