//! Weighting jobs: load inputs, assign weights, write the result

use anyhow::{Context, Result};
use autoskin_core::{
    AssignReport, EnvelopeAssignor, Mesh, Skeleton, WeightStore, pack_weight_store,
};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::formats::{WeightFormat, WeightsDocument, write_packed_weights, write_weights_json};
use crate::manifest::{JobEntry, Manifest};
use crate::mesh::load_positions;
use crate::skeleton::{RadiusDefaults, load_skeleton};
use crate::transform::ObjectTransform;

/// Everything needed to weight one mesh
#[derive(Debug, Clone)]
pub struct SkinJob {
    pub skeleton: PathBuf,
    pub mesh: PathBuf,
    pub skin_name: Option<String>,
    pub mesh_name: Option<String>,
    pub mesh_transform: ObjectTransform,
    pub skeleton_transform: ObjectTransform,
    pub radius_defaults: RadiusDefaults,
}

impl SkinJob {
    pub fn new(skeleton: impl Into<PathBuf>, mesh: impl Into<PathBuf>) -> Self {
        Self {
            skeleton: skeleton.into(),
            mesh: mesh.into(),
            skin_name: None,
            mesh_name: None,
            mesh_transform: ObjectTransform::default(),
            skeleton_transform: ObjectTransform::default(),
            radius_defaults: RadiusDefaults::default(),
        }
    }

    /// Job for a manifest entry, with paths resolved against `base_dir`
    pub fn from_entry(entry: &JobEntry, base_dir: &Path, defaults: RadiusDefaults) -> Self {
        Self {
            skeleton: base_dir.join(&entry.skeleton),
            mesh: base_dir.join(&entry.mesh),
            skin_name: entry.skin_name.clone(),
            mesh_name: entry.mesh_name.clone(),
            mesh_transform: entry.mesh_transform,
            skeleton_transform: entry.skeleton_transform,
            radius_defaults: defaults,
        }
    }
}

/// Result of in-memory weighting
#[derive(Debug, Clone)]
pub struct SkinnedWeights {
    /// Skeleton in the shared (world) space
    pub skeleton: Skeleton,
    pub vertex_count: usize,
    pub weights: WeightStore,
    pub report: AssignReport,
}

/// Load the job's inputs and compute weights without writing anything
pub fn convert_to_memory(job: &SkinJob) -> Result<SkinnedWeights> {
    let mut skeleton = load_skeleton(&job.skeleton, job.skin_name.as_deref(), job.radius_defaults)
        .with_context(|| format!("Failed to load skeleton: {:?}", job.skeleton))?;
    if !job.skeleton_transform.is_identity() {
        skeleton = skeleton.transformed(job.skeleton_transform.to_mat4());
    }

    let positions = load_positions(&job.mesh, job.mesh_name.as_deref())
        .with_context(|| format!("Failed to load mesh: {:?}", job.mesh))?;
    let mut mesh = Mesh::new(positions);
    if !job.mesh_transform.is_identity() {
        mesh.transform(job.mesh_transform.to_mat4());
    }

    let report = EnvelopeAssignor::new()
        .assign(&skeleton, &mut mesh)
        .with_context(|| format!("Failed to assign weights for {:?}", job.mesh))?;

    if report.fallback_vertices > 0 {
        tracing::warn!(
            "{} of {} vertices lie outside every bone envelope; bound to closest bone",
            report.fallback_vertices,
            report.vertex_count
        );
    }

    Ok(SkinnedWeights {
        vertex_count: mesh.vertex_count(),
        weights: mesh.take_weights(),
        skeleton,
        report,
    })
}

/// Compute weights for `job` and write them to `output`
pub fn run_job(
    job: &SkinJob,
    output: &Path,
    format: WeightFormat,
    max_influences: usize,
) -> Result<AssignReport> {
    let skinned = convert_to_memory(job)?;

    // Encode fully before touching the output path
    let mut encoded = Vec::new();
    match format {
        WeightFormat::Json => {
            let document = WeightsDocument::new(
                &skinned.skeleton,
                skinned.vertex_count,
                skinned.weights,
            );
            write_weights_json(&mut encoded, &document)?;
        }
        WeightFormat::Packed => {
            let packed = pack_weight_store(
                &skinned.weights,
                &skinned.skeleton,
                skinned.vertex_count,
                max_influences,
            )?;
            if packed.truncated_vertices > 0 {
                tracing::warn!(
                    "{} vertices had more than {} influences; kept the first {} in skeleton order",
                    packed.truncated_vertices,
                    max_influences,
                    max_influences
                );
            }
            write_packed_weights(&mut encoded, skinned.skeleton.len(), &packed.vertices)?;
        }
    }

    std::fs::write(output, &encoded)
        .with_context(|| format!("Failed to write output: {:?}", output))?;

    tracing::info!(
        "Weighted {} vertices against {} bones ({} fallback, up to {} influences)",
        skinned.report.vertex_count,
        skinned.report.bone_count,
        skinned.report.fallback_vertices,
        skinned.report.max_influences
    );

    Ok(skinned.report)
}

/// Run every job of a manifest in parallel
///
/// # Arguments
/// * `manifest` - Parsed manifest
/// * `manifest_dir` - Directory relative paths are resolved against
/// * `output_override` - Output directory replacing `output.dir`
pub fn build_all(
    manifest: &Manifest,
    manifest_dir: &Path,
    output_override: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    manifest.validate(manifest_dir)?;

    let output_dir = match output_override {
        Some(dir) => dir.to_path_buf(),
        None => manifest_dir.join(&manifest.output.dir),
    };
    std::fs::create_dir_all(&output_dir).with_context(|| {
        format!("Failed to create output directory: {}", output_dir.display())
    })?;

    manifest
        .jobs
        .par_iter()
        .map(|entry| -> Result<PathBuf> {
            let job = SkinJob::from_entry(entry, manifest_dir, manifest.defaults);
            let format = entry.format_or(manifest.output.format);
            let output = output_dir.join(format!("{}.{}", entry.id, format.extension()));

            tracing::info!("[{}] {:?} -> {:?}", entry.id, job.mesh, output);
            run_job(&job, &output, format, manifest.output.max_influences)
                .with_context(|| format!("Job '{}' failed", entry.id))?;
            Ok(output)
        })
        .collect()
}
