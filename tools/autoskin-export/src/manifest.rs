//! autoskin.toml manifest parsing
//!
//! A manifest lists weighting jobs that share output settings and default
//! envelope radii.

use anyhow::{Context, Result, bail};
use autoskin_core::MAX_PACKED_INFLUENCES;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::formats::WeightFormat;
use crate::skeleton::RadiusDefaults;
use crate::transform::ObjectTransform;

/// autoskin.toml manifest structure
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub defaults: RadiusDefaults,
    #[serde(default)]
    pub jobs: Vec<JobEntry>,
}

/// Output configuration section
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Output directory, relative to the manifest.
    /// Default: "weights"
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Default output format for jobs that do not choose one.
    /// Default: json
    #[serde(default)]
    pub format: WeightFormat,

    /// Bone slots per vertex in packed output (1-4).
    /// Default: 4
    #[serde(default = "default_max_influences")]
    pub max_influences: usize,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("weights")
}

fn default_max_influences() -> usize {
    MAX_PACKED_INFLUENCES
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            format: WeightFormat::default(),
            max_influences: default_max_influences(),
        }
    }
}

/// Single weighting job
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobEntry {
    /// Output file stem, unique within the manifest
    pub id: String,
    /// Skeleton source (.toml, .gltf, .glb)
    pub skeleton: PathBuf,
    /// Mesh source (.obj, .gltf, .glb)
    pub mesh: PathBuf,

    /// Skin name to read from a glTF skeleton.
    /// If not specified, uses the first skin in the file.
    #[serde(default)]
    pub skin_name: Option<String>,

    /// Mesh name to read from a glTF mesh source.
    /// If not specified, uses the first mesh in the file.
    #[serde(default)]
    pub mesh_name: Option<String>,

    /// Object-to-world transform of the mesh
    #[serde(default)]
    pub mesh_transform: ObjectTransform,

    /// Object-to-world transform of the skeleton
    #[serde(default)]
    pub skeleton_transform: ObjectTransform,

    /// Output format override for this job
    #[serde(default)]
    pub format: Option<WeightFormat>,
}

impl Manifest {
    /// Load manifest from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse manifest from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse autoskin.toml")
    }

    /// Check settings and job references without touching any asset.
    ///
    /// Relative job paths are resolved against `base_dir` when checking that
    /// inputs exist.
    pub fn validate(&self, base_dir: &Path) -> Result<()> {
        if !(1..=MAX_PACKED_INFLUENCES).contains(&self.output.max_influences) {
            bail!(
                "output.max_influences must be between 1 and {}, got {}",
                MAX_PACKED_INFLUENCES,
                self.output.max_influences
            );
        }

        for (field, value) in [
            ("head_radius", self.defaults.head_radius),
            ("tail_radius", self.defaults.tail_radius),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("defaults.{} must be a non-negative number, got {}", field, value);
            }
        }

        if self.jobs.is_empty() {
            bail!("Manifest defines no jobs");
        }

        let mut ids = HashSet::new();
        for job in &self.jobs {
            if job.id.is_empty() {
                bail!("Job id must not be empty");
            }
            // The id names the output file inside the output directory
            if job.id.contains(['/', '\\']) || job.id == "." || job.id == ".." {
                bail!("Job id '{}' must be a plain file name", job.id);
            }
            if !ids.insert(job.id.as_str()) {
                bail!("Duplicate job id '{}'", job.id);
            }
            for (kind, path) in [("skeleton", &job.skeleton), ("mesh", &job.mesh)] {
                let resolved = base_dir.join(path);
                if !resolved.is_file() {
                    bail!(
                        "Job '{}': {} file not found: {}",
                        job.id,
                        kind,
                        resolved.display()
                    );
                }
            }
        }

        Ok(())
    }
}

impl JobEntry {
    /// Output format of this job, falling back to the manifest default
    pub fn format_or(&self, default: WeightFormat) -> WeightFormat {
        self.format.unwrap_or(default)
    }
}
