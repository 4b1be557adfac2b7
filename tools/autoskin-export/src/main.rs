//! autoskin-export - automatic envelope skin weights
//!
//! Computes per-vertex bone weights for meshes (OBJ, glTF) against skeletons
//! (TOML bone lists, glTF skins) and writes them as JSON or packed
//! vertex skinning data (.skw).

use anyhow::{Result, bail};
use autoskin_core::MAX_PACKED_INFLUENCES;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use autoskin_export::{
    Manifest, RadiusDefaults, SkinJob, WeightFormat, build_all, load_skeleton, run_job,
    skeleton::list_bones,
};

#[derive(Parser)]
#[command(name = "autoskin-export")]
#[command(about = "Automatic envelope skin weight tool")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Weight every job in a manifest file
    Build {
        /// Path to autoskin.toml manifest
        #[arg(default_value = "autoskin.toml")]
        manifest: PathBuf,

        /// Output directory (overrides manifest)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate manifest without building
    Check {
        /// Path to autoskin.toml manifest
        #[arg(default_value = "autoskin.toml")]
        manifest: PathBuf,
    },

    /// Weight a single mesh against a skeleton
    Weights {
        /// Skeleton file (.toml/.gltf/.glb)
        skeleton: PathBuf,

        /// Mesh file (.obj/.gltf/.glb)
        mesh: PathBuf,

        /// Output file (default: mesh path with the format's extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = WeightFormat::Json)]
        format: WeightFormat,

        /// Bone slots per vertex in packed output (1-4)
        #[arg(long, default_value_t = MAX_PACKED_INFLUENCES)]
        max_influences: usize,

        /// Head radius for bones without one
        #[arg(long, default_value_t = 0.0)]
        head_radius: f32,

        /// Tail radius for bones without one
        #[arg(long, default_value_t = 0.0)]
        tail_radius: f32,

        /// Skin name in a glTF skeleton (default: first skin)
        #[arg(short, long)]
        skin: Option<String>,
    },

    /// List the bones of a skeleton file
    Bones {
        /// Skeleton file (.toml/.gltf/.glb)
        input: PathBuf,

        /// Skin name in a glTF skeleton (default: first skin)
        #[arg(short, long)]
        skin: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match cli.command {
        Commands::Build { manifest, output } => {
            tracing::info!("Building weights from {:?}", manifest);
            let config = Manifest::load(&manifest)?;
            let outputs = build_all(&config, manifest_dir(&manifest), output.as_deref())?;
            tracing::info!("Build complete! {} weight files written", outputs.len());
        }

        Commands::Check { manifest } => {
            tracing::info!("Checking manifest {:?}", manifest);
            let config = Manifest::load(&manifest)?;
            config.validate(manifest_dir(&manifest))?;
            tracing::info!("Manifest is valid!");
        }

        Commands::Weights {
            skeleton,
            mesh,
            output,
            format,
            max_influences,
            head_radius,
            tail_radius,
            skin,
        } => {
            if !(1..=MAX_PACKED_INFLUENCES).contains(&max_influences) {
                bail!(
                    "--max-influences must be between 1 and {}",
                    MAX_PACKED_INFLUENCES
                );
            }

            let output = output.unwrap_or_else(|| mesh.with_extension(format.extension()));
            let mut job = SkinJob::new(skeleton, mesh);
            job.skin_name = skin;
            job.radius_defaults = RadiusDefaults {
                head_radius,
                tail_radius,
            };

            tracing::info!("Weighting {:?} -> {:?}", job.mesh, output);
            run_job(&job, &output, format, max_influences)?;
            tracing::info!("Done!");
        }

        Commands::Bones { input, skin } => {
            let skeleton = load_skeleton(&input, skin.as_deref(), RadiusDefaults::default())?;
            list_bones(&skeleton);
        }
    }

    Ok(())
}

/// Directory relative manifest paths are resolved against
fn manifest_dir(manifest: &Path) -> &Path {
    manifest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}
