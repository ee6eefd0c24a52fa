//! vbake - bakes textures into vertex colors of OBJ meshes.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use vbake::{BakeConfig, BakeError};
use vbake::session::*;

mod io;
mod sink;

#[derive(Parser)]
#[command(name = "vbake")]
#[command(about = "Bakes textures into mesh vertex colors")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bake a texture into the vertex colors of every object in an OBJ file
    Bake {
        /// Input OBJ file
        input: PathBuf,

        /// Texture applied to every material (PNG/JPG)
        #[arg(short, long)]
        texture: Option<PathBuf>,

        /// Bake settings (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory (overrides output.folder)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed for asset names, for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Mark written files read-only
        #[arg(long)]
        finalize: bool,
    },

    /// Print the default settings as TOML
    Config,

    /// Validate a settings file
    Check {
        /// Bake settings (TOML)
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Bake { input, texture, config, output, seed, finalize } => {
            bake(input, texture, config, output, seed, finalize)
        }
        Commands::Config => {
            print!("{}", BakeConfig::default().to_toml()?);
            Ok(())
        }
        Commands::Check { config } => {
            BakeConfig::load(&config).with_context(|| format!("invalid settings in {}", config.display()))?;
            tracing::info!("{} is valid", config.display());
            Ok(())
        }
    }
}

fn bake(
    input: PathBuf,
    texture: Option<PathBuf>,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    seed: Option<u64>,
    finalize: bool,
) -> Result<()> {
    let mut config = match config {
        Some(path) => BakeConfig::load(&path).with_context(|| format!("failed to load {}", path.display()))?,
        None => BakeConfig::default(),
    };
    if let Some(output) = output {
        config.output.folder = output.to_string_lossy().into_owned();
    }

    let texture = texture.map(io::load_texture).transpose()?.map(Arc::new);
    let mut nodes = io::load_scene(&input, texture, &config.texture.property_name)?;
    tracing::info!("loaded {} object(s) from {}", nodes.len(), input.display());

    let folder = PathBuf::from(&config.output.folder);
    std::fs::create_dir_all(&folder).with_context(|| format!("failed to create {}", folder.display()))?;
    let mut sink = sink::DirectorySink::new(&folder);
    let mut progress = sink::LogProgress::default();

    let mut session = match seed {
        Some(seed) => BakeSession::with_namer(config, AssetNamer::with_seed(seed))?,
        None => BakeSession::new(config)?,
    };

    let result = {
        let mut io = Collaborators { sink: &mut sink, textures: &NoTextureReader, progress: &mut progress };
        session.process_batch(&mut nodes, &mut io)
    };
    let report = match result {
        Ok(report) => report,
        Err(err) => return Err(rollback_after_abort(&mut session, &mut nodes, &mut sink, err)),
    };

    for skipped in &report.skipped {
        tracing::warn!("skipped '{}': {}", skipped.name, skipped.error);
    }
    let stats = session.stats();
    tracing::info!(
        "baked {} mesh(es): {} -> {} -> {} vertices",
        report.completed.len(),
        stats.vertices_before,
        stats.vertices_after_processing,
        stats.vertices_after_optimization
    );
    for path in session.created_paths() {
        tracing::info!("wrote {path}");
    }

    if finalize {
        let count = session.finalize_created(&mut sink)?;
        tracing::info!("finalized {count} file(s)");
    }
    Ok(())
}

/// Undoes a failed batch. A failing rollback is only logged, the abort cause is what gets reported.
fn rollback_after_abort(
    session: &mut BakeSession,
    nodes: &mut [MeshNode],
    sink: &mut dyn PersistenceSink,
    err: BakeError,
) -> anyhow::Error {
    match session.rollback(nodes, sink) {
        Ok(rollback) => tracing::warn!("removed {} file(s) written before the failure", rollback.deleted),
        Err(rollback_err) => tracing::error!("rollback failed, some files may remain: {rollback_err}"),
    }
    anyhow::Error::new(err).context("bake aborted")
}
