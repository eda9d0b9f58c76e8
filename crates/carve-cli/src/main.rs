//! carve CLI - export and inspect the carved cube
//!
//! Builds the unit cube minus a centred sphere at a given radius and writes
//! it as GLB or STL, or reports its geometry.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use carve_export::{to_stl_ascii, to_stl_binary, MemoryStore};
use carve_kernel::{Kernel, PayloadSource};
use carve_pipeline::{
    build_cut_solid, BuiltinEngineFactory, LoadOptions, ModelPipeline, PipelineError,
    ShapeParameter, SliderSpec,
};
use tracing::{debug, info};

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "carve")]
#[command(about = "Parametric cube-minus-sphere model tool", long_about = None)]
struct Cli {
    /// Path to a carve.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the model at one radius
    Export {
        /// Sphere radius (default: config or slider default)
        #[arg(short, long)]
        radius: Option<f64>,
        /// Output file (format determined by extension: .glb, .stl)
        #[arg(short, long)]
        output: PathBuf,
        /// Write ASCII STL
        #[arg(long)]
        ascii: bool,
    },
    /// Build every slider stop and report the results
    Sweep {
        /// Slider increment (default: the slider's own step)
        #[arg(long)]
        step: Option<f64>,
    },
    /// Display volume, bounds and triangle count at one radius
    Info {
        /// Sphere radius (default: config or slider default)
        #[arg(short, long)]
        radius: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    debug!(?config, "configuration loaded");
    let mut pipeline = open_pipeline(&config)?;

    match cli.command {
        Commands::Export {
            radius,
            output,
            ascii,
        } => {
            let radius = config.radius(radius)?;
            let ascii = ascii || config.export.ascii_stl;
            export_model(&mut pipeline, radius, &output, ascii)?;
        }
        Commands::Sweep { step } => {
            sweep(engine(&pipeline)?, slider(step)?);
        }
        Commands::Info { radius } => {
            show_info(engine(&pipeline)?, config.radius(radius)?)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

type CliPipeline = ModelPipeline<Kernel, MemoryStore>;

/// Initialize a pipeline whose kernel payload is the config's `[kernel]` table.
fn open_pipeline(config: &Config) -> Result<CliPipeline> {
    let profile = toml::to_string(&config.kernel)?;
    let options = LoadOptions::new(move |_| Some(PayloadSource::Inline(profile.clone())));
    let mut pipeline = ModelPipeline::new(MemoryStore::new());

    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    runtime.block_on(pipeline.initialize(&BuiltinEngineFactory, &options))?;
    Ok(pipeline)
}

fn engine(pipeline: &CliPipeline) -> Result<&Kernel> {
    pipeline
        .engine()
        .ok_or_else(|| PipelineError::NotInitialized.into())
}

fn slider(step: Option<f64>) -> Result<SliderSpec> {
    let spec = SliderSpec::RADIUS;
    let Some(step) = step else {
        return Ok(spec);
    };
    if !(step.is_finite() && step > 0.0 && step <= spec.max - spec.min) {
        bail!("step must be in (0, {}], got {step}", spec.max - spec.min);
    }
    Ok(SliderSpec { step, ..spec })
}

fn export_model(
    pipeline: &mut CliPipeline,
    radius: ShapeParameter,
    output: &Path,
    ascii: bool,
) -> Result<()> {
    let ext = output.extension().and_then(|e| e.to_str()).unwrap_or("");
    let bytes = match ext.to_lowercase().as_str() {
        "glb" => {
            let reference = pipeline.recompute(radius)?;
            let resource = pipeline
                .store()
                .get(&reference)
                .with_context(|| format!("{reference} missing from store"))?;
            resource.bytes.clone()
        }
        "stl" => {
            let kernel = engine(pipeline)?;
            let solid = build_cut_solid(kernel, radius)?;
            let mesh = kernel.tessellate(&solid)?;
            if ascii {
                to_stl_ascii(&mesh, &format!("carve_r{radius}"))?.into_bytes()
            } else {
                to_stl_binary(&mesh)?
            }
        }
        _ => {
            bail!("Unknown output format: {}", ext);
        }
    };

    fs::write(output, &bytes).with_context(|| format!("writing {}", output.display()))?;
    info!(%radius, bytes = bytes.len(), "exported");
    println!("Exported radius {radius} to {}", output.display());
    Ok(())
}

/// One row of a sweep report.
#[derive(Debug, Clone, PartialEq)]
struct SweepRow {
    radius: ShapeParameter,
    outcome: std::result::Result<(usize, f64), String>,
}

fn sweep_rows(kernel: &Kernel, spec: SliderSpec) -> Vec<SweepRow> {
    spec.stops()
        .map(|radius| {
            let outcome = build_cut_solid(kernel, radius)
                .map(|solid| (solid.num_triangles(), solid.volume()))
                .map_err(|e| e.to_string());
            SweepRow { radius, outcome }
        })
        .collect()
}

fn sweep(kernel: &Kernel, spec: SliderSpec) {
    let rows = sweep_rows(kernel, spec);
    let mut degenerate = 0;
    println!("{:>6}  {:>9}  {:>10}", "radius", "triangles", "volume");
    for row in &rows {
        match &row.outcome {
            Ok((triangles, volume)) => {
                println!("{:>6}  {triangles:>9}  {volume:>10.6}", row.radius.to_string());
            }
            Err(reason) => {
                degenerate += 1;
                println!("{:>6}  degenerate: {reason}", row.radius.to_string());
            }
        }
    }
    println!();
    println!("{} stops, {} degenerate", rows.len(), degenerate);
}

fn show_info(kernel: &Kernel, radius: ShapeParameter) -> Result<()> {
    let solid = build_cut_solid(kernel, radius)?;
    let (min, max) = solid.bounding_box();
    let profile = kernel.profile();

    println!("Carved cube at radius {radius}");
    println!("  Sphere segments: {}", profile.sphere_segments);
    println!("  Polygons: {}", solid.polygons().len());
    println!("  Triangles: {}", solid.num_triangles());
    println!("  Volume: {:.6}", solid.volume());
    println!(
        "  Bounds: ({:.3}, {:.3}, {:.3}) - ({:.3}, {:.3}, {:.3})",
        min[0], min[1], min[2], max[0], max[1], max[2]
    );
    Ok(())
}
