//! Pneumo CLI
//!
//! Inspect the 3D view layer without a host application: solve the
//! suspension, replay settings payloads, dump composed shaders and probe the
//! local GPU adapter.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pneumo_3d::render::{ShaderId, ShaderLibrary};
use pneumo_3d::{Capabilities, Corner, FrameSnapshot, SceneView};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::PneumoConfig;

#[derive(Parser)]
#[command(name = "pneumo")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "PneumoStabSim 3D view tools", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./pneumo.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the four suspension corners
    Solve {
        /// Lever angle in degrees, applied to every corner
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        angle: f32,

        /// Evaluate the built-in animation at this time instead
        #[arg(short, long)]
        time: Option<f32>,

        /// Settings payload applied before solving
        #[arg(short, long)]
        payload: Option<PathBuf>,

        /// Print the full frame as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply a settings payload and print the resulting state
    Apply {
        /// JSON payload file, `-` for stdin
        payload: String,

        /// Print settings and effects as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a composed WGSL shader
    Shader {
        /// Shader name (passthrough, bloom, ssao, depth_of_field, motion_blur)
        name: String,

        /// Validate the module instead of printing it
        #[arg(long)]
        validate: bool,
    },

    /// Probe the GPU adapter for scene texture support
    Probe {
        /// Preferred adapter
        #[arg(short, long, value_enum, default_value = "high-performance")]
        power: PowerPreference,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PowerPreference {
    LowPower,
    HighPerformance,
}

impl From<PowerPreference> for wgpu::PowerPreference {
    fn from(power: PowerPreference) -> Self {
        match power {
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = match &cli.config {
        Some(path) => PneumoConfig::load(path)?,
        None => PneumoConfig::load_from_dir(Path::new("."))?,
    };

    match cli.command {
        Commands::Solve {
            angle,
            time,
            payload,
            json,
        } => cmd_solve(&config, angle, time, payload.as_deref(), json),

        Commands::Apply { payload, json } => cmd_apply(&config, &payload, json),

        Commands::Shader { name, validate } => cmd_shader(&name, validate),

        Commands::Probe { power } => cmd_probe(&config, power),
    }
}

/// View initialized from the configuration
fn scene_view(config: &PneumoConfig) -> Result<SceneView> {
    let mut view = SceneView::new();
    view.initialize(&config.capabilities());

    let payload = config.payload()?;
    let summary = view.apply_batch(&payload);
    if !summary.is_empty() {
        info!("config scene: {}", summary);
    }
    Ok(view)
}

fn read_payload(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read payload from stdin")?;
        return Ok(text);
    }
    fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))
}

fn cmd_solve(
    config: &PneumoConfig,
    angle: f32,
    time: Option<f32>,
    payload: Option<&Path>,
    json: bool,
) -> Result<()> {
    let mut view = scene_view(config)?;

    if let Some(path) = payload {
        let text = read_payload(&path.to_string_lossy())?;
        let summary = view.apply_batch_json(&text)?;
        info!("{}", summary);
    }

    view.set_lever_angles([angle; 4]);
    if let Some(t) = time {
        if !view.settings().animation.is_running {
            warn!("animation is not running, --time only moves the clock");
        }
        view.advance(t);
    }

    let frame = view.frame();
    if json {
        println!("{}", serde_json::to_string_pretty(&frame)?);
    } else {
        print_frame(&frame);
    }
    Ok(())
}

fn print_frame(frame: &FrameSnapshot) {
    println!("t = {:.3}s", frame.time);
    println!(
        "{:<6} {:>9} {:>10} {:>10} {:>9}  joint",
        "corner", "angle", "piston", "rod len", "error"
    );
    for corner in Corner::ALL {
        let c = frame.corner(corner);
        let g = &c.geometry;
        println!(
            "{:<6} {:>9.2} {:>10.2} {:>10.2} {:>9.4}  {}",
            corner.key(),
            g.total_angle_deg,
            g.piston_position,
            g.actual_rod_length,
            g.rod_length_error,
            if g.within_tolerance() { "ok" } else { "warn" }
        );
    }
    println!("max rod length error: {:.4}", frame.max_rod_length_error());
    for (kind, mode) in &frame.passes {
        println!("{:<12} {:?}", kind.name(), mode);
    }
}

fn cmd_apply(config: &PneumoConfig, source: &str, json: bool) -> Result<()> {
    let mut view = scene_view(config)?;
    let text = read_payload(source)?;
    let summary = view.apply_batch_json(&text)?;

    println!("{}", summary);
    if json {
        let effects = view.effects();
        let state = serde_json::json!({
            "settings": view.settings(),
            "effects": {
                "ssao": effects.ssao,
                "bloom": effects.bloom,
                "depth_of_field": effects.depth_of_field,
                "motion_blur": effects.motion_blur,
            },
        });
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        for line in view.effects().diagnostics() {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_shader(name: &str, validate: bool) -> Result<()> {
    let id = ShaderId::from_name(name).with_context(|| {
        let known: Vec<&str> = ShaderId::ALL.iter().map(|id| id.name()).collect();
        format!("Unknown shader '{}'. Known shaders: {}", name, known.join(", "))
    })?;
    let source = ShaderLibrary::compose(id);

    if !validate {
        println!("{}", source);
        return Ok(());
    }

    let module = naga::front::wgsl::parse_str(&source)
        .map_err(|err| anyhow::anyhow!("{}", err.emit_to_string(&source)))?;
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );
    validator
        .validate(&module)
        .map_err(|err| anyhow::anyhow!("{:?}", err))
        .with_context(|| format!("Shader '{}' failed validation", name))?;

    println!(
        "{}: ok ({} entry points, {} bindings)",
        name,
        module.entry_points.len(),
        module
            .global_variables
            .iter()
            .filter(|(_, var)| var.binding.is_some())
            .count()
    );
    Ok(())
}

fn cmd_probe(config: &PneumoConfig, power: PowerPreference) -> Result<()> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: power.into(),
        force_fallback_adapter: false,
        compatible_surface: None,
    }))
    .context("No GPU adapter found")?;

    let adapter_info = adapter.get_info();
    println!(
        "adapter: {} ({:?}, {:?})",
        adapter_info.name, adapter_info.backend, adapter_info.device_type
    );

    let detected = Capabilities::detect(&adapter);
    let declared = config.capabilities();
    println!(
        "textures: depth={} normal={} velocity={}",
        detected.depth, detected.normal, detected.velocity
    );

    // The host may still decline to provide a texture the adapter supports
    let effective = Capabilities {
        depth: detected.depth && declared.depth,
        normal: detected.normal && declared.normal,
        velocity: detected.velocity && declared.velocity,
    };
    if effective != detected {
        info!("config restricts capabilities to {:?}", effective);
    }

    let mut view = SceneView::new();
    view.initialize(&effective);
    for line in view.effects().diagnostics() {
        println!("{}", line);
    }
    Ok(())
}
