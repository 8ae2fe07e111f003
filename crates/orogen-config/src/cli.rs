//! Command-line argument parsing for the terrain pipeline.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Terrain pipeline command-line arguments.
///
/// CLI values override settings loaded from the config file.
#[derive(Parser, Debug)]
#[command(name = "orogen", about = "Orogen terrain pipeline")]
pub struct CliArgs {
    /// Grid columns.
    #[arg(long)]
    pub nx: Option<usize>,

    /// Grid rows.
    #[arg(long)]
    pub ny: Option<usize>,

    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fractal variant (brownian, ridge, hetero, hybrid, ridged).
    #[arg(long)]
    pub kind: Option<String>,

    /// Thermal weathering passes.
    #[arg(long)]
    pub thermal_passes: Option<u32>,

    /// Stream-power erosion iterations.
    #[arg(long)]
    pub stream_power_iterations: Option<u32>,

    /// Impact events to simulate.
    #[arg(long)]
    pub impacts: Option<u32>,

    /// Output directory for exported images.
    #[arg(long)]
    pub output: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to a config file (overrides the default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Heightmap image to load instead of synthesizing terrain.
    #[arg(long)]
    pub heightmap: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(nx) = args.nx {
            self.grid.nx = nx;
        }
        if let Some(ny) = args.ny {
            self.grid.ny = ny;
        }
        if let Some(seed) = args.seed {
            self.noise.seed = seed;
        }
        if let Some(ref kind) = args.kind {
            self.noise.kind = kind.clone();
        }
        if let Some(passes) = args.thermal_passes {
            self.erosion.thermal_passes = passes;
        }
        if let Some(iterations) = args.stream_power_iterations {
            self.erosion.stream_power_iterations = iterations;
        }
        if let Some(count) = args.impacts {
            self.impact.count = count;
        }
        if let Some(ref dir) = args.output {
            self.output.directory = dir.clone();
        }
        if let Some(ref level) = args.log_level {
            self.output.log_level = level.clone();
        }
    }
}
