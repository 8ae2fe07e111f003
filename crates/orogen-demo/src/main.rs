//! Headless terrain pipeline binary.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI
//! flags. Run with `cargo run -p orogen-demo` for a default 256x256 terrain.
//! Run with `cargo run -p orogen-demo -- --nx 512 --ny 512 --kind ridged`
//! to override the lattice size and fractal variant.
//!
//! The pipeline synthesizes (or imports) a heightfield, erodes it, derives
//! hydrology and accessibility fields, optionally simulates impact events on
//! a layered material stack, scatters vegetation, routes a path across the
//! terrain graph, and exports the results as grayscale images.

use std::path::PathBuf;

use clap::Parser;
use glam::DVec2;
use orogen_config::{CliArgs, Config};
use orogen_field::{
    ErosionOperator, FieldError, HeightField, ImpactEvent, LayeredField, RadialBurn,
    StreamPowerErosion, ThermalWeathering, grid_to_image,
};
use orogen_graph::{GraphError, TerrainGraph};
use orogen_noise::{FractalKind, FractalParams};
use orogen_scatter::{BlueNoiseSampler, Response, SpeciesDef, SpeciesId, VegetationPlacer};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info, warn};

/// A stage failure with enough context to diagnose from the log alone.
type StageError = Box<dyn std::error::Error>;

fn fractal_kind(config: &orogen_config::NoiseConfig) -> Result<FractalKind, StageError> {
    let kind = match config.kind.as_str() {
        "brownian" => FractalKind::Brownian,
        "ridge" => FractalKind::Ridge,
        "hetero" => FractalKind::HeteroTerrain {
            h: config.h,
            lacunarity: config.lacunarity,
        },
        "hybrid" => FractalKind::HybridMultifractal {
            h: config.h,
            lacunarity: config.lacunarity,
        },
        "ridged" => FractalKind::RidgedMultifractal {
            h: config.h,
            lacunarity: config.lacunarity,
        },
        other => return Err(format!("unknown fractal kind {other:?}").into()),
    };
    Ok(kind)
}

/// Synthesize the base terrain, or import it from a grayscale image.
fn build_heightfield(config: &Config, args: &CliArgs) -> Result<HeightField, StageError> {
    let bl = DVec2::ZERO;
    let tr = DVec2::splat(config.grid.extent);

    if let Some(ref path) = args.heightmap {
        let field = HeightField::from_image(
            path,
            config.grid.nx,
            config.grid.ny,
            bl,
            tr,
            0.0,
            config.noise.amplitude,
        )?;
        return Ok(field);
    }

    let params = FractalParams {
        amplitude: config.noise.amplitude,
        frequency: config.noise.frequency,
        octaves: config.noise.octaves,
        kind: fractal_kind(&config.noise)?,
        ..Default::default()
    };
    let field = HeightField::from_fractal(
        config.grid.nx,
        config.grid.ny,
        bl,
        tr,
        config.noise.seed,
        params,
    )?;
    Ok(field)
}

/// Run thermal weathering followed by stream-power incision.
fn erode(field: &mut HeightField, config: &orogen_config::ErosionConfig) {
    let before = field.total_elevation();

    let thermal = ThermalWeathering {
        strength: config.thermal_strength,
        talus_angle: config.talus_angle,
    };
    for _ in 0..config.thermal_passes {
        thermal.apply(field);
    }
    let after_thermal = field.total_elevation();
    info!(
        passes = config.thermal_passes,
        "thermal weathering done, total elevation {before:.1} -> {after_thermal:.1}"
    );

    let stream = StreamPowerErosion {
        iterations: config.stream_power_iterations,
        amplitude: config.stream_power_amplitude,
    };
    stream.apply(field);
    info!(
        iterations = config.stream_power_iterations,
        "stream-power erosion done, total elevation now {:.1}",
        field.total_elevation()
    );
}

/// Simulate impact events on a layered material stack and return the
/// resulting composite surface.
fn simulate_impacts(field: &HeightField, config: &Config) -> Result<HeightField, FieldError> {
    use rand::Rng;

    let mut layered = LayeredField::new(field.clone());
    let mut rng = ChaCha8Rng::seed_from_u64(config.impact.seed);
    let fire = RadialBurn {
        radius: config.impact.fire_radius,
    };

    let bl = field.grid().bottom_left();
    let tr = field.grid().top_right();
    for n in 0..config.impact.count {
        let position = DVec2::new(
            rng.random_range(bl.x..tr.x),
            rng.random_range(bl.y..tr.y),
        );
        let event = ImpactEvent {
            position,
            strength: config.impact.strength,
            fire_probability: config.impact.fire_probability,
        };
        layered.impact(event, &mut rng, &fire)?;
        info!(n, ?position, "impact simulated");
    }
    Ok(layered.surface())
}

/// Scatter vegetation frames over the terrain.
fn place_vegetation(field: &HeightField, config: &orogen_config::VegetationConfig) -> usize {
    let species = config
        .species
        .iter()
        .enumerate()
        .map(|(idx, s)| SpeciesDef {
            name: s.name.clone(),
            id: SpeciesId(idx as u32),
            slope: response(s.slope),
            wetness: response(s.wetness),
            altitude: response(s.altitude),
            scale_range: s.scale_range,
        })
        .collect();

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut sampler = BlueNoiseSampler::new(config.separation_radius, config.tile_size);
    sampler.generate(&mut rng, config.max_tries);
    info!(
        points = sampler.points().len(),
        "blue-noise tile generated"
    );

    let placer = VegetationPlacer::new(species);
    let frames = placer.place(field, &sampler, &mut rng);
    info!(frames = frames.len(), "vegetation placed");
    frames.len()
}

fn response(t: (f64, f64, f64, f64)) -> Response {
    Response {
        lo: t.0,
        lo_full: t.1,
        hi_full: t.2,
        hi: t.3,
    }
}

/// Route a path from the bottom-left to the top-right grid corner.
fn route_path(field: &HeightField) {
    let graph = TerrainGraph::from_field(field);
    let source = graph.vertex_id(0, 0);
    let target = graph.vertex_id(field.ny() - 1, field.nx() - 1);
    match graph.shortest_path(source, target) {
        Ok(path) => {
            let points = graph.waypoints(field, &path);
            let (start, end) = (points[0], points[points.len() - 1]);
            info!(
                hops = path.vertices.len(),
                weight = path.total_weight,
                start = %start,
                end = %end,
                "corner-to-corner path found"
            );
        }
        Err(GraphError::Unreachable { source, target }) => {
            warn!(source, target, "no path across terrain");
        }
        Err(e) => warn!("path query failed: {e}"),
    }
}

/// Export the surface and derived fields as grayscale images.
fn export(field: &HeightField, config: &Config) -> Result<(), StageError> {
    let dir = PathBuf::from(&config.output.directory);
    std::fs::create_dir_all(&dir)?;

    field.to_image(&dir.join("height.png"))?;
    grid_to_image(&field.slope(), &dir.join("slope.png"))?;
    grid_to_image(&field.drainage_area(), &dir.join("drainage.png"))?;
    grid_to_image(&field.wetness(), &dir.join("wetness.png"))?;
    grid_to_image(&field.stream_power(), &dir.join("stream_power.png"))?;
    grid_to_image(
        &field.accessibility(config.output.ray_seed, config.output.ray_count),
        &dir.join("accessibility.png"),
    )?;

    info!(?dir, "exports written");
    Ok(())
}

fn run(config: &Config, args: &CliArgs) -> Result<(), StageError> {
    let mut field = build_heightfield(config, args)?;
    info!(
        nx = field.nx(),
        ny = field.ny(),
        "terrain ready, elevation range [{:.1}, {:.1}]",
        field.grid().min_value(),
        field.grid().max_value()
    );

    erode(&mut field, &config.erosion);

    if config.impact.count > 0 {
        field = simulate_impacts(&field, config)?;
    }

    place_vegetation(&field, &config.vegetation);
    route_path(&field);
    export(&field, config)?;
    Ok(())
}

fn main() {
    let args = CliArgs::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.ron"));

    // Load or fall back to defaults, then apply CLI overrides
    let mut config = Config::load_or_default(&config_path).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    orogen_log::init_logging(Some(&config));

    if let Err(e) = run(&config, &args) {
        error!("pipeline failed: {e}");
        std::process::exit(1);
    }
}
