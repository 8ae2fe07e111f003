//! Configuration structs with sensible defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Lattice dimensions and world bounds.
    pub grid: GridConfig,
    /// Fractal noise parameters for terrain synthesis.
    pub noise: NoiseConfig,
    /// Erosion operator parameters.
    pub erosion: ErosionConfig,
    /// Vegetation placement settings.
    pub vegetation: VegetationConfig,
    /// Impact event settings.
    pub impact: ImpactConfig,
    /// Output and logging settings.
    pub output: OutputConfig,
}

/// Lattice dimensions and world-space bounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    /// Number of columns.
    pub nx: usize,
    /// Number of rows.
    pub ny: usize,
    /// World-space side length of the (square) terrain, in world units.
    pub extent: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            nx: 256,
            ny: 256,
            extent: 1000.0,
        }
    }
}

/// Fractal noise parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseConfig {
    /// World seed for deterministic synthesis.
    pub seed: u64,
    /// First-octave amplitude in world units.
    pub amplitude: f64,
    /// First-octave frequency (cycles per world unit).
    pub frequency: f64,
    /// Octave count.
    pub octaves: u32,
    /// Fractal variant name: "brownian", "ridge", "hetero", "hybrid",
    /// or "ridged".
    pub kind: String,
    /// Roughness exponent for the Musgrave variants.
    pub h: f64,
    /// Octave frequency multiplier for the Musgrave variants.
    pub lacunarity: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            amplitude: 120.0,
            frequency: 0.004,
            octaves: 7,
            kind: "brownian".to_string(),
            h: 1.0,
            lacunarity: 2.0,
        }
    }
}

/// Erosion operator parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ErosionConfig {
    /// Thermal weathering passes to run.
    pub thermal_passes: u32,
    /// Fraction of the critical drop moved per thermal pass.
    pub thermal_strength: f64,
    /// Talus angle in radians.
    pub talus_angle: f64,
    /// Stream-power erosion iterations.
    pub stream_power_iterations: u32,
    /// Elevation removed per unit stream power per iteration.
    pub stream_power_amplitude: f64,
}

impl Default for ErosionConfig {
    fn default() -> Self {
        Self {
            thermal_passes: 20,
            thermal_strength: 0.25,
            talus_angle: 0.6,
            stream_power_iterations: 10,
            stream_power_amplitude: 1e-3,
        }
    }
}

/// Vegetation placement settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VegetationConfig {
    /// Seed for the placement RNG.
    pub seed: u64,
    /// Blue-noise separation radius in world units.
    pub separation_radius: f64,
    /// Blue-noise tile side length in world units.
    pub tile_size: f64,
    /// Candidate draws per generation pass.
    pub max_tries: u32,
    /// Species transfer functions.
    pub species: Vec<SpeciesConfig>,
}

impl Default for VegetationConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            separation_radius: 6.0,
            tile_size: 120.0,
            max_tries: 800,
            species: vec![SpeciesConfig::default()],
        }
    }
}

/// Transfer-function bounds for one species, as `(lo, lo_full, hi_full, hi)`
/// trapezoids over slope, wetness, and altitude.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeciesConfig {
    /// Species name.
    pub name: String,
    /// Slope response trapezoid.
    pub slope: (f64, f64, f64, f64),
    /// Wetness response trapezoid.
    pub wetness: (f64, f64, f64, f64),
    /// Altitude response trapezoid.
    pub altitude: (f64, f64, f64, f64),
    /// Scale variation range.
    pub scale_range: (f64, f64),
}

impl Default for SpeciesConfig {
    fn default() -> Self {
        Self {
            name: "pine".to_string(),
            slope: (-1.0, 0.0, 0.6, 1.2),
            wetness: (-6.0, -2.0, 4.0, 8.0),
            altitude: (-50.0, 0.0, 150.0, 220.0),
            scale_range: (0.7, 1.3),
        }
    }
}

/// Impact event settings for the demo pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImpactConfig {
    /// Number of impact events to simulate.
    pub count: u32,
    /// Material volume moved per impact before falloff.
    pub strength: f64,
    /// Probability each impact ignites a fire.
    pub fire_probability: f64,
    /// Burn radius in cells for the radial fire model.
    pub fire_radius: f64,
    /// Seed for impact placement and fire rolls.
    pub seed: u64,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            count: 0,
            strength: 2.0,
            fire_probability: 0.3,
            fire_radius: 4.0,
            seed: 2,
        }
    }
}

/// Output and logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for exported images.
    pub directory: String,
    /// Log filter string (empty uses the built-in default).
    pub log_level: String,
    /// Seed for the accessibility ray generator.
    pub ray_seed: u64,
    /// Rays cast per cell for accessibility.
    pub ray_count: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "out".to_string(),
            log_level: String::new(),
            ray_seed: 3,
            ray_count: 32,
        }
    }
}

impl Config {
    /// Load a config from a RON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Save the config as pretty-printed RON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] or [`ConfigError::Write`].
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(ConfigError::Serialize)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` if it exists, otherwise return defaults.
    ///
    /// # Errors
    ///
    /// Propagates parse errors for an existing but malformed file; a missing
    /// file is not an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_ron() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ron");

        let config = Config::default();
        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(config, loaded, "save/load must round-trip exactly");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.ron");
        std::fs::write(&path, "(grid: (nx: 64, ny: 64))").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.grid.nx, 64);
        assert_eq!(
            config.noise.octaves,
            NoiseConfig::default().octaves,
            "unspecified sections take defaults"
        );
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load_or_default(Path::new("/nonexistent/config.ron")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ron");
        std::fs::write(&path, "(grid: oops").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_read_error_names_the_path() {
        let err = Config::load(Path::new("/nonexistent/config.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(
            err.to_string().contains("/nonexistent/config.ron"),
            "message should name the offending path: {err}"
        );
    }
}
