//! Simulation configuration with RON persistence and CLI overrides.
//!
//! Runtime-tunable parameters for the terrain pipeline persist to disk as
//! RON files; `clap`-parsed command-line flags override individual values
//! after loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, ErosionConfig, GridConfig, ImpactConfig, NoiseConfig, OutputConfig, SpeciesConfig,
    VegetationConfig,
};
pub use error::ConfigError;
