//! Error type for simulation config persistence.

use std::path::PathBuf;

/// Failures while loading or persisting a pipeline configuration.
///
/// The file-system variants carry the offending path so a bad `--config`
/// argument is diagnosable from the message alone.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config at {path}")]
    Read {
        /// Path that was passed to the loader.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be written.
    #[error("failed to write config at {path}")]
    Write {
        /// Path that was passed to the saver.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not valid RON for this schema.
    #[error("malformed config")]
    Parse(#[source] ron::error::SpannedError),

    /// The in-memory config could not be rendered as RON.
    #[error("config serialization failed")]
    Serialize(#[source] ron::Error),
}
