//! Field error types.

use orogen_grid::GridError;
use orogen_noise::NoiseError;

/// Errors that can occur when constructing or sampling a heightfield.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// An underlying grid operation failed.
    #[error(transparent)]
    Grid(#[from] GridError),

    /// Noise parameters were rejected.
    #[error(transparent)]
    Noise(#[from] NoiseError),

    /// Decoding or encoding a heightmap image failed.
    #[error("heightmap image error: {0}")]
    Image(#[from] image::ImageError),

    /// Reading or writing an image file failed.
    #[error("heightmap io error: {0}")]
    Io(#[from] std::io::Error),
}
