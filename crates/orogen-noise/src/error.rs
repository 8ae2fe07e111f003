//! Noise error types.

/// Errors raised when validating noise or fractal parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NoiseError {
    /// Parameters that would produce non-finite output (zero or non-finite
    /// frequency, non-finite amplitudes, divergent spectral weights).
    #[error("invalid noise configuration: {0}")]
    InvalidConfiguration(String),
}
