//! Grid error types.

/// Errors that can occur when accessing or transforming a grid.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// An index or world-space point fell outside the grid.
    #[error("position out of grid range: {0}")]
    OutOfRange(String),

    /// A value range collapsed to a single point, making the operation
    /// (normalization, gradient spacing) undefined.
    #[error("degenerate range: {0}")]
    DegenerateRange(String),
}
