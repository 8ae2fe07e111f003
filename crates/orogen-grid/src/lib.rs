//! Rectangular scalar/vector lattices over a world-space bounding box.
//!
//! [`Grid2D`] is the storage primitive every other crate builds on: a
//! row-major `nx * ny` array of values spanning an axis-aligned world
//! rectangle, with bounds-checked access, bilinear sampling, finite-difference
//! gradients, and in-place normalization.

mod error;
mod grid;

pub use error::GridError;
pub use grid::Grid2D;
