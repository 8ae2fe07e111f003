//! Seeded gradient noise and fractal combinators for heightfield synthesis.
//!
//! [`GradientNoise`] is the Perlin-style primitive: a seeded permutation and
//! gradient table fixed at construction, sampled via trilinear blending of
//! cube-corner gradient dots. [`Fractal`] composes octaves of it into
//! heightfield-ready scalar fields: additive fBm and ridge summation, plus
//! the multiplicative Musgrave multifractals driven by a per-instance
//! spectral weight table.

mod error;
mod fractal;
mod gradient;
mod musgrave;

pub use error::NoiseError;
pub use fractal::{Fractal, FractalKind, FractalParams};
pub use gradient::GradientNoise;
pub use musgrave::SpectralWeights;
