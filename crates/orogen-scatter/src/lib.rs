//! Blue-noise sampling and density-driven object placement.
//!
//! [`BlueNoiseSampler`] generates a tileable Poisson-disk point set: no two
//! points (or their tile-wrapped images) closer than the separation radius,
//! so the pattern repeats seamlessly across tile borders.
//! [`VegetationPlacer`] turns heightfield-derived scalar fields into
//! per-species placement densities and instantiates object frames at
//! blue-noise points for an external instanced renderer.

mod bluenoise;
mod placer;

pub use bluenoise::BlueNoiseSampler;
pub use placer::{Frame, Response, SpeciesDef, SpeciesId, VegetationPlacer};
