//! Density-driven vegetation and debris placement.

use glam::{DVec2, DVec3};
use hashbrown::HashMap;
use orogen_field::HeightField;
use orogen_grid::Grid2D;
use rand::Rng;
use tracing::debug;

use crate::BlueNoiseSampler;

/// Identifier for a placeable species (tree, shrub, boulder, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpeciesId(pub u32);

/// A trapezoid transfer function over one environmental variable.
///
/// Zero below `lo` and above `hi`, one between `lo_full` and `hi_full`,
/// linear ramps in between. Fields are assumed ordered
/// `lo <= lo_full <= hi_full <= hi`.
#[derive(Clone, Copy, Debug)]
pub struct Response {
    /// Lower cutoff.
    pub lo: f64,
    /// Start of the full-suitability plateau.
    pub lo_full: f64,
    /// End of the full-suitability plateau.
    pub hi_full: f64,
    /// Upper cutoff.
    pub hi: f64,
}

impl Response {
    /// A response that accepts everything.
    pub fn any() -> Self {
        Self {
            lo: f64::NEG_INFINITY,
            lo_full: f64::NEG_INFINITY,
            hi_full: f64::INFINITY,
            hi: f64::INFINITY,
        }
    }

    /// Evaluate the trapezoid at `x`, in `[0, 1]`.
    pub fn eval(&self, x: f64) -> f64 {
        if x <= self.lo || x >= self.hi {
            return 0.0;
        }
        if x < self.lo_full {
            return (x - self.lo) / (self.lo_full - self.lo);
        }
        if x > self.hi_full {
            return (self.hi - x) / (self.hi - self.hi_full);
        }
        1.0
    }
}

/// Placement rules for one species.
#[derive(Clone, Debug)]
pub struct SpeciesDef {
    /// Human-readable name.
    pub name: String,
    /// Species archetype ID.
    pub id: SpeciesId,
    /// Suitability response to local slope.
    pub slope: Response,
    /// Suitability response to topographic wetness.
    pub wetness: Response,
    /// Suitability response to absolute elevation.
    pub altitude: Response,
    /// Scale variation range `[min_scale, max_scale]`.
    pub scale_range: (f64, f64),
}

/// A placed object instance for the external instanced renderer.
#[derive(Clone, Debug)]
pub struct Frame {
    /// World-space anchor point (x, elevation, z).
    pub position: DVec3,
    /// Rotation about the vertical axis, in radians.
    pub rotation: f64,
    /// Uniform scale multiplier.
    pub scale: f64,
    /// Which species to instantiate.
    pub species: SpeciesId,
}

/// Converts derived scalar fields into per-species placement densities, then
/// stochastically instantiates frames at blue-noise sample points.
pub struct VegetationPlacer {
    species: HashMap<SpeciesId, SpeciesDef>,
    // Evaluation order; HashMap iteration order would not be deterministic.
    order: Vec<SpeciesId>,
}

impl VegetationPlacer {
    /// Create a placer from species definitions. Later entries are tried
    /// after earlier ones at each candidate point.
    pub fn new(species: Vec<SpeciesDef>) -> Self {
        let order: Vec<SpeciesId> = species.iter().map(|d| d.id).collect();
        let species = species.into_iter().map(|d| (d.id, d)).collect();
        Self { species, order }
    }

    /// The per-cell placement density for one species, in `[0, 1]`.
    ///
    /// The product of the species' slope, wetness, and altitude responses
    /// evaluated on the field's derived values at each cell.
    pub fn density_field(&self, def: &SpeciesDef, field: &HeightField) -> Grid2D<f64> {
        let slope = field.slope();
        let wetness = field.wetness();
        let mut out = slope.clone();
        for i in 0..field.ny() {
            for j in 0..field.nx() {
                let d = def.slope.eval(slope.at(i, j))
                    * def.wetness.eval(wetness.at(i, j))
                    * def.altitude.eval(field.height(i, j));
                out.set_at(i, j, d);
            }
        }
        out
    }

    /// Instantiate frames across the field.
    ///
    /// The sampler's tile is repeated to cover the field's bounding box;
    /// every tiled point becomes a candidate. Candidates roll against each
    /// species' bilinear density at the point, first success wins, and an
    /// accepted candidate gets a random rotation and a scale from the
    /// species' range. The injected `rng` makes runs reproducible.
    pub fn place(
        &self,
        field: &HeightField,
        sampler: &BlueNoiseSampler,
        rng: &mut impl Rng,
    ) -> Vec<Frame> {
        let densities: Vec<(SpeciesId, Grid2D<f64>)> = self
            .order
            .iter()
            .map(|id| (*id, self.density_field(&self.species[id], field)))
            .collect();

        let bl = field.grid().bottom_left();
        let tr = field.grid().top_right();
        let s = sampler.tile_size();
        let tiles_x = ((tr.x - bl.x) / s).ceil() as i64;
        let tiles_y = ((tr.y - bl.y) / s).ceil() as i64;

        let mut frames = Vec::new();
        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let origin = bl + DVec2::new(tx as f64 * s, ty as f64 * s);
                for &p in sampler.points() {
                    let world = origin + p;
                    if world.x > tr.x || world.y > tr.y {
                        continue;
                    }
                    self.try_place(field, &densities, world, rng, &mut frames);
                }
            }
        }
        debug!(frames = frames.len(), "vegetation placement");
        frames
    }

    /// Roll the candidate point against each species density in order.
    fn try_place(
        &self,
        field: &HeightField,
        densities: &[(SpeciesId, Grid2D<f64>)],
        world: DVec2,
        rng: &mut impl Rng,
        frames: &mut Vec<Frame>,
    ) {
        let Ok(elevation) = field.grid().bilinear(world) else {
            return;
        };
        for (id, density) in densities {
            let Ok(d) = density.bilinear(world) else {
                continue;
            };
            if rng.random::<f64>() < d {
                let def = &self.species[id];
                let scale = rng.random_range(def.scale_range.0..=def.scale_range.1);
                let rotation = rng.random_range(0.0..std::f64::consts::TAU);
                frames.push(Frame {
                    position: DVec3::new(world.x, elevation, world.y),
                    rotation,
                    scale,
                    species: *id,
                });
                break; // One frame per candidate point.
            }
        }
    }
}
