//! The elevation lattice and its derived scalar fields.

use glam::{DVec2, DVec3};
use orogen_grid::Grid2D;
use orogen_noise::{Fractal, FractalParams};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::FieldError;

/// The eight lattice neighbour offsets, cardinals first.
pub(crate) const NEIGHBOURS_8: [(i64, i64); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// A rectangular elevation field.
///
/// Wraps a `Grid2D<f64>` whose value is elevation in world units. The lattice
/// is at least 2x2 (gradients and bilinear sampling must be defined) and is
/// never resized after construction; erosion operators mutate elevations in
/// place. Derived fields are values, not cached state: recompute them after
/// any mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightField {
    grid: Grid2D<f64>,
}

impl HeightField {
    /// Create a field of constant elevation `fill`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Grid`] if either dimension is below 2 or the
    /// bounding box collapses.
    pub fn new(
        nx: usize,
        ny: usize,
        bottom_left: DVec2,
        top_right: DVec2,
        fill: f64,
    ) -> Result<Self, FieldError> {
        if nx < 2 || ny < 2 {
            return Err(orogen_grid::GridError::DegenerateRange(format!(
                "heightfield needs at least 2x2 vertices, got {nx}x{ny}"
            ))
            .into());
        }
        let grid = Grid2D::new(nx, ny, bottom_left, top_right, fill)?;
        Ok(Self { grid })
    }

    /// Create a field by evaluating a fractal noise source at every
    /// lattice vertex.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Noise`] for invalid fractal parameters, or
    /// [`FieldError::Grid`] for degenerate dimensions.
    pub fn from_fractal(
        nx: usize,
        ny: usize,
        bottom_left: DVec2,
        top_right: DVec2,
        seed: u64,
        params: FractalParams,
    ) -> Result<Self, FieldError> {
        let fractal = Fractal::new(seed, params)?;
        let mut field = Self::new(nx, ny, bottom_left, top_right, 0.0)?;
        for i in 0..ny {
            for j in 0..nx {
                let p = field.grid.position(i, j);
                field.grid.set_at(i, j, fractal.sample(p));
            }
        }
        debug!(nx, ny, seed, "heightfield synthesized from fractal noise");
        Ok(field)
    }

    /// Wrap an existing elevation grid.
    pub(crate) fn from_grid(grid: Grid2D<f64>) -> Self {
        Self { grid }
    }

    /// The underlying elevation grid.
    pub fn grid(&self) -> &Grid2D<f64> {
        &self.grid
    }

    /// Mutable access to the underlying elevation grid.
    pub fn grid_mut(&mut self) -> &mut Grid2D<f64> {
        &mut self.grid
    }

    /// Number of columns.
    pub fn nx(&self) -> usize {
        self.grid.nx()
    }

    /// Number of rows.
    pub fn ny(&self) -> usize {
        self.grid.ny()
    }

    /// Elevation at vertex `(i, j)`. Panics on an out-of-range index; use
    /// `grid().get` for checked access.
    pub fn height(&self, i: usize, j: usize) -> f64 {
        self.grid.at(i, j)
    }

    /// Sum of all elevations (mass proxy for conservation checks).
    pub fn total_elevation(&self) -> f64 {
        self.grid.values().iter().sum()
    }

    /// A zeroed grid with this field's dimensions and bounds, used as the
    /// target of derived-field computations.
    pub(crate) fn blank(&self) -> Grid2D<f64> {
        let mut g = self.grid.clone();
        g.fill(0.0);
        g
    }

    /// Iterate the in-range 8-neighbours of `(i, j)`.
    pub(crate) fn neighbours_8(
        &self,
        i: usize,
        j: usize,
    ) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (ny, nx) = (self.ny() as i64, self.nx() as i64);
        NEIGHBOURS_8.iter().filter_map(move |&(di, dj)| {
            let (ni, nj) = (i as i64 + di, j as i64 + dj);
            (ni >= 0 && ni < ny && nj >= 0 && nj < nx).then_some((ni as usize, nj as usize))
        })
    }

    // -----------------------------------------------------------------------
    // Derived fields
    // -----------------------------------------------------------------------

    /// Per-cell slope: the norm of the elevation gradient.
    ///
    /// Zero on a flat field; equal to the analytic slope on a linear ramp.
    pub fn slope(&self) -> Grid2D<f64> {
        let mut out = self.blank();
        for i in 0..self.ny() {
            for j in 0..self.nx() {
                // Dimensions >= 2 are a construction invariant, and (i, j)
                // is in range, so the gradient cannot fail.
                let g = self.grid.gradient(i, j).unwrap_or(DVec2::ZERO);
                out.set_at(i, j, g.length());
            }
        }
        out
    }

    /// Topographic wetness: `ln(drainage / (1 + slope))` per cell.
    ///
    /// Unbounded and frequently negative; callers wanting a display range
    /// should normalize the result themselves.
    pub fn wetness(&self) -> Grid2D<f64> {
        let drainage = self.drainage_area();
        let slope = self.slope();
        let mut out = self.blank();
        for (idx, v) in out.values_mut().iter_mut().enumerate() {
            *v = (drainage.values()[idx] / (1.0 + slope.values()[idx])).ln();
        }
        out
    }

    /// Stream power: `sqrt(drainage) * slope` per cell, the erosive-energy
    /// proxy driving channel incision.
    pub fn stream_power(&self) -> Grid2D<f64> {
        let drainage = self.drainage_area();
        let slope = self.slope();
        let mut out = self.blank();
        for (idx, v) in out.values_mut().iter_mut().enumerate() {
            *v = drainage.values()[idx].sqrt() * slope.values()[idx];
        }
        out
    }

    /// Ambient accessibility (sky exposure) per cell, in `[0, 1]`.
    ///
    /// Casts `ray_count` pseudo-random rays per cell, biased into the
    /// hemisphere above the local surface normal, and marches each with a
    /// conservative step bound derived from the field's global maximum slope
    /// so a ray can never tunnel through terrain. A ray that re-intersects
    /// the field before leaving the bounding box counts as blocked; the
    /// result is `1 - blocked / ray_count`.
    ///
    /// This is a stochastic estimate. It is deterministic only because the
    /// ray generator is seeded from `seed`; pass the same seed to reproduce.
    pub fn accessibility(&self, seed: u64, ray_count: u32) -> Grid2D<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let max_height = self.grid.max_value();
        let max_slope = self
            .slope()
            .values()
            .iter()
            .copied()
            .fold(0.0_f64, f64::max);
        // Clearance shrinks by at most (1 + max_slope) per unit travelled, so
        // stepping clearance / (1 + max_slope) cannot cross the surface.
        let step_scale = 1.0 / (1.0 + max_slope);
        let cell = self.grid.cell_size();
        let min_step = cell.x.min(cell.y) * 1e-2;
        let lift = cell.x.min(cell.y) * 1e-3;

        let mut out = self.blank();
        for i in 0..self.ny() {
            for j in 0..self.nx() {
                let g = self.grid.gradient(i, j).unwrap_or(DVec2::ZERO);
                // Upward surface normal in (x, elevation, y) space.
                let normal = DVec3::new(-g.x, 1.0, -g.y).normalize();
                let origin = {
                    let p = self.grid.position(i, j);
                    DVec3::new(p.x, self.height(i, j) + lift, p.y)
                };

                let mut blocked = 0u32;
                for _ in 0..ray_count {
                    let mut dir = random_unit_dir(&mut rng);
                    if dir.dot(normal) < 0.0 {
                        dir = -dir;
                    }
                    if self.ray_hits_terrain(origin, dir, max_height, step_scale, min_step) {
                        blocked += 1;
                    }
                }
                out.set_at(i, j, 1.0 - f64::from(blocked) / f64::from(ray_count.max(1)));
            }
        }
        out
    }

    /// March a ray until it leaves the bounding volume or re-enters terrain.
    fn ray_hits_terrain(
        &self,
        origin: DVec3,
        dir: DVec3,
        max_height: f64,
        step_scale: f64,
        min_step: f64,
    ) -> bool {
        let mut pos = origin;
        loop {
            let horizontal = DVec2::new(pos.x, pos.z);
            let Ok(ground) = self.grid.bilinear(horizontal) else {
                // Left the horizontal extent of the grid: escaped.
                return false;
            };
            let clearance = pos.y - ground;
            if clearance <= 0.0 {
                return true;
            }
            if pos.y > max_height && dir.y > 0.0 {
                // Above every possible peak and still climbing: escaped.
                return false;
            }
            let step = (clearance * step_scale).max(min_step);
            pos += dir * step;
        }
    }
}

/// Uniform random unit direction via cube rejection sampling.
fn random_unit_dir(rng: &mut ChaCha8Rng) -> DVec3 {
    loop {
        let v = DVec3::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}
