//! Tileable Poisson-disk point generation.

use glam::DVec2;
use rand::Rng;
use tracing::debug;

/// A Poisson-disk sampler whose output tiles seamlessly.
///
/// Two states, empty and populated, and the transition is one-way: accepted
/// points are a committed set that only grows, never shrinks. A candidate is
/// accepted only if it keeps the separation radius to every accepted point
/// *and* to each accepted point's tile-wrapped image across the four
/// cardinal tile borders, so copies of the tile laid side by side keep the
/// separation guarantee. Each accepted candidate is inserted together with
/// its 90, 180, and 270 degree rotations about the tile center (each
/// re-checked, so one draw yields up to four points), giving the pattern
/// four-fold symmetry.
pub struct BlueNoiseSampler {
    radius: f64,
    tile_size: f64,
    points: Vec<DVec2>,
}

impl BlueNoiseSampler {
    /// Create an empty sampler with separation `radius` over a square tile
    /// of side `tile_size`.
    pub fn new(radius: f64, tile_size: f64) -> Self {
        Self {
            radius,
            tile_size,
            points: Vec::new(),
        }
    }

    /// Minimum separation between any two accepted points.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Side length of the square tile.
    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// The accepted points, in acceptance order.
    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    /// Whether any points have been accepted yet.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Draw up to `max_tries` uniform candidates in the tile and commit the
    /// ones that keep the separation invariant.
    ///
    /// Determinism follows the injected random source: a seeded `rng`
    /// reproduces the same point set.
    pub fn generate(&mut self, rng: &mut impl Rng, max_tries: u32) {
        let before = self.points.len();
        for _ in 0..max_tries {
            let candidate = DVec2::new(
                rng.random_range(0.0..self.tile_size),
                rng.random_range(0.0..self.tile_size),
            );
            if !self.separated(candidate) {
                continue;
            }
            self.points.push(candidate);
            // Four-fold symmetric insertion about the tile center; each
            // rotation must independently keep the invariant.
            for rotated in self.rotations(candidate) {
                if self.separated(rotated) {
                    self.points.push(rotated);
                }
            }
        }
        debug!(
            accepted = self.points.len() - before,
            total = self.points.len(),
            "blue-noise generation pass"
        );
    }

    /// Whether `p` keeps the radius to all accepted points and their
    /// cardinal tile-wrapped images.
    fn separated(&self, p: DVec2) -> bool {
        let s = self.tile_size;
        let images = [
            DVec2::ZERO,
            DVec2::new(s, 0.0),
            DVec2::new(-s, 0.0),
            DVec2::new(0.0, s),
            DVec2::new(0.0, -s),
        ];
        self.points.iter().all(|&q| {
            images
                .iter()
                .all(|&offset| (p - (q + offset)).length() > self.radius)
        })
    }

    /// The 90/180/270 degree rotations of `p` about the tile center.
    fn rotations(&self, p: DVec2) -> [DVec2; 3] {
        let c = DVec2::splat(self.tile_size * 0.5);
        let d = p - c;
        [
            c + DVec2::new(-d.y, d.x),
            c - d,
            c + DVec2::new(d.y, -d.x),
        ]
    }
}
