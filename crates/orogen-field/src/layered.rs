//! Multi-layer material bookkeeping and event-driven perturbation.

use glam::DVec2;
use orogen_grid::{Grid2D, GridError};
use rand::Rng;
use tracing::debug;

use crate::heightfield::NEIGHBOURS_8;
use crate::{FieldError, HeightField};

/// Sentinel vegetation value meaning "destroyed at this cell".
///
/// Distinct from `0.0`, which means absent but viable ground. The sentinel
/// carries no mass in elevation sums.
pub const VEGETATION_DESTROYED: f64 = -1.0;

/// Impact crater radius in cells.
const IMPACT_RADIUS: i64 = 2;

/// Talus angle (radians) enforced by [`LayeredField::stabilize`].
const STABILIZE_TALUS_ANGLE: f64 = 0.6;

/// Relaxation passes run by one [`LayeredField::stabilize`] call.
const STABILIZE_PASSES: u32 = 8;

/// A heightfield coupled with parallel material layers.
///
/// The bedrock elevation is the base [`HeightField`]; sediment, rock debris,
/// vegetation, snow, and water are `Grid2D<f64>` layers sharing its
/// dimensions and bounds. Total surface elevation at a cell is the sum of
/// all layer values there.
pub struct LayeredField {
    bedrock: HeightField,
    sediment: Grid2D<f64>,
    rock: Grid2D<f64>,
    vegetation: Grid2D<f64>,
    snow: Grid2D<f64>,
    water: Grid2D<f64>,
}

impl LayeredField {
    /// Wrap a bedrock field with zeroed material layers.
    pub fn new(bedrock: HeightField) -> Self {
        let blank = bedrock.blank();
        Self {
            sediment: blank.clone(),
            rock: blank.clone(),
            vegetation: blank.clone(),
            snow: blank.clone(),
            water: blank,
            bedrock,
        }
    }

    /// The bedrock elevation field.
    pub fn bedrock(&self) -> &HeightField {
        &self.bedrock
    }

    /// The sediment layer.
    pub fn sediment(&self) -> &Grid2D<f64> {
        &self.sediment
    }

    /// Mutable sediment layer.
    pub fn sediment_mut(&mut self) -> &mut Grid2D<f64> {
        &mut self.sediment
    }

    /// The rock-debris layer.
    pub fn rock(&self) -> &Grid2D<f64> {
        &self.rock
    }

    /// The vegetation layer (`-1.0` marks destroyed cells, see
    /// [`VEGETATION_DESTROYED`]).
    pub fn vegetation(&self) -> &Grid2D<f64> {
        &self.vegetation
    }

    /// Mutable vegetation layer.
    pub fn vegetation_mut(&mut self) -> &mut Grid2D<f64> {
        &mut self.vegetation
    }

    /// The snow layer.
    pub fn snow(&self) -> &Grid2D<f64> {
        &self.snow
    }

    /// The water layer.
    pub fn water(&self) -> &Grid2D<f64> {
        &self.water
    }

    /// Total surface elevation at `(i, j)`: the sum of every layer.
    ///
    /// The vegetation sentinel is a marker, not mass, and contributes zero.
    pub fn total_elevation(&self, i: usize, j: usize) -> f64 {
        let idx = i * self.bedrock.nx() + j;
        self.bedrock.grid().values()[idx]
            + self.sediment.values()[idx]
            + self.rock.values()[idx]
            + self.vegetation.values()[idx].max(0.0)
            + self.snow.values()[idx]
            + self.water.values()[idx]
    }

    /// Combined bedrock + sediment + rock mass, the quantity impact events
    /// and stabilization must conserve.
    pub fn solid_mass(&self) -> f64 {
        self.bedrock.total_elevation()
            + self.sediment.values().iter().sum::<f64>()
            + self.rock.values().iter().sum::<f64>()
    }

    /// A heightfield of total surface elevations, for consumers that want
    /// the composite terrain as a plain field.
    pub fn surface(&self) -> HeightField {
        let mut grid = self.bedrock.blank();
        for i in 0..self.bedrock.ny() {
            for j in 0..self.bedrock.nx() {
                grid.set_at(i, j, self.total_elevation(i, j));
            }
        }
        HeightField::from_grid(grid)
    }

    /// Apply an impact event at a world position.
    ///
    /// Locates the nearest cell to `event.position`, then for every cell
    /// within the crater radius that has a strictly lower neighbour, moves
    /// strength-scaled material (sediment first, then bedrock) onto the
    /// lowest neighbour's rock layer, with linear falloff from the center.
    /// Vegetation at impacted cells is marked destroyed. With probability
    /// `event.fire_probability` the fire model is triggered, and a
    /// [`LayeredField::stabilize`] pass runs afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Grid`] if the position lies outside the field.
    pub fn impact(
        &mut self,
        event: ImpactEvent,
        rng: &mut impl Rng,
        fire: &impl FireModel,
    ) -> Result<(), FieldError> {
        let (ci, cj) = self.nearest_cell(event.position)?;
        let (nx, ny) = (self.bedrock.nx() as i64, self.bedrock.ny() as i64);
        debug!(ci, cj, strength = event.strength, "impact event");

        for di in -IMPACT_RADIUS..=IMPACT_RADIUS {
            for dj in -IMPACT_RADIUS..=IMPACT_RADIUS {
                let (i, j) = (ci as i64 + di, cj as i64 + dj);
                if i < 0 || i >= ny || j < 0 || j >= nx {
                    continue;
                }
                let dist = ((di * di + dj * dj) as f64).sqrt();
                if dist > IMPACT_RADIUS as f64 {
                    continue;
                }
                let (i, j) = (i as usize, j as usize);
                let falloff = 1.0 - dist / (IMPACT_RADIUS as f64 + 1.0);

                self.vegetation.set_at(i, j, VEGETATION_DESTROYED);

                let Some((ti, tj)) = self.lowest_lower_neighbour(i, j) else {
                    continue;
                };
                let amount = event.strength * falloff;
                self.displace_to_rock(i, j, ti, tj, amount);
            }
        }

        if rng.random::<f64>() < event.fire_probability {
            fire.ignite(self, (ci, cj), rng);
        }
        self.stabilize();
        Ok(())
    }

    /// Relax rock and sediment until local slopes respect the talus angle.
    ///
    /// Runs a fixed number of batch passes. In each pass, a cell whose total
    /// surface grade toward its lowest neighbour exceeds `tan(talus)` sheds
    /// half of the over-threshold surplus, limited to its loose material
    /// (rock first, then sediment), onto the neighbour's rock layer. All
    /// moves in a pass are planned from the pre-pass surface, and every unit
    /// removed is deposited, so mass is conserved by construction.
    pub fn stabilize(&mut self) {
        let (nx, ny) = (self.bedrock.nx(), self.bedrock.ny());
        let cell = self.bedrock.grid().cell_size();
        let tan_talus = STABILIZE_TALUS_ANGLE.tan();

        for _ in 0..STABILIZE_PASSES {
            let surface = self.surface();
            let heights = surface.grid().values();

            let mut moves: Vec<(usize, usize, usize, usize, f64)> = Vec::new();
            for i in 0..ny {
                for j in 0..nx {
                    let idx = i * nx + j;
                    let loose = self.rock.values()[idx] + self.sediment.values()[idx];
                    if loose <= 0.0 {
                        continue;
                    }

                    let mut best: Option<(usize, usize, f64, f64)> = None;
                    for &(di, dj) in &NEIGHBOURS_8 {
                        let (ni, nj) = (i as i64 + di, j as i64 + dj);
                        if ni < 0 || ni >= ny as i64 || nj < 0 || nj >= nx as i64 {
                            continue;
                        }
                        let (ni, nj) = (ni as usize, nj as usize);
                        let drop = heights[idx] - heights[ni * nx + nj];
                        if drop <= 0.0 {
                            continue;
                        }
                        let run = (cell * DVec2::new(dj as f64, di as f64)).length();
                        if best.is_none_or(|(_, _, d, r)| drop / run > d / r) {
                            best = Some((ni, nj, drop, run));
                        }
                    }

                    if let Some((ni, nj, drop, run)) = best
                        && drop / run > tan_talus
                    {
                        let surplus = drop - run * tan_talus;
                        let amount = (0.5 * surplus).min(loose);
                        moves.push((i, j, ni, nj, amount));
                    }
                }
            }

            if moves.is_empty() {
                break;
            }
            for &(i, j, ti, tj, amount) in &moves {
                self.shed_loose(i, j, ti, tj, amount);
            }
        }
    }

    /// Move `amount` of material out of `(i, j)` (sediment first, the rest
    /// from bedrock) onto the rock layer at `(ti, tj)`.
    fn displace_to_rock(&mut self, i: usize, j: usize, ti: usize, tj: usize, amount: f64) {
        let idx = i * self.bedrock.nx() + j;
        let from_sediment = self.sediment.values()[idx].min(amount);
        self.sediment.values_mut()[idx] -= from_sediment;
        let from_bedrock = amount - from_sediment;
        self.bedrock.grid_mut().values_mut()[idx] -= from_bedrock;

        let tidx = ti * self.bedrock.nx() + tj;
        self.rock.values_mut()[tidx] += amount;
    }

    /// Move `amount` of loose material (rock first, then sediment) from
    /// `(i, j)` onto the rock layer at `(ti, tj)`.
    fn shed_loose(&mut self, i: usize, j: usize, ti: usize, tj: usize, amount: f64) {
        let idx = i * self.bedrock.nx() + j;
        let from_rock = self.rock.values()[idx].min(amount);
        self.rock.values_mut()[idx] -= from_rock;
        let from_sediment = (amount - from_rock).min(self.sediment.values()[idx]);
        self.sediment.values_mut()[idx] -= from_sediment;

        let tidx = ti * self.bedrock.nx() + tj;
        self.rock.values_mut()[tidx] += from_rock + from_sediment;
    }

    /// The neighbour with the lowest total elevation strictly below `(i, j)`.
    fn lowest_lower_neighbour(&self, i: usize, j: usize) -> Option<(usize, usize)> {
        let own = self.total_elevation(i, j);
        let mut best: Option<(usize, usize, f64)> = None;
        for (ni, nj) in self.bedrock.neighbours_8(i, j) {
            let h = self.total_elevation(ni, nj);
            if h < own && best.is_none_or(|(_, _, bh)| h < bh) {
                best = Some((ni, nj, h));
            }
        }
        best.map(|(ni, nj, _)| (ni, nj))
    }

    /// Map a world position to the nearest lattice cell.
    fn nearest_cell(&self, position: DVec2) -> Result<(usize, usize), GridError> {
        let grid = self.bedrock.grid();
        let extent = grid.top_right() - grid.bottom_left();
        let uv = (position - grid.bottom_left()) / extent;
        if uv.x < 0.0 || uv.x > 1.0 || uv.y < 0.0 || uv.y > 1.0 {
            return Err(GridError::OutOfRange(format!(
                "impact position {position} outside field bounds"
            )));
        }
        let j = (uv.x * (grid.nx() - 1) as f64).round() as usize;
        let i = (uv.y * (grid.ny() - 1) as f64).round() as usize;
        Ok((i, j))
    }
}

/// Parameters of a single impact event.
#[derive(Clone, Copy, Debug)]
pub struct ImpactEvent {
    /// World-space impact center.
    pub position: DVec2,
    /// Material volume moved at the crater center, before falloff.
    pub strength: f64,
    /// Probability in `[0, 1]` that the impact ignites a fire.
    pub fire_probability: f64,
}

/// Secondary fire-spread behaviour triggered by an impact.
///
/// The spread rule is deliberately pluggable; [`RadialBurn`] is the bundled
/// model, and alternative simulations implement this trait.
pub trait FireModel {
    /// Burn vegetation around `center` (cell coordinates).
    fn ignite(&self, field: &mut LayeredField, center: (usize, usize), rng: &mut impl Rng);
}

/// Fire that burns outward to a fixed cell radius, with per-cell ignition
/// probability proportional to remaining vegetation and falling off with
/// distance from the ignition point.
#[derive(Clone, Copy, Debug)]
pub struct RadialBurn {
    /// Burn radius in cells.
    pub radius: f64,
}

impl FireModel for RadialBurn {
    fn ignite(&self, field: &mut LayeredField, center: (usize, usize), rng: &mut impl Rng) {
        let (nx, ny) = (field.bedrock.nx() as i64, field.bedrock.ny() as i64);
        let r = self.radius.ceil() as i64;
        let (ci, cj) = (center.0 as i64, center.1 as i64);
        let mut burned = 0u32;

        for di in -r..=r {
            for dj in -r..=r {
                let (i, j) = (ci + di, cj + dj);
                if i < 0 || i >= ny || j < 0 || j >= nx {
                    continue;
                }
                let dist = ((di * di + dj * dj) as f64).sqrt();
                if dist > self.radius {
                    continue;
                }
                let (i, j) = (i as usize, j as usize);
                let density = field.vegetation.values()[i * nx as usize + j].clamp(0.0, 1.0);
                let ignition = density * (1.0 - dist / (self.radius + 1.0));
                if rng.random::<f64>() < ignition {
                    field.vegetation.set_at(i, j, VEGETATION_DESTROYED);
                    burned += 1;
                }
            }
        }
        debug!(burned, "fire spread");
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn sloped_layered() -> LayeredField {
        // Elevation = i, so every interior cell has lower neighbours.
        let mut bedrock =
            HeightField::new(8, 8, DVec2::ZERO, DVec2::new(7.0, 7.0), 0.0).unwrap();
        for i in 0..8 {
            for j in 0..8 {
                bedrock.grid_mut().set(i, j, i as f64).unwrap();
            }
        }
        LayeredField::new(bedrock)
    }

    fn impact_event() -> ImpactEvent {
        ImpactEvent {
            position: DVec2::new(3.0, 3.0),
            strength: 0.5,
            fire_probability: 0.0,
        }
    }

    #[test]
    fn test_total_elevation_sums_layers() {
        let mut f = sloped_layered();
        let idx = 2 * 8 + 3;
        f.sediment.values_mut()[idx] = 0.5;
        f.rock.values_mut()[idx] = 0.25;
        f.snow.values_mut()[idx] = 0.1;
        assert!(
            (f.total_elevation(2, 3) - (2.0 + 0.5 + 0.25 + 0.1)).abs() < EPSILON,
            "surface elevation must sum every layer"
        );
    }

    #[test]
    fn test_destroyed_vegetation_carries_no_mass() {
        let mut f = sloped_layered();
        let before = f.total_elevation(4, 4);
        f.vegetation.set_at(4, 4, VEGETATION_DESTROYED);
        assert!(
            (f.total_elevation(4, 4) - before).abs() < EPSILON,
            "the destruction sentinel must not change surface elevation"
        );
    }

    #[test]
    fn test_impact_conserves_solid_mass() {
        let mut f = sloped_layered();
        let before = f.solid_mass();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        f.impact(impact_event(), &mut rng, &RadialBurn { radius: 2.0 })
            .unwrap();
        let after = f.solid_mass();
        assert!(
            (before - after).abs() < 1e-6,
            "impact redistributes but never creates or destroys solid mass: {before} -> {after}"
        );
    }

    #[test]
    fn test_impact_destroys_vegetation_at_crater() {
        let mut f = sloped_layered();
        f.vegetation.fill(0.8);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        f.impact(impact_event(), &mut rng, &RadialBurn { radius: 2.0 })
            .unwrap();
        // position (3, 3) maps to cell i=3, j=3.
        assert_eq!(
            f.vegetation.get(3, 3).unwrap(),
            VEGETATION_DESTROYED,
            "the crater center must be marked destroyed"
        );
    }

    #[test]
    fn test_impact_moves_material_to_rock() {
        let mut f = sloped_layered();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        f.impact(impact_event(), &mut rng, &RadialBurn { radius: 2.0 })
            .unwrap();
        let rock_total: f64 = f.rock.values().iter().sum();
        assert!(
            rock_total > 0.0,
            "displaced material must appear in the rock layer"
        );
    }

    #[test]
    fn test_impact_outside_bounds_errors() {
        let mut f = sloped_layered();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let r = f.impact(
            ImpactEvent {
                position: DVec2::new(100.0, 0.0),
                strength: 1.0,
                fire_probability: 0.0,
            },
            &mut rng,
            &RadialBurn { radius: 2.0 },
        );
        assert!(r.is_err(), "impacts outside the field must be rejected");
    }

    #[test]
    fn test_fire_probability_one_burns_vegetation() {
        let mut f = sloped_layered();
        f.vegetation.fill(1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        f.impact(
            ImpactEvent {
                fire_probability: 1.0,
                ..impact_event()
            },
            &mut rng,
            &RadialBurn { radius: 3.0 },
        )
        .unwrap();
        let destroyed = f
            .vegetation
            .values()
            .iter()
            .filter(|&&v| v == VEGETATION_DESTROYED)
            .count();
        // The crater alone destroys ~13 cells; fire should add more.
        assert!(
            destroyed > 13,
            "a certain fire over dense vegetation should burn beyond the crater, got {destroyed}"
        );
    }

    #[test]
    fn test_stabilize_conserves_mass() {
        let mut f = sloped_layered();
        // Pile loose rock into one column.
        f.rock.set_at(4, 4, 20.0);
        let before = f.solid_mass();
        f.stabilize();
        let after = f.solid_mass();
        assert!(
            (before - after).abs() < 1e-6,
            "stabilization is a pure redistribution: {before} -> {after}"
        );
    }

    #[test]
    fn test_stabilize_spreads_a_rock_pile() {
        let mut f = sloped_layered();
        f.rock.set_at(4, 4, 20.0);
        f.stabilize();
        let remaining = f.rock.get(4, 4).unwrap();
        assert!(
            remaining < 20.0,
            "an over-steep pile must shed material, still {remaining}"
        );
        let spread = f.rock.values().iter().filter(|&&v| v > 0.0).count();
        assert!(spread > 1, "shed material must land on neighbours");
    }

    #[test]
    fn test_stabilize_leaves_gentle_terrain_alone() {
        // A slope well under the talus angle: grade 0.1 vs tan(0.6) ~ 0.68.
        let mut bedrock =
            HeightField::new(8, 8, DVec2::ZERO, DVec2::new(7.0, 7.0), 0.0).unwrap();
        for i in 0..8 {
            for j in 0..8 {
                bedrock.grid_mut().set(i, j, i as f64 * 0.1).unwrap();
            }
        }
        let mut f = LayeredField::new(bedrock);
        f.sediment.fill(0.01);
        let before_sediment = f.sediment.clone();
        f.stabilize();
        assert_eq!(
            f.sediment, before_sediment,
            "sub-talus loose material must not move"
        );
    }
}
