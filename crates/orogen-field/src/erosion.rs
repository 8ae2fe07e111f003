//! Batch erosion operators.
//!
//! Every operator follows the same contract: read the whole field, compute
//! the update from that pre-pass snapshot, then write all changes at once.
//! Partial in-place updates would make the result depend on cell visiting
//! order. Hydraulic erosion (rainfall with sediment transport) plugs in
//! through the same [`ErosionOperator`] seam; implementors owe their own
//! mass-conservation and termination invariants.

use tracing::debug;

use crate::HeightField;
use crate::heightfield::NEIGHBOURS_8;

/// A batch transformation that mutates a heightfield in place.
///
/// Operators never fail on a valid field; pathological parameters (negative
/// strengths, enormous amplitudes) are a caller contract violation and may
/// produce degenerate elevations.
pub trait ErosionOperator {
    /// Apply one full operator run to `field`.
    fn apply(&self, field: &mut HeightField);
}

/// Thermal weathering: material on over-steep slopes slides downhill.
///
/// One application is a single relaxation pass. A cell is unstable when the
/// grade of its steepest descent (elevation drop over horizontal run to an
/// 8-neighbour) exceeds `tan(talus_angle)`. Every unstable cell sheds
/// `strength * drop` onto its lowest neighbour, where `drop` is the maximum
/// elevation drop. The unstable set and all amounts come from the pre-pass
/// elevations, and total mass is conserved: what a cell loses, its neighbour
/// gains.
#[derive(Clone, Copy, Debug)]
pub struct ThermalWeathering {
    /// Fraction of the critical drop moved per pass. Sensible range (0, 0.5].
    pub strength: f64,
    /// Critical (talus) angle in radians above which material slides.
    pub talus_angle: f64,
}

impl ErosionOperator for ThermalWeathering {
    fn apply(&self, field: &mut HeightField) {
        let moves = plan_thermal_moves(field, self.strength, self.talus_angle);
        debug!(unstable = moves.len(), "thermal weathering pass");
        let values = field.grid_mut().values_mut();
        for &(from, to, amount) in &moves {
            values[from] -= amount;
            values[to] += amount;
        }
    }
}

/// Compute `(source, destination, amount)` moves from the pre-pass state.
pub(crate) fn plan_thermal_moves(
    field: &HeightField,
    strength: f64,
    talus_angle: f64,
) -> Vec<(usize, usize, f64)> {
    let (nx, ny) = (field.nx(), field.ny());
    let heights = field.grid().values();
    let cell = field.grid().cell_size();
    let tan_talus = talus_angle.tan();

    let mut moves = Vec::new();
    for i in 0..ny {
        for j in 0..nx {
            let idx = i * nx + j;
            let h = heights[idx];

            // Instability is judged by the steepest grade (drop over run),
            // but material slides to the lowest neighbour, the one with the
            // maximum drop. A cardinal neighbour can win on grade while a
            // diagonal sits strictly lower.
            let mut lowest: Option<(usize, f64)> = None;
            let mut max_grade: f64 = 0.0;
            for &(di, dj) in &NEIGHBOURS_8 {
                let (ni, nj) = (i as i64 + di, j as i64 + dj);
                if ni < 0 || ni >= ny as i64 || nj < 0 || nj >= nx as i64 {
                    continue;
                }
                let n = ni as usize * nx + nj as usize;
                let drop = h - heights[n];
                if drop <= 0.0 {
                    continue;
                }
                let run = (cell * glam::DVec2::new(dj as f64, di as f64)).length();
                max_grade = max_grade.max(drop / run);
                if lowest.is_none_or(|(_, d)| drop > d) {
                    lowest = Some((n, drop));
                }
            }

            if let Some((n, drop)) = lowest
                && max_grade > tan_talus
            {
                moves.push((idx, n, strength * drop));
            }
        }
    }
    moves
}

/// Stream-power erosion: channels incise where flow is concentrated.
///
/// Each iteration recomputes the stream-power field once from the current
/// elevations, then subtracts `power * amplitude` from every cell
/// simultaneously before the next iteration recomputes.
#[derive(Clone, Copy, Debug)]
pub struct StreamPowerErosion {
    /// Number of recompute-and-subtract iterations.
    pub iterations: u32,
    /// Elevation removed per unit stream power per iteration.
    pub amplitude: f64,
}

impl ErosionOperator for StreamPowerErosion {
    fn apply(&self, field: &mut HeightField) {
        for iteration in 0..self.iterations {
            let power = field.stream_power();
            for (v, &p) in field
                .grid_mut()
                .values_mut()
                .iter_mut()
                .zip(power.values())
            {
                *v -= p * self.amplitude;
            }
            debug!(iteration, "stream-power erosion iteration");
        }
    }
}
