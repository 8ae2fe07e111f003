//! Flow accumulation over the 8-neighbourhood.

use orogen_grid::Grid2D;

use crate::HeightField;
use crate::heightfield::NEIGHBOURS_8;

impl HeightField {
    /// Drainage area (flow accumulation) per cell.
    ///
    /// Every cell starts with one unit of rainfall. Cells are processed in
    /// strictly descending elevation order, so a cell has received all of its
    /// inflow before it distributes: no lower cell can feed a higher one.
    /// Each cell passes its accumulated total on to its strictly lower
    /// 8-neighbours, weighted by the elevation drop (diagonal drops divided
    /// by sqrt(2) for the longer horizontal run), in proportion to the weight
    /// sum. The reported value per cell is its upstream contributing area,
    /// itself included. A cell with no strictly lower neighbour, whether an
    /// interior pit or a border cell, retains its accumulation and propagates
    /// nothing; rainfall never leaves the grid, so the terminal cells of a
    /// closed basin jointly account for all `nx * ny` units.
    pub fn drainage_area(&self) -> Grid2D<f64> {
        let (nx, ny) = (self.nx(), self.ny());
        let heights = self.grid().values();

        // Descending elevation; ties broken by index so the pass order, and
        // with it the floating-point summation order, is deterministic.
        let mut order: Vec<usize> = (0..nx * ny).collect();
        order.sort_by(|&a, &b| {
            heights[b]
                .total_cmp(&heights[a])
                .then_with(|| a.cmp(&b))
        });

        let mut accum = vec![1.0_f64; nx * ny];
        let mut lower: Vec<(usize, f64)> = Vec::with_capacity(8);

        for &cell in &order {
            let (i, j) = (cell / nx, cell % nx);
            let h = heights[cell];

            lower.clear();
            for &(di, dj) in &NEIGHBOURS_8 {
                let (ni, nj) = (i as i64 + di, j as i64 + dj);
                if ni < 0 || ni >= ny as i64 || nj < 0 || nj >= nx as i64 {
                    continue;
                }
                let n = ni as usize * nx + nj as usize;
                let drop = h - heights[n];
                if drop > 0.0 {
                    let diagonal = di != 0 && dj != 0;
                    let weight = if diagonal {
                        drop / std::f64::consts::SQRT_2
                    } else {
                        drop
                    };
                    lower.push((n, weight));
                }
            }

            let total_weight: f64 = lower.iter().map(|&(_, w)| w).sum();
            if total_weight <= 0.0 {
                continue; // Pit or flat: retains its accumulation.
            }

            let outflow = accum[cell];
            for &(n, w) in &lower {
                accum[n] += outflow * (w / total_weight);
            }
        }

        let mut out = self.blank();
        out.values_mut().copy_from_slice(&accum);
        out
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn ramp_field() -> HeightField {
        // 4x4 over [0,0]..[3,3], elevation = i; row 0 is the lowest.
        let mut f = HeightField::new(4, 4, DVec2::ZERO, DVec2::new(3.0, 3.0), 0.0).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                f.grid_mut().set(i, j, i as f64).unwrap();
            }
        }
        f
    }

    #[test]
    fn test_ramp_lowest_row_collects_everything() {
        let f = ramp_field();
        let d = f.drainage_area();
        let bottom_row: f64 = (0..4).map(|j| d.get(0, j).unwrap()).sum();
        assert!(
            (bottom_row - 16.0).abs() < EPSILON,
            "on a monotone ramp the lowest row retains all accumulation, got {bottom_row}"
        );
    }

    #[test]
    fn test_flat_field_every_cell_is_a_pit() {
        let f = HeightField::new(5, 5, DVec2::ZERO, DVec2::new(4.0, 4.0), 1.0).unwrap();
        let d = f.drainage_area();
        for (idx, &v) in d.values().iter().enumerate() {
            assert!(
                (v - 1.0).abs() < EPSILON,
                "flat cell {idx} should keep exactly its own unit, got {v}"
            );
        }
    }

    #[test]
    fn test_single_pit_collects_basin() {
        // A bowl: center cell strictly lower than everything else.
        let mut f = HeightField::new(5, 5, DVec2::ZERO, DVec2::new(4.0, 4.0), 0.0).unwrap();
        for i in 0..5 {
            for j in 0..5 {
                let di = (i as f64 - 2.0).abs();
                let dj = (j as f64 - 2.0).abs();
                f.grid_mut().set(i, j, di.max(dj)).unwrap();
            }
        }
        let d = f.drainage_area();
        let center = d.get(2, 2).unwrap();
        assert!(
            (center - 25.0).abs() < EPSILON,
            "every rainfall unit must be accounted for at the basin's pit, got {center}"
        );
    }

    #[test]
    fn test_higher_upstream_area_increases_downstream() {
        let f = ramp_field();
        let d = f.drainage_area();
        // Row 2 has received row 3's rainfall; row 3 only has its own.
        let row3_max = (0..4).map(|j| d.get(3, j).unwrap()).fold(0.0, f64::max);
        let row2_min = (0..4)
            .map(|j| d.get(2, j).unwrap())
            .fold(f64::INFINITY, f64::min);
        assert!(
            row2_min > row3_max - EPSILON,
            "downstream cells accumulate at least their upstream feeders: row2 min {row2_min}, row3 max {row3_max}"
        );
    }

    #[test]
    fn test_deterministic_under_elevation_ties() {
        // Plateau with two drains: equal-elevation cells are ordered by
        // index, so repeated runs agree exactly.
        let mut f = HeightField::new(6, 6, DVec2::ZERO, DVec2::new(5.0, 5.0), 4.0).unwrap();
        f.grid_mut().set(0, 0, 0.0).unwrap();
        f.grid_mut().set(5, 5, 0.0).unwrap();
        let a = f.drainage_area();
        let b = f.drainage_area();
        assert_eq!(a, b, "drainage must be bit-reproducible");
    }
}
