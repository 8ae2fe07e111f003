//! Row-major 2D lattice with world-space addressing.

use glam::DVec2;

use crate::GridError;

/// A rectangular lattice of values spanning a world-space bounding box.
///
/// Storage is row-major: the value at row `i`, column `j` lives at index
/// `i * nx + j`. Row `0` sits on the `bottom_left` edge, row `ny - 1` on the
/// `top_right` edge, and world positions interpolate affinely between the two
/// corners. The dimensions are fixed at construction and never change.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid2D<T> {
    nx: usize,
    ny: usize,
    bottom_left: DVec2,
    top_right: DVec2,
    values: Vec<T>,
}

impl<T: Copy> Grid2D<T> {
    /// Create a grid of `nx * ny` cells filled with `fill`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DegenerateRange`] if either dimension is zero or
    /// the bounding box collapses along either axis.
    pub fn new(
        nx: usize,
        ny: usize,
        bottom_left: DVec2,
        top_right: DVec2,
        fill: T,
    ) -> Result<Self, GridError> {
        if nx == 0 || ny == 0 {
            return Err(GridError::DegenerateRange(format!(
                "grid dimensions must be positive, got {nx}x{ny}"
            )));
        }
        if bottom_left.x == top_right.x || bottom_left.y == top_right.y {
            return Err(GridError::DegenerateRange(format!(
                "bounding box collapses: {bottom_left} .. {top_right}"
            )));
        }
        Ok(Self {
            nx,
            ny,
            bottom_left,
            top_right,
            values: vec![fill; nx * ny],
        })
    }

    /// Number of columns.
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Number of rows.
    pub fn ny(&self) -> usize {
        self.ny
    }

    /// Bottom-left world corner.
    pub fn bottom_left(&self) -> DVec2 {
        self.bottom_left
    }

    /// Top-right world corner.
    pub fn top_right(&self) -> DVec2 {
        self.top_right
    }

    /// Total number of cells (`nx * ny`).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the grid holds no cells. Always false for a constructed grid.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// World-space extent of one cell along each axis.
    ///
    /// For a single-row or single-column grid the degenerate axis reports the
    /// full box extent rather than dividing by zero.
    pub fn cell_size(&self) -> DVec2 {
        let extent = self.top_right - self.bottom_left;
        DVec2::new(
            extent.x / (self.nx.max(2) - 1) as f64,
            extent.y / (self.ny.max(2) - 1) as f64,
        )
    }

    /// World position of the lattice vertex at row `i`, column `j`.
    ///
    /// Affine interpolation between the corners at parameter
    /// `(j / (nx - 1), i / (ny - 1))`.
    pub fn position(&self, i: usize, j: usize) -> DVec2 {
        let u = j as f64 / (self.nx.max(2) - 1) as f64;
        let v = i as f64 / (self.ny.max(2) - 1) as f64;
        self.bottom_left + (self.top_right - self.bottom_left) * DVec2::new(u, v)
    }

    /// Bounds-checked read of the value at `(i, j)`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfRange`] if `i >= ny` or `j >= nx`.
    pub fn get(&self, i: usize, j: usize) -> Result<T, GridError> {
        self.check(i, j)?;
        Ok(self.values[i * self.nx + j])
    }

    /// Bounds-checked write of the value at `(i, j)`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfRange`] if `i >= ny` or `j >= nx`.
    pub fn set(&mut self, i: usize, j: usize, value: T) -> Result<(), GridError> {
        self.check(i, j)?;
        self.values[i * self.nx + j] = value;
        Ok(())
    }

    /// Read without bounds checking against grid dimensions already validated
    /// by the caller. Panics (slice indexing) if the index is out of range.
    pub fn at(&self, i: usize, j: usize) -> T {
        self.values[i * self.nx + j]
    }

    /// Write counterpart of [`Grid2D::at`].
    pub fn set_at(&mut self, i: usize, j: usize, value: T) {
        self.values[i * self.nx + j] = value;
    }

    /// Overwrite every cell with `value`.
    pub fn fill(&mut self, value: T) {
        self.values.fill(value);
    }

    /// The raw row-major value slice.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Mutable access to the raw row-major value slice.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    fn check(&self, i: usize, j: usize) -> Result<(), GridError> {
        if i >= self.ny || j >= self.nx {
            return Err(GridError::OutOfRange(format!(
                "({i}, {j}) outside {}x{} grid",
                self.ny, self.nx
            )));
        }
        Ok(())
    }
}

impl Grid2D<f64> {
    /// Smallest value in the grid.
    pub fn min_value(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest value in the grid.
    pub fn max_value(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Bilinearly interpolated value at an arbitrary world point.
    ///
    /// The point is mapped to fractional grid coordinates, the enclosing cell
    /// is located, and its four corner values are blended. Points outside the
    /// world bounding box are an error, not clamped.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfRange`] if `point` falls outside the box, or
    /// [`GridError::DegenerateRange`] for a grid thinner than 2 cells along
    /// either axis (no enclosing cell exists).
    pub fn bilinear(&self, point: DVec2) -> Result<f64, GridError> {
        if self.nx < 2 || self.ny < 2 {
            return Err(GridError::DegenerateRange(format!(
                "bilinear sampling needs at least a 2x2 grid, got {}x{}",
                self.ny, self.nx
            )));
        }
        let extent = self.top_right - self.bottom_left;
        let uv = (point - self.bottom_left) / extent;
        if uv.x < 0.0 || uv.x > 1.0 || uv.y < 0.0 || uv.y > 1.0 {
            return Err(GridError::OutOfRange(format!(
                "world point {point} outside box {} .. {}",
                self.bottom_left, self.top_right
            )));
        }

        // Fractional grid coordinates; the upper edge maps into the last cell.
        let fx = (uv.x * (self.nx - 1) as f64).min((self.nx - 2) as f64);
        let fy = (uv.y * (self.ny - 1) as f64).min((self.ny - 2) as f64);
        let j = fx as usize;
        let i = fy as usize;
        let tx = fx - j as f64;
        let ty = fy - i as f64;

        let v00 = self.at(i, j);
        let v01 = self.at(i, j + 1);
        let v10 = self.at(i + 1, j);
        let v11 = self.at(i + 1, j + 1);

        let bottom = v00 * (1.0 - tx) + v01 * tx;
        let top = v10 * (1.0 - tx) + v11 * tx;
        Ok(bottom * (1.0 - ty) + top * ty)
    }

    /// Finite-difference gradient at lattice vertex `(i, j)`, in value per
    /// world unit along each axis.
    ///
    /// Central differences on interior vertices; one-sided differences on the
    /// first and last row/column so the stencil never leaves the grid.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::OutOfRange`] for an invalid index, or
    /// [`GridError::DegenerateRange`] if either dimension is below 2 (no
    /// difference can be formed).
    pub fn gradient(&self, i: usize, j: usize) -> Result<DVec2, GridError> {
        self.check(i, j)?;
        if self.nx < 2 || self.ny < 2 {
            return Err(GridError::DegenerateRange(format!(
                "gradient undefined on a {}x{} grid",
                self.ny, self.nx
            )));
        }
        let cell = self.cell_size();

        let dx = if j == 0 {
            (self.at(i, 1) - self.at(i, 0)) / cell.x
        } else if j == self.nx - 1 {
            (self.at(i, j) - self.at(i, j - 1)) / cell.x
        } else {
            (self.at(i, j + 1) - self.at(i, j - 1)) / (2.0 * cell.x)
        };

        let dy = if i == 0 {
            (self.at(1, j) - self.at(0, j)) / cell.y
        } else if i == self.ny - 1 {
            (self.at(i, j) - self.at(i - 1, j)) / cell.y
        } else {
            (self.at(i + 1, j) - self.at(i - 1, j)) / (2.0 * cell.y)
        };

        Ok(DVec2::new(dx, dy))
    }

    /// Affine remap of all values so the current range becomes `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DegenerateRange`] if every value is identical.
    pub fn normalize(&mut self) -> Result<(), GridError> {
        let min = self.min_value();
        let max = self.max_value();
        self.normalize_range(min, max)
    }

    /// Affine remap interpreting `[lo, hi]` as the value domain, sending it
    /// to `[0, 1]`. A plain linear rescale: values outside the domain land
    /// outside `[0, 1]`, they are not clamped.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DegenerateRange`] if `lo == hi`.
    pub fn normalize_range(&mut self, lo: f64, hi: f64) -> Result<(), GridError> {
        if hi == lo {
            return Err(GridError::DegenerateRange(format!(
                "cannot normalize over the empty domain [{lo}, {hi}]"
            )));
        }
        let scale = 1.0 / (hi - lo);
        for v in &mut self.values {
            *v = (*v - lo) * scale;
        }
        Ok(())
    }
}
