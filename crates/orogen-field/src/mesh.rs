//! Renderer-facing vertex and normal export.
//!
//! The core hands an external triangulator a flat row-major vertex list and,
//! on request, per-vertex normals. Triangle indices, buffers, and shading
//! stay on the renderer's side of the boundary.

use glam::DVec3;

use crate::HeightField;

impl HeightField {
    /// The 3D vertex for lattice cell `(i, j)`: `(world x, elevation, world y)`.
    pub fn vertex(&self, i: usize, j: usize) -> DVec3 {
        let p = self.grid().position(i, j);
        DVec3::new(p.x, self.height(i, j), p.y)
    }

    /// All vertices as a flat row-major sequence (`i` outer, `j` inner),
    /// ready for external triangulation.
    pub fn vertices(&self) -> Vec<DVec3> {
        let mut out = Vec::with_capacity(self.grid().len());
        for i in 0..self.ny() {
            for j in 0..self.nx() {
                out.push(self.vertex(i, j));
            }
        }
        out
    }

    /// Per-vertex normals by area-weighted face-normal averaging.
    ///
    /// Each quad is split into two triangles; every triangle's (non-unit)
    /// cross-product normal is accumulated onto its three vertices, so larger
    /// faces weigh more, and the sums are normalized at the end. Returned in
    /// the same row-major order as [`HeightField::vertices`].
    pub fn normals(&self) -> Vec<DVec3> {
        let (nx, ny) = (self.nx(), self.ny());
        let mut sums = vec![DVec3::ZERO; nx * ny];

        for i in 0..ny - 1 {
            for j in 0..nx - 1 {
                let v00 = self.vertex(i, j);
                let v01 = self.vertex(i, j + 1);
                let v10 = self.vertex(i + 1, j);
                let v11 = self.vertex(i + 1, j + 1);

                // Split along the v00-v11 diagonal; winding keeps normals up.
                let n0 = (v11 - v00).cross(v01 - v00);
                let n1 = (v10 - v00).cross(v11 - v00);

                for idx in [i * nx + j, i * nx + j + 1, (i + 1) * nx + j + 1] {
                    sums[idx] += n0;
                }
                for idx in [i * nx + j, (i + 1) * nx + j + 1, (i + 1) * nx + j] {
                    sums[idx] += n1;
                }
            }
        }

        sums.into_iter()
            .map(|n| n.normalize_or(DVec3::Y))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;
    use crate::HeightField;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_vertices_row_major_order() {
        let f = HeightField::new(3, 2, DVec2::ZERO, DVec2::new(2.0, 1.0), 0.5).unwrap();
        let verts = f.vertices();
        assert_eq!(verts.len(), 6);
        // Second row starts at index nx.
        assert!((verts[3] - f.vertex(1, 0)).length() < EPSILON);
        for v in &verts {
            assert!((v.y - 0.5).abs() < EPSILON, "elevation is the y component");
        }
    }

    #[test]
    fn test_flat_field_normals_point_up() {
        let f = HeightField::new(5, 5, DVec2::ZERO, DVec2::new(4.0, 4.0), 2.0).unwrap();
        for (idx, n) in f.normals().iter().enumerate() {
            assert!(
                (*n - DVec3::Y).length() < EPSILON,
                "flat terrain normal at {idx} must be +Y, got {n}"
            );
        }
    }

    #[test]
    fn test_ramp_normals_tilt_against_slope() {
        let mut f = HeightField::new(4, 4, DVec2::ZERO, DVec2::new(3.0, 3.0), 0.0).unwrap();
        for i in 0..4 {
            for j in 0..4 {
                f.grid_mut().set(i, j, i as f64).unwrap();
            }
        }
        for n in f.normals() {
            assert!(n.y > 0.0, "normals must stay upward-facing");
            assert!(
                n.z < 0.0,
                "a ramp rising with world y tilts normals toward -z, got {n}"
            );
            assert!(n.x.abs() < EPSILON, "no tilt across the ramp, got {n}");
        }
    }

    #[test]
    fn test_normals_are_unit_length() {
        let mut f = HeightField::new(6, 6, DVec2::ZERO, DVec2::new(5.0, 5.0), 0.0).unwrap();
        for i in 0..6 {
            for j in 0..6 {
                f.grid_mut().set(i, j, ((i * 7 + j * 3) % 5) as f64).unwrap();
            }
        }
        for n in f.normals() {
            assert!((n.length() - 1.0).abs() < EPSILON, "normal not unit: {n}");
        }
    }
}
