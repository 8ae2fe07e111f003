//! Grayscale heightmap import and export.
//!
//! The image boundary: a decoder hands over width, height, and per-pixel red
//! intensity in `[0, 1]`; the core does its own bilinear resampling from
//! image space to grid space and its own linear remap to the altitude range.
//! Export is the inverse: normalize a copy to `[0, 1]` and hand it to the
//! encoder.

use std::path::Path;

use glam::DVec2;
use image::GrayImage;
use orogen_grid::Grid2D;
use tracing::info;

use crate::{FieldError, HeightField};

impl HeightField {
    /// Build a field by resampling a grayscale image.
    ///
    /// The red channel is read as intensity in `[0, 1]` (black maps to
    /// `min_altitude`, white to `max_altitude`), bilinearly resampled from
    /// image resolution to the `nx * ny` lattice.
    ///
    /// # Errors
    ///
    /// Fails explicitly — never silently yields a zero field — with
    /// [`FieldError::Image`] for an unreadable or undecodable file, or
    /// [`FieldError::Grid`] for degenerate grid dimensions.
    pub fn from_image(
        path: &Path,
        nx: usize,
        ny: usize,
        bottom_left: DVec2,
        top_right: DVec2,
        min_altitude: f64,
        max_altitude: f64,
    ) -> Result<Self, FieldError> {
        let img = image::open(path)?.into_rgb8();
        let (w, h) = (img.width() as usize, img.height() as usize);

        let mut field = Self::new(nx, ny, bottom_left, top_right, 0.0)?;
        for i in 0..ny {
            for j in 0..nx {
                // Map lattice coordinates onto fractional pixel coordinates.
                let px = j as f64 / (nx - 1) as f64 * (w - 1) as f64;
                let py = i as f64 / (ny - 1) as f64 * (h - 1) as f64;
                let intensity = sample_red_bilinear(&img, px, py);
                let elevation = min_altitude + intensity * (max_altitude - min_altitude);
                field.grid_mut().set_at(i, j, elevation);
            }
        }
        info!(?path, nx, ny, "heightfield imported from image");
        Ok(field)
    }

    /// Write the field as an 8-bit grayscale image.
    ///
    /// Elevations are normalized to `[0, 1]` (a constant field writes as
    /// black) and quantized to the `0..=255` range.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Image`] if encoding or writing fails.
    pub fn to_image(&self, path: &Path) -> Result<(), FieldError> {
        let min = self.grid().min_value();
        let max = self.grid().max_value();
        let scale = if max > min { 1.0 / (max - min) } else { 0.0 };

        let (nx, ny) = (self.nx() as u32, self.ny() as u32);
        let img = GrayImage::from_fn(nx, ny, |x, y| {
            let v = (self.height(y as usize, x as usize) - min) * scale;
            image::Luma([(v * 255.0).round().clamp(0.0, 255.0) as u8])
        });
        img.save(path)?;
        info!(?path, "heightfield exported to image");
        Ok(())
    }
}

/// Write any scalar grid as an 8-bit grayscale image, normalized over its
/// own value range (a constant grid writes as black).
///
/// # Errors
///
/// Returns [`FieldError::Image`] if encoding or writing fails.
pub fn grid_to_image(grid: &Grid2D<f64>, path: &Path) -> Result<(), FieldError> {
    let min = grid.min_value();
    let max = grid.max_value();
    let scale = if max > min { 1.0 / (max - min) } else { 0.0 };

    let (nx, ny) = (grid.nx() as u32, grid.ny() as u32);
    let img = GrayImage::from_fn(nx, ny, |x, y| {
        let v = (grid.at(y as usize, x as usize) - min) * scale;
        image::Luma([(v * 255.0).round().clamp(0.0, 255.0) as u8])
    });
    img.save(path)?;
    info!(?path, "grid exported to image");
    Ok(())
}

/// Bilinear red-channel sample at fractional pixel coordinates.
fn sample_red_bilinear(img: &image::RgbImage, px: f64, py: f64) -> f64 {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let x0 = (px as usize).min(w.saturating_sub(2));
    let y0 = (py as usize).min(h.saturating_sub(2));
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = (px - x0 as f64).clamp(0.0, 1.0);
    let ty = (py - y0 as f64).clamp(0.0, 1.0);

    let red = |x: usize, y: usize| f64::from(img.get_pixel(x as u32, y as u32)[0]) / 255.0;
    let top = red(x0, y0) * (1.0 - tx) + red(x1, y0) * tx;
    let bottom = red(x0, y1) * (1.0 - tx) + red(x1, y1) * tx;
    top * (1.0 - ty) + bottom * ty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_fails_explicitly() {
        let r = HeightField::from_image(
            Path::new("/nonexistent/heightmap.png"),
            8,
            8,
            DVec2::ZERO,
            DVec2::new(7.0, 7.0),
            0.0,
            100.0,
        );
        assert!(r.is_err(), "an unreadable path must not yield a zero field");
    }

    #[test]
    fn test_round_trip_through_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.png");

        // Vertical ramp, black at row 0 to white at row 7.
        let mut f = HeightField::new(8, 8, DVec2::ZERO, DVec2::new(7.0, 7.0), 0.0).unwrap();
        for i in 0..8 {
            for j in 0..8 {
                f.grid_mut().set(i, j, i as f64).unwrap();
            }
        }
        f.to_image(&path).unwrap();

        let back = HeightField::from_image(
            &path,
            8,
            8,
            DVec2::ZERO,
            DVec2::new(7.0, 7.0),
            0.0,
            7.0,
        )
        .unwrap();

        for i in 0..8 {
            for j in 0..8 {
                let orig = f.height(i, j);
                let got = back.height(i, j);
                // 8-bit quantization allows roughly half a step of error.
                assert!(
                    (orig - got).abs() < 7.0 / 255.0 + 1e-9,
                    "round trip at ({i}, {j}): {orig} vs {got}"
                );
            }
        }
    }

    #[test]
    fn test_constant_field_writes_black() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.png");
        let f = HeightField::new(4, 4, DVec2::ZERO, DVec2::new(3.0, 3.0), 5.0).unwrap();
        f.to_image(&path).unwrap();

        let img = image::open(&path).unwrap().into_luma8();
        for p in img.pixels() {
            assert_eq!(p[0], 0, "a constant field has no range and writes black");
        }
    }
}
