//! Elevation fields, hydrological analysis, and erosion operators.
//!
//! [`HeightField`] is a [`orogen_grid::Grid2D`] of elevations with the
//! machinery the rest of the pipeline consumes: derived scalar fields (slope,
//! drainage area, wetness, stream power, accessibility), batch erosion
//! operators behind the [`ErosionOperator`] trait, grayscale image
//! import/export, and the renderer-facing vertex/normal boundary.
//! [`LayeredField`] couples a heightfield with parallel material layers and
//! event-driven perturbation.

mod drainage;
mod erosion;
mod error;
mod heightfield;
mod image_io;
mod layered;
mod mesh;

pub use erosion::{ErosionOperator, StreamPowerErosion, ThermalWeathering};
pub use error::FieldError;
pub use heightfield::HeightField;
pub use image_io::grid_to_image;
pub use layered::{FireModel, ImpactEvent, LayeredField, RadialBurn, VEGETATION_DESTROYED};
