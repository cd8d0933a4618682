//! Terrain analysis algorithms
//!
//! Algorithms for preparing and analyzing Digital Elevation Models (DEMs):
//! - Clip: restrict a DEM to a unit boundary
//! - Slope: rate of change of elevation

mod clip;
mod slope;

pub use clip::{boundary_polygons, clip_to_boundary};
pub use slope::{slope, Slope, SlopeParams, SlopeUnits};
