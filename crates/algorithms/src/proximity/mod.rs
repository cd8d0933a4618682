//! Presence grids and distance fields
//!
//! - Rasterize: burn vector layers onto a target grid ("any touch")
//! - Distance: exact Euclidean distance to the nearest present cell

mod distance;
mod rasterize;

pub use distance::{distance_field, DistanceField, DistanceParams, EuclideanDistance};
pub use rasterize::rasterize;
