//! # wildhab algorithms
//!
//! Terrain derivatives, network cleanup and suitability scoring for
//! wildlife habitat assessment.
//!
//! ## Algorithm Categories
//!
//! - **terrain**: DEM clipping, slope
//! - **vector**: connectivity filtering, attribute cleanup
//! - **proximity**: rasterization, Euclidean distance fields
//! - **classification**: banding, threshold masks, polygon vectorization
//! - **suitability**: desirability scoring, weighted combination
//! - **pipeline**: per-unit assessment

mod maybe_rayon;

pub mod classification;
pub mod pipeline;
pub mod proximity;
pub mod suitability;
pub mod terrain;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classification::{band_edges, classify, threshold_mask, vectorize, BandLabels};
    pub use crate::pipeline::{assess_unit, HabitatAssessment, UnitInputs};
    pub use crate::proximity::{distance_field, rasterize, DistanceField, EuclideanDistance};
    pub use crate::suitability::{
        combine, Criterion, Desirability, HazardProximity, ResourceProximity, SlopeScoring,
        SuitabilityConfig,
    };
    pub use crate::terrain::{clip_to_boundary, slope, Slope, SlopeParams, SlopeUnits};
    pub use crate::vector::{
        clean_network, drop_missing_attribute, filter_connected, group_by_attribute,
        ConnectivityFilter, NetworkKind,
    };
    pub use wildhab_core::prelude::*;
}
