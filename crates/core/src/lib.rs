//! # wildhab Core
//!
//! Core types and traits for the wildhab habitat suitability engine.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced grid with an explicit validity mask
//! - `GeoTransform`: axis-aligned pixel/ground mapping with independent cell sizes
//! - `CRS`: coordinate reference system identity and unit checks
//! - `FeatureCollection` / `LineNetwork`: vector features with attributes
//! - `Algorithm`: common shape for the engine's pure computation steps

pub mod crs;
pub mod error;
pub mod raster;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use vector::{AttributeValue, Feature, FeatureCollection, LineNetwork};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Neighborhood, Raster, RasterElement};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection, LineNetwork};
    pub use crate::Algorithm;
}

/// Core trait for the engine's computation steps.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
