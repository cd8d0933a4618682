//! Classification and vectorization of continuous rasters
//!
//! - **Bands**: quantize values into ordered classes by ascending edges
//! - **Threshold**: binary masks above a cutoff
//! - **Vectorize**: 4-connected class regions to attributed polygons

mod bands;
mod vectorize;

pub use bands::{band_edges, classify, threshold_mask, BandLabels, MAX_EDGES, METRES_PER_FOOT};
pub use vectorize::vectorize;
