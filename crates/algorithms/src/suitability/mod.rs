//! Multi-criteria habitat suitability
//!
//! Each criterion maps a raw measurement to a desirability in `[0, 1]`;
//! [`combine`] merges the criteria into a weighted 0-100 composite.

mod combine;
mod config;
mod score;

pub use combine::{combine, Criterion};
pub use config::{ClassificationSettings, CriterionWeights, SuitabilityConfig};
pub use score::{Desirability, HazardProximity, ResourceProximity, SlopeScoring};
