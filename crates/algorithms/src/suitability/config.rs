//! Suitability model configuration
//!
//! Every field has a default, so a partial document only overrides what it
//! names:
//!
//! ```json
//! { "weights": { "roads": 2.0 }, "connectivity_tolerance": 5.0 }
//! ```

use super::score::{HazardProximity, ResourceProximity, SlopeScoring};
use crate::classification::METRES_PER_FOOT;
use serde::{Deserialize, Serialize};
use wildhab_core::{Error, Result};

/// Relative weight of each criterion in the composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriterionWeights {
    pub slope: f64,
    pub water: f64,
    pub roads: f64,
}

impl Default for CriterionWeights {
    fn default() -> Self {
        Self {
            slope: 1.5,
            water: 1.5,
            roads: 1.0,
        }
    }
}

impl CriterionWeights {
    pub fn total(&self) -> f64 {
        self.slope + self.water + self.roads
    }
}

/// Settings for the display classifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationSettings {
    /// Elevation band height in metres
    pub elevation_interval: f64,
    /// Slopes above this many degrees are mapped as steep ground
    pub steep_threshold: f64,
}

impl Default for ClassificationSettings {
    fn default() -> Self {
        Self {
            elevation_interval: 1000.0 * METRES_PER_FOOT,
            steep_threshold: 45.0,
        }
    }
}

/// All tunable constants of the suitability model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuitabilityConfig {
    pub slope: SlopeScoring,
    /// Water desirability
    pub resource: ResourceProximity,
    /// Road desirability
    pub hazard: HazardProximity,
    pub weights: CriterionWeights,
    pub classification: ClassificationSettings,
    /// Endpoint tolerance for network cleaning, in CRS units
    pub connectivity_tolerance: f64,
    /// Drop disconnected roads and flowlines before rasterizing; off by
    /// default so scoring sees the raw layers
    pub clean_networks: bool,
}

impl Default for SuitabilityConfig {
    fn default() -> Self {
        Self {
            slope: SlopeScoring::default(),
            resource: ResourceProximity::default(),
            hazard: HazardProximity::default(),
            weights: CriterionWeights::default(),
            classification: ClassificationSettings::default(),
            connectivity_tolerance: 0.0,
            clean_networks: false,
        }
    }
}

impl SuitabilityConfig {
    /// Check every constant before any computation starts.
    pub fn validate(&self) -> Result<()> {
        self.slope.validate()?;
        self.resource.validate()?;
        self.hazard.validate()?;

        for (name, w) in [
            ("weights.slope", self.weights.slope),
            ("weights.water", self.weights.water),
            ("weights.roads", self.weights.roads),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(Error::invalid_config(name, w, "must be finite and non-negative"));
            }
        }
        let total = self.weights.total();
        if !(total.is_finite() && total > 0.0) {
            return Err(Error::invalid_config(
                "weights",
                total,
                "weights must sum to a positive, finite total",
            ));
        }

        let interval = self.classification.elevation_interval;
        if !(interval.is_finite() && interval > 0.0) {
            return Err(Error::invalid_config(
                "classification.elevation_interval",
                interval,
                "must be positive",
            ));
        }
        let steep = self.classification.steep_threshold;
        if !(0.0..=90.0).contains(&steep) {
            return Err(Error::invalid_config(
                "classification.steep_threshold",
                steep,
                "must be an angle between 0 and 90 degrees",
            ));
        }

        let tol = self.connectivity_tolerance;
        if !tol.is_finite() || tol < 0.0 {
            return Err(Error::invalid_config(
                "connectivity_tolerance",
                tol,
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }
}
