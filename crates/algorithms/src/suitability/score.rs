//! Per-criterion desirability functions
//!
//! Each scorer turns a raw measurement (slope in degrees, distance in ground
//! units) into a desirability in `[0, 1]`, where 1 is most favourable.

use crate::proximity::DistanceField;
use serde::{Deserialize, Serialize};
use wildhab_core::raster::Raster;
use wildhab_core::{Error, Result};

/// A scalar desirability function with a grid form.
pub trait Desirability {
    /// Desirability of a single measurement
    fn score(&self, value: f64) -> f64;

    /// Score every valid cell; invalid cells stay invalid
    fn score_grid(&self, grid: &Raster<f64>) -> Raster<f64> {
        grid.map_valid(|v| self.score(v))
    }
}

/// Stepwise slope desirability.
///
/// | slope (deg)                  | score      |
/// |------------------------------|------------|
/// | `< gentle_below`             | `gentle`   |
/// | `gentle_below ..steep_from`  | `moderate` |
/// | `>= steep_from`              | `steep`    |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeScoring {
    pub gentle_below: f64,
    pub steep_from: f64,
    pub gentle: f64,
    pub moderate: f64,
    pub steep: f64,
}

impl Default for SlopeScoring {
    fn default() -> Self {
        Self {
            gentle_below: 20.0,
            steep_from: 30.0,
            gentle: 0.3,
            moderate: 0.6,
            steep: 1.0,
        }
    }
}

impl SlopeScoring {
    pub fn validate(&self) -> Result<()> {
        for (name, v) in [("slope.gentle_below", self.gentle_below), ("slope.steep_from", self.steep_from)] {
            if !v.is_finite() {
                return Err(Error::invalid_config(name, v, "must be finite"));
            }
        }
        if self.gentle_below > self.steep_from {
            return Err(Error::invalid_config(
                "slope.gentle_below",
                self.gentle_below,
                format!("must not exceed steep_from ({})", self.steep_from),
            ));
        }
        for (name, v) in [
            ("slope.gentle", self.gentle),
            ("slope.moderate", self.moderate),
            ("slope.steep", self.steep),
        ] {
            check_unit_score(name, v)?;
        }
        Ok(())
    }
}

impl Desirability for SlopeScoring {
    fn score(&self, slope_deg: f64) -> f64 {
        if slope_deg < self.gentle_below {
            self.gentle
        } else if slope_deg < self.steep_from {
            self.moderate
        } else {
            self.steep
        }
    }
}

/// Closer is better: `clamp(1 - d / best_within, 0, 1)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceProximity {
    /// Distance at which the score reaches 0, in ground units
    pub best_within: f64,
}

impl Default for ResourceProximity {
    fn default() -> Self {
        Self { best_within: 1500.0 }
    }
}

impl ResourceProximity {
    pub fn validate(&self) -> Result<()> {
        check_distance("resource.best_within", self.best_within)
    }

    /// Score a distance field; with no resource present every cell scores 0
    pub fn score_field(&self, field: &DistanceField) -> Raster<f64> {
        field.map_distances(|d| self.score(d))
    }
}

impl Desirability for ResourceProximity {
    fn score(&self, distance: f64) -> f64 {
        (1.0 - distance / self.best_within).clamp(0.0, 1.0)
    }
}

/// Farther is better: `clamp(d / good_far, 0, 1)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardProximity {
    /// Distance at which the score reaches 1, in ground units
    pub good_far: f64,
}

impl Default for HazardProximity {
    fn default() -> Self {
        Self { good_far: 1000.0 }
    }
}

impl HazardProximity {
    pub fn validate(&self) -> Result<()> {
        check_distance("hazard.good_far", self.good_far)
    }

    /// Score a distance field; with no hazard present every cell scores 1
    pub fn score_field(&self, field: &DistanceField) -> Raster<f64> {
        field.map_distances(|d| self.score(d))
    }
}

impl Desirability for HazardProximity {
    fn score(&self, distance: f64) -> f64 {
        (distance / self.good_far).clamp(0.0, 1.0)
    }
}

fn check_distance(name: &'static str, v: f64) -> Result<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(name, v, "must be a positive distance"))
    }
}

fn check_unit_score(name: &'static str, v: f64) -> Result<()> {
    if (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(Error::invalid_config(name, v, "score must lie in [0, 1]"))
    }
}
