//! Weighted combination of criterion scores into a 0-100 composite

use crate::maybe_rayon::*;
use ndarray::Array2;
use tracing::debug;
use wildhab_core::raster::Raster;
use wildhab_core::{Error, Result};

/// One scored criterion and its weight in the composite
#[derive(Debug, Clone)]
pub struct Criterion {
    pub name: String,
    /// Scores in `[0, 1]` on the base grid
    pub scores: Raster<f64>,
    /// Non-negative weight
    pub weight: f64,
}

impl Criterion {
    pub fn new(name: impl Into<String>, scores: Raster<f64>, weight: f64) -> Self {
        Self {
            name: name.into(),
            scores,
            weight,
        }
    }
}

/// Weighted arithmetic mean of the criteria, scaled to `[0, 100]`:
///
/// ```text
/// composite = 100 * Σ(w_i * s_i) / Σ(w_i)
/// ```
///
/// A cell is invalid where `base` is invalid or where any criterion with a
/// positive weight is invalid. Zero-weight criteria are checked for grid
/// agreement but never read.
///
/// # Errors
/// - [`Error::InvalidConfiguration`] for a negative or non-finite weight, or
///   when the weights do not sum to a positive, finite total
/// - [`Error::ShapeMismatch`] when a criterion grid differs from `base` in
///   shape, transform or CRS
/// - [`Error::UpstreamFailure`] when a valid score lies outside `[0, 1]`
pub fn combine(criteria: &[Criterion], base: &Raster<f64>) -> Result<Raster<f64>> {
    for c in criteria {
        if !c.weight.is_finite() || c.weight < 0.0 {
            return Err(Error::invalid_config(
                "weight",
                c.weight,
                format!("criterion '{}' needs a finite, non-negative weight", c.name),
            ));
        }
    }
    let total: f64 = criteria.iter().map(|c| c.weight).sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(Error::invalid_config(
            "weights",
            total,
            "weights must sum to a positive, finite total",
        ));
    }

    for c in criteria {
        base.ensure_same_grid(&c.scores).map_err(|e| match e {
            Error::ShapeMismatch(msg) => {
                Error::ShapeMismatch(format!("criterion '{}': {}", c.name, msg))
            }
            other => other,
        })?;
        let out_of_range = c
            .scores
            .data()
            .iter()
            .zip(c.scores.validity().iter())
            .find(|(s, ok)| **ok && !(0.0..=1.0).contains(*s));
        if let Some((s, _)) = out_of_range {
            return Err(Error::UpstreamFailure(format!(
                "criterion '{}' has score {} outside [0, 1]",
                c.name, s
            )));
        }
    }

    let weighted: Vec<&Criterion> = criteria.iter().filter(|c| c.weight > 0.0).collect();
    let (rows, cols) = base.shape();

    let cells: Vec<Option<f64>> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    if !base.is_valid(row, col) {
                        return None;
                    }
                    let mut acc = 0.0;
                    for c in &weighted {
                        acc += c.weight * c.scores.value(row, col)?;
                    }
                    Some(100.0 * acc / total)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let valid = Array2::from_shape_fn((rows, cols), |(r, c)| cells[r * cols + c].is_some());
    let data = Array2::from_shape_fn((rows, cols), |(r, c)| cells[r * cols + c].unwrap_or(0.0));
    let composite = base.with_data(data, valid)?;

    debug!(
        "Combined {} criteria (total weight {}) into {} valid cells",
        criteria.len(),
        total,
        composite.valid_count()
    );
    Ok(composite)
}
