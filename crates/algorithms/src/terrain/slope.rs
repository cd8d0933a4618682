//! Slope calculation from DEMs
//!
//! Centred finite differences along each axis, scaled by that axis' cell
//! dimension, so grids with rectangular cells are handled exactly.

use crate::maybe_rayon::*;
use ndarray::Array2;
use wildhab_core::raster::Raster;
use wildhab_core::{Algorithm, Error, Result};

/// Units for slope output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlopeUnits {
    /// Degrees (0-90)
    #[default]
    Degrees,
    /// Percent (0-infinity, typically 0-100+)
    Percent,
    /// Radians (0-π/2)
    Radians,
}

/// Parameters for slope calculation
#[derive(Debug, Clone)]
pub struct SlopeParams {
    /// Output units
    pub units: SlopeUnits,
    /// Multiplier applied to elevation differences, for DEMs whose vertical
    /// unit differs from the horizontal one
    pub z_factor: f64,
}

impl Default for SlopeParams {
    fn default() -> Self {
        Self {
            units: SlopeUnits::Degrees,
            z_factor: 1.0,
        }
    }
}

/// Slope algorithm; cell sizes are taken from the input's transform
#[derive(Debug, Clone, Default)]
pub struct Slope;

impl Algorithm for Slope {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = SlopeParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Slope"
    }

    fn description(&self) -> &'static str {
        "Calculate slope from a DEM using centred finite differences"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        slope(&input, input.cell_width(), input.cell_height(), params)
    }
}

/// Calculate slope from a DEM.
///
/// ```text
/// dz/dx = (z[r, c+1] - z[r, c-1]) / (2 * cell_width)
/// dz/dy = (z[r+1, c] - z[r-1, c]) / (2 * cell_height)
/// slope = atan(sqrt(dz/dx² + dz/dy²))
/// ```
///
/// Edge policy: when one of the two neighbours along an axis lies outside the
/// grid or is invalid, the one-sided difference against the remaining
/// neighbour is used. With no valid neighbour along an axis, that axis
/// contributes no gradient. Invalid DEM cells are invalid in the output.
///
/// # Errors
/// [`Error::InvalidConfiguration`] when a cell size is not positive and finite.
pub fn slope(
    dem: &Raster<f64>,
    cell_width: f64,
    cell_height: f64,
    params: SlopeParams,
) -> Result<Raster<f64>> {
    check_cell_size("cell_width", cell_width)?;
    check_cell_size("cell_height", cell_height)?;
    if !params.z_factor.is_finite() {
        return Err(Error::invalid_config("z_factor", params.z_factor, "must be finite"));
    }

    let (rows, cols) = dem.shape();
    let z = params.z_factor;

    let cells: Vec<Option<f64>> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![None; cols];

            for (col, out) in row_data.iter_mut().enumerate() {
                let Some(e) = dem.value(row, col) else {
                    continue;
                };

                let west = col.checked_sub(1).and_then(|c| dem.value(row, c));
                let east = dem.value(row, col + 1);
                let north = row.checked_sub(1).and_then(|r| dem.value(r, col));
                let south = dem.value(row + 1, col);

                let dz_dx = axis_gradient(west, e, east, cell_width) * z;
                let dz_dy = axis_gradient(north, e, south, cell_height) * z;

                let slope_rad = (dz_dx * dz_dx + dz_dy * dz_dy).sqrt().atan();

                *out = Some(match params.units {
                    SlopeUnits::Degrees => slope_rad.to_degrees(),
                    SlopeUnits::Percent => slope_rad.tan() * 100.0,
                    SlopeUnits::Radians => slope_rad,
                });
            }

            row_data
        })
        .collect();

    let valid = Array2::from_shape_fn((rows, cols), |(r, c)| cells[r * cols + c].is_some());
    let data = Array2::from_shape_fn((rows, cols), |(r, c)| cells[r * cols + c].unwrap_or(0.0));

    dem.with_data(data, valid)
}

/// Derivative along one axis from the neighbours before and after the centre
fn axis_gradient(before: Option<f64>, centre: f64, after: Option<f64>, spacing: f64) -> f64 {
    match (before, after) {
        (Some(b), Some(a)) => (a - b) / (2.0 * spacing),
        (None, Some(a)) => (a - centre) / spacing,
        (Some(b), None) => (centre - b) / spacing,
        (None, None) => 0.0,
    }
}

fn check_cell_size(name: &'static str, size: f64) -> Result<()> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(name, size, "cell size must be positive and finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use wildhab_core::GeoTransform;

    /// Plane rising 1 m per column; cells `cell_width` wide.
    fn ramp_dem(rows: usize, cols: usize, cell_width: f64) -> Raster<f64> {
        let mut dem = Raster::new(rows, cols)
            .with_transform(GeoTransform::new(0.0, rows as f64, cell_width, -1.0));
        for row in 0..rows {
            for col in 0..cols {
                dem.set(row, col, col as f64).unwrap();
            }
        }
        dem
    }

    #[test]
    fn test_slope_flat() {
        let dem: Raster<f64> = Raster::filled(10, 10, 100.0);
        let result = slope(&dem, 1.0, 1.0, SlopeParams::default()).unwrap();

        for row in 0..10 {
            for col in 0..10 {
                assert!(result.value(row, col).unwrap().abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_slope_ramp_is_45_degrees_everywhere() {
        let dem = ramp_dem(6, 6, 1.0);
        let result = slope(&dem, 1.0, 1.0, SlopeParams::default()).unwrap();

        // One-sided differences at the edges see the same gradient.
        for (row, col) in [(0, 0), (3, 3), (5, 5), (2, 0), (2, 5)] {
            assert_relative_eq!(result.value(row, col).unwrap(), 45.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_slope_honours_anisotropic_cells() {
        // 1 m rise over 2 m wide cells -> atan(0.5)
        let dem = ramp_dem(5, 5, 2.0);
        let result = slope(&dem, 2.0, 1.0, SlopeParams::default()).unwrap();
        assert_relative_eq!(
            result.value(2, 2).unwrap(),
            0.5_f64.atan().to_degrees(),
            epsilon = 1e-9
        );

        let via_trait = Slope.execute_default(dem).unwrap();
        assert_relative_eq!(
            via_trait.value(2, 2).unwrap(),
            0.5_f64.atan().to_degrees(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_slope_units() {
        let dem = ramp_dem(5, 5, 1.0);
        let params = |units| SlopeParams { units, z_factor: 1.0 };

        let deg = slope(&dem, 1.0, 1.0, params(SlopeUnits::Degrees)).unwrap();
        let rad = slope(&dem, 1.0, 1.0, params(SlopeUnits::Radians)).unwrap();
        let pct = slope(&dem, 1.0, 1.0, params(SlopeUnits::Percent)).unwrap();

        let rad_val = rad.value(2, 2).unwrap();
        assert_relative_eq!(deg.value(2, 2).unwrap(), rad_val.to_degrees(), epsilon = 1e-9);
        assert_relative_eq!(pct.value(2, 2).unwrap(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_cells_propagate_and_neighbours_fall_back() {
        let mut dem = ramp_dem(5, 5, 1.0);
        dem.set_invalid(2, 2).unwrap();

        let result = slope(&dem, 1.0, 1.0, SlopeParams::default()).unwrap();
        assert!(!result.is_valid(2, 2));
        // (2, 1) loses its east neighbour and uses the one-sided difference
        assert_relative_eq!(result.value(2, 1).unwrap(), 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_bad_cell_size() {
        let dem = ramp_dem(3, 3, 1.0);
        assert!(matches!(
            slope(&dem, 0.0, 1.0, SlopeParams::default()),
            Err(Error::InvalidConfiguration { name: "cell_width", .. })
        ));
        assert!(matches!(
            slope(&dem, 1.0, f64::NAN, SlopeParams::default()),
            Err(Error::InvalidConfiguration { name: "cell_height", .. })
        ));
    }
}
