//! Exact Euclidean distance transform
//!
//! Distance from every cell to the nearest present cell of a binary grid,
//! in ground units. Uses the separable lower-envelope-of-parabolas method
//! (Felzenszwalb & Huttenlocher, 2012): one 1-D pass down each column with
//! the cell height as spacing, then one pass along each row with the cell
//! width, which yields exact distances for rectangular cells.

use crate::maybe_rayon::*;
use ndarray::Array2;
use wildhab_core::raster::Raster;
use wildhab_core::{Algorithm, Error, Result};

/// Distance to the nearest present cell, in ground units.
///
/// Every cell is valid and non-negative when at least one cell was present.
/// When the presence grid is empty there is no nearest cell: every distance
/// is `+inf`, the backing raster is entirely invalid, and
/// [`DistanceField::map_distances`] evaluates its function at infinity.
#[derive(Debug, Clone)]
pub struct DistanceField {
    distances: Raster<f64>,
    has_sources: bool,
}

impl DistanceField {
    /// Backing raster (all cells invalid when there were no sources)
    pub fn raster(&self) -> &Raster<f64> {
        &self.distances
    }

    pub fn into_raster(self) -> Raster<f64> {
        self.distances
    }

    /// Whether the presence grid had at least one present cell
    pub fn has_sources(&self) -> bool {
        self.has_sources
    }

    pub fn shape(&self) -> (usize, usize) {
        self.distances.shape()
    }

    /// Distance at (row, col); `+inf` without sources, `None` out of bounds
    pub fn distance(&self, row: usize, col: usize) -> Option<f64> {
        let (rows, cols) = self.shape();
        if row >= rows || col >= cols {
            return None;
        }
        if self.has_sources {
            self.distances.value(row, col)
        } else {
            Some(f64::INFINITY)
        }
    }

    /// Apply `f` to every distance, producing a fully valid grid
    pub fn map_distances<F>(&self, f: F) -> Raster<f64>
    where
        F: Fn(f64) -> f64,
    {
        if self.has_sources {
            self.distances.map_valid(f)
        } else {
            let far = f(f64::INFINITY);
            self.distances.with_same_meta::<f64>().map_valid(|_| far)
        }
    }
}

/// Parameters for the distance transform
#[derive(Debug, Clone, Default)]
pub struct DistanceParams {
    /// Column spacing; defaults to the presence grid's cell width
    pub cell_width: Option<f64>,
    /// Row spacing; defaults to the presence grid's cell height
    pub cell_height: Option<f64>,
}

/// Euclidean distance algorithm
#[derive(Debug, Clone, Default)]
pub struct EuclideanDistance;

impl Algorithm for EuclideanDistance {
    type Input = Raster<u8>;
    type Output = DistanceField;
    type Params = DistanceParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "EuclideanDistance"
    }

    fn description(&self) -> &'static str {
        "Exact Euclidean distance from every cell to the nearest present cell"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let cell_width = params.cell_width.unwrap_or_else(|| input.cell_width());
        let cell_height = params.cell_height.unwrap_or_else(|| input.cell_height());
        distance_field(&input, cell_width, cell_height)
    }
}

/// Compute the distance field of a presence grid.
///
/// Valid non-zero cells are present; zero and invalid cells are absent.
///
/// # Errors
/// [`Error::InvalidConfiguration`] when a cell size is not positive and finite.
pub fn distance_field(
    presence: &Raster<u8>,
    cell_width: f64,
    cell_height: f64,
) -> Result<DistanceField> {
    for (name, size) in [("cell_width", cell_width), ("cell_height", cell_height)] {
        if !(size.is_finite() && size > 0.0) {
            return Err(Error::invalid_config(name, size, "cell size must be positive and finite"));
        }
    }

    let (rows, cols) = presence.shape();
    let mut has_sources = false;
    let seed = Array2::from_shape_fn((rows, cols), |(r, c)| {
        if presence.value(r, c).is_some_and(|v| v != 0) {
            has_sources = true;
            0.0
        } else {
            f64::INFINITY
        }
    });

    if !has_sources {
        let data = Array2::zeros((rows, cols));
        let valid = Array2::from_elem((rows, cols), false);
        return Ok(DistanceField {
            distances: presence.with_data(data, valid)?,
            has_sources,
        });
    }

    // Pass 1: down each column
    let columns: Vec<Vec<f64>> = (0..cols)
        .into_par_iter()
        .map(|col| {
            let f: Vec<f64> = seed.column(col).to_vec();
            squared_distance_1d(&f, cell_height)
        })
        .collect();

    // Pass 2: along each row
    let squared: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let f: Vec<f64> = columns.iter().map(|column| column[row]).collect();
            squared_distance_1d(&f, cell_width)
        })
        .collect();

    let data = Array2::from_shape_vec((rows, cols), squared)
        .map_err(|_| Error::size_mismatch((rows, cols), (0, 0)))?
        .mapv(f64::sqrt);
    let valid = Array2::from_elem((rows, cols), true);

    Ok(DistanceField {
        distances: presence.with_data(data, valid)?,
        has_sources,
    })
}

/// 1-D squared distance transform of sampled function `f` with sample spacing
/// `spacing`. Infinite samples contribute no parabola; a line with no finite
/// sample stays infinite.
fn squared_distance_1d(f: &[f64], spacing: f64) -> Vec<f64> {
    let n = f.len();
    let pos = |q: usize| q as f64 * spacing;

    let finite: Vec<usize> = (0..n).filter(|&q| f[q].is_finite()).collect();
    if finite.is_empty() {
        return vec![f64::INFINITY; n];
    }

    // Intersection abscissa of the parabolas rooted at q and p (q > p)
    let intersect = |q: usize, p: usize| -> f64 {
        let (pq, pp) = (pos(q), pos(p));
        ((f[q] + pq * pq) - (f[p] + pp * pp)) / (2.0 * (pq - pp))
    };

    // Lower envelope: parabola roots `v`, boundaries `z`
    let mut v: Vec<usize> = Vec::with_capacity(finite.len());
    let mut z: Vec<f64> = Vec::with_capacity(finite.len() + 1);
    v.push(finite[0]);
    z.push(f64::NEG_INFINITY);

    for &q in &finite[1..] {
        let mut s = intersect(q, v[v.len() - 1]);
        while v.len() > 1 && s <= z[z.len() - 1] {
            v.pop();
            z.pop();
            s = intersect(q, v[v.len() - 1]);
        }
        v.push(q);
        z.push(s);
    }

    let mut out = vec![0.0; n];
    let mut k = 0;
    for (q, slot) in out.iter_mut().enumerate() {
        let x = pos(q);
        while k + 1 < v.len() && z[k + 1] < x {
            k += 1;
        }
        let d = x - pos(v[k]);
        *slot = d * d + f[v[k]];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single_source(rows: usize, cols: usize, at: (usize, usize)) -> Raster<u8> {
        let mut presence: Raster<u8> = Raster::new(rows, cols);
        presence.set(at.0, at.1, 1).unwrap();
        presence
    }

    #[test]
    fn test_single_source_matches_euclid() {
        let presence = single_source(9, 11, (4, 5));
        let field = distance_field(&presence, 1.0, 1.0).unwrap();

        assert_eq!(field.distance(4, 5), Some(0.0));
        for row in 0..9 {
            for col in 0..11 {
                let dr = row as f64 - 4.0;
                let dc = col as f64 - 5.0;
                assert_relative_eq!(
                    field.distance(row, col).unwrap(),
                    (dr * dr + dc * dc).sqrt(),
                    epsilon = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_anisotropic_spacing() {
        let presence = single_source(5, 5, (0, 0));
        let field = distance_field(&presence, 30.0, 10.0).unwrap();

        assert_relative_eq!(field.distance(0, 1).unwrap(), 30.0, epsilon = 1e-9);
        assert_relative_eq!(field.distance(1, 0).unwrap(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(
            field.distance(3, 2).unwrap(),
            (30.0_f64.powi(2) + 60.0_f64.powi(2)).sqrt(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_nearest_of_several_sources() {
        let mut presence: Raster<u8> = Raster::new(1, 10);
        presence.set(0, 0, 1).unwrap();
        presence.set(0, 9, 1).unwrap();
        let field = distance_field(&presence, 2.0, 2.0).unwrap();

        let got: Vec<f64> = (0..10).map(|c| field.distance(0, c).unwrap()).collect();
        assert_eq!(got, vec![0.0, 2.0, 4.0, 6.0, 8.0, 8.0, 6.0, 4.0, 2.0, 0.0]);
    }

    #[test]
    fn test_invalid_presence_cells_are_absent() {
        let mut presence = single_source(3, 3, (1, 1));
        presence.set(0, 0, 1).unwrap();
        presence.set_invalid(0, 0).unwrap();
        let field = distance_field(&presence, 1.0, 1.0).unwrap();
        assert_relative_eq!(field.distance(0, 0).unwrap(), 2.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_presence_is_infinitely_far() {
        let presence: Raster<u8> = Raster::new(4, 4);
        let field = distance_field(&presence, 1.0, 1.0).unwrap();

        assert!(!field.has_sources());
        assert_eq!(field.distance(2, 2), Some(f64::INFINITY));
        assert_eq!(field.raster().valid_count(), 0);

        let capped = field.map_distances(|d| d.min(100.0));
        assert_eq!(capped.valid_count(), 16);
        assert_eq!(capped.value(3, 3), Some(100.0));
    }

    #[test]
    fn test_algorithm_uses_transform_spacing() {
        let presence = single_source(3, 3, (0, 0))
            .with_transform(wildhab_core::GeoTransform::new(0.0, 0.0, 5.0, -7.0));
        let field = EuclideanDistance.execute_default(presence).unwrap();
        assert_relative_eq!(field.distance(0, 2).unwrap(), 10.0, epsilon = 1e-12);
        assert_relative_eq!(field.distance(2, 0).unwrap(), 14.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_spacing() {
        let presence = single_source(3, 3, (0, 0));
        assert!(matches!(
            distance_field(&presence, -1.0, 1.0),
            Err(Error::InvalidConfiguration { .. })
        ));
    }
}
