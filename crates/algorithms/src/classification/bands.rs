//! Quantize continuous rasters into ordered classes
//!
//! Classes are assigned by binary search over ascending edges:
//!
//! ```text
//! class(v) = 1 + |{ e in edges : e <= v }|
//! ```
//!
//! so a value equal to an edge falls in the bucket above it. Class 0 is
//! reserved for invalid cells.

use crate::maybe_rayon::*;
use ndarray::Array2;
use wildhab_core::raster::Raster;
use wildhab_core::vector::AttributeValue;
use wildhab_core::{Error, Result};

/// Most edges a `u8` class grid can hold (classes 1..=255)
pub const MAX_EDGES: usize = 254;

pub const METRES_PER_FOOT: f64 = 0.3048;

/// Classify `grid` into ordered buckets bounded by `edges`.
///
/// # Errors
/// [`Error::InvalidConfiguration`] if the edges are not finite and strictly
/// ascending, or if there are more than [`MAX_EDGES`] of them.
pub fn classify(grid: &Raster<f64>, edges: &[f64]) -> Result<Raster<u8>> {
    validate_edges(edges)?;

    let (rows, cols) = grid.shape();
    let classes: Vec<u8> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| match grid.value(row, col) {
                    Some(v) => 1 + edges.partition_point(|&e| e <= v) as u8,
                    None => 0,
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let data = Array2::from_shape_vec((rows, cols), classes)
        .map_err(|_| Error::size_mismatch((rows, cols), (0, 0)))?;
    let valid = data.mapv(|c| c > 0);
    grid.with_data(data, valid)
}

fn validate_edges(edges: &[f64]) -> Result<()> {
    if edges.len() > MAX_EDGES {
        return Err(Error::invalid_config(
            "edges",
            edges.len(),
            format!("at most {} edges fit in a u8 class grid", MAX_EDGES),
        ));
    }
    if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
        return Err(Error::invalid_config("edges", bad, "edges must be finite"));
    }
    if let Some(pair) = edges.windows(2).find(|w| w[0] >= w[1]) {
        return Err(Error::invalid_config(
            "edges",
            format!("{:?}", pair),
            "edges must be strictly ascending",
        ));
    }
    Ok(())
}

/// Binary mask: 1 where a valid value exceeds `threshold`, 0 elsewhere.
///
/// Invalid cells stay invalid, so the mask can be vectorized without
/// inventing values outside the unit.
pub fn threshold_mask(grid: &Raster<f64>, threshold: f64) -> Result<Raster<u8>> {
    if !threshold.is_finite() {
        return Err(Error::invalid_config("threshold", threshold, "must be finite"));
    }
    Ok(grid.map_valid(|v| u8::from(v > threshold)))
}

/// Evenly spaced edges covering `[min, max]` on multiples of `interval`.
///
/// Runs from `floor(min / interval) * interval` to the first multiple
/// strictly above `max`, so every value in range lands in a labelled band.
pub fn band_edges(min: f64, max: f64, interval: f64) -> Result<Vec<f64>> {
    if !(interval.is_finite() && interval > 0.0) {
        return Err(Error::invalid_config("interval", interval, "must be positive and finite"));
    }
    if !(min.is_finite() && max.is_finite()) || min > max {
        return Err(Error::UpstreamFailure(format!(
            "invalid value range [{}, {}]",
            min, max
        )));
    }

    let start = (min / interval).floor();
    let end = (max / interval).floor() + 1.0;
    let steps = (end - start).round();
    if steps + 1.0 > MAX_EDGES as f64 {
        return Err(Error::invalid_config(
            "interval",
            interval,
            format!("range [{}, {}] needs more than {} edges", min, max, MAX_EDGES),
        ));
    }
    let steps = steps as usize;

    Ok((0..=steps)
        .map(|k| (start + k as f64) * interval)
        .collect())
}

/// Display attributes for elevation bands bounded by `edges`.
///
/// Band `k` in `1..edges.len()` spans `[edges[k-1], edges[k])`. Classifying
/// with [`BandLabels::interior_edges`] yields exactly those band ids for
/// values inside `[edges[0], edges[last])`; other classes get no extra
/// attributes.
#[derive(Debug, Clone)]
pub struct BandLabels {
    edges: Vec<f64>,
}

impl BandLabels {
    pub fn new(edges: Vec<f64>) -> Self {
        Self { edges }
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Edges without the outer two, for use with [`classify`]
    pub fn interior_edges(&self) -> &[f64] {
        match self.edges.len() {
            0..=2 => &self.edges[..0],
            n => &self.edges[1..n - 1],
        }
    }

    /// `label` ("<low>-<high> ft"), `min_m` and `max_m` for `class`
    pub fn properties(&self, class: u8) -> Vec<(String, AttributeValue)> {
        let k = class as usize;
        if k < 1 || k >= self.edges.len() {
            return Vec::new();
        }
        let low = self.edges[k - 1];
        let high = self.edges[k];
        let low_ft = (low / METRES_PER_FOOT).round() as i64;
        let high_ft = (high / METRES_PER_FOOT).round() as i64;
        vec![
            ("label".to_string(), AttributeValue::String(format!("{}-{} ft", low_ft, high_ft))),
            ("min_m".to_string(), AttributeValue::Float(low)),
            ("max_m".to_string(), AttributeValue::Float(high)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(values: Vec<f64>, rows: usize, cols: usize) -> Raster<f64> {
        Raster::from_vec(values, rows, cols).unwrap()
    }

    #[test]
    fn test_classify_buckets() {
        let g = grid(vec![5.0, 10.0, 15.0, 20.0, 25.0, f64::NAN], 1, 6);
        let classes = classify(&g, &[10.0, 20.0]).unwrap();
        let got: Vec<u8> = (0..6).map(|c| classes.get(0, c).unwrap()).collect();
        assert_eq!(got, vec![1, 2, 2, 3, 3, 0]);
        assert!(!classes.is_valid(0, 5));
    }

    #[test]
    fn test_classify_without_edges_is_single_class() {
        let g = grid(vec![-1.0, 0.0, 1e9], 1, 3);
        let classes = classify(&g, &[]).unwrap();
        assert!(classes.data().iter().all(|&c| c == 1));
    }

    #[test]
    fn test_classify_rejects_bad_edges() {
        let g = grid(vec![1.0], 1, 1);
        for edges in [vec![2.0, 1.0], vec![1.0, 1.0], vec![0.0, f64::NAN]] {
            assert!(matches!(
                classify(&g, &edges),
                Err(Error::InvalidConfiguration { name: "edges", .. })
            ));
        }
        let too_many: Vec<f64> = (0..=MAX_EDGES).map(|i| i as f64).collect();
        assert!(classify(&g, &too_many).is_err());
    }

    #[test]
    fn test_threshold_mask() {
        let mut g = grid(vec![10.0, 45.0, 46.0, 80.0], 2, 2);
        g.set_invalid(1, 1).unwrap();
        let mask = threshold_mask(&g, 45.0).unwrap();
        assert_eq!(mask.value(0, 0), Some(0));
        assert_eq!(mask.value(0, 1), Some(0));
        assert_eq!(mask.value(1, 0), Some(1));
        assert_eq!(mask.value(1, 1), None);
    }

    #[test]
    fn test_band_edges_cover_range() {
        let edges = band_edges(1210.0, 2650.0, 304.8).unwrap();
        assert_relative_eq!(edges[0], 3.0 * 304.8, epsilon = 1e-9);
        assert_relative_eq!(*edges.last().unwrap(), 9.0 * 304.8, epsilon = 1e-9);
        assert_eq!(edges.len(), 7);

        let flat = band_edges(600.0, 600.0, 100.0).unwrap();
        assert_eq!(flat, vec![600.0, 700.0]);

        // A maximum on an edge still falls inside the last band
        let exact = band_edges(150.0, 300.0, 100.0).unwrap();
        assert_eq!(exact, vec![100.0, 200.0, 300.0, 400.0]);

        assert!(band_edges(0.0, 1.0, 0.0).is_err());
        assert!(band_edges(5.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_band_edges_tiny_interval_is_rejected() {
        assert!(matches!(
            band_edges(0.0, 1000.0, 1e-17),
            Err(Error::InvalidConfiguration { name: "interval", .. })
        ));
        assert!(matches!(
            band_edges(0.0, 1000.0, 1.0),
            Err(Error::InvalidConfiguration { name: "interval", .. })
        ));
    }

    #[test]
    fn test_band_labels() {
        let labels = BandLabels::new(vec![304.8, 609.6, 914.4]);
        let props = labels.properties(1);
        assert_eq!(
            props[0],
            ("label".to_string(), AttributeValue::String("1000-2000 ft".into()))
        );
        assert_eq!(props[1].1, AttributeValue::Float(304.8));
        assert_eq!(props[2].1, AttributeValue::Float(609.6));

        assert!(labels.properties(0).is_empty());
        assert!(labels.properties(3).is_empty());
        assert_eq!(labels.properties(2).len(), 3);
    }

    #[test]
    fn test_lowest_band_is_class_one() {
        let edges = band_edges(1210.0, 1900.0, 304.8).unwrap();
        let labels = BandLabels::new(edges);
        assert_eq!(labels.interior_edges().len(), labels.edges().len() - 2);

        let g = grid(vec![1210.0, 1500.0, 1900.0], 1, 3);
        let classes = classify(&g, labels.interior_edges()).unwrap();
        let got: Vec<u8> = (0..3).map(|c| classes.get(0, c).unwrap()).collect();
        // 914.4-1219.2, 1219.2-1524.0, 1828.8-2133.6
        assert_eq!(got, vec![1, 2, 4]);
        assert_eq!(
            labels.properties(1)[0].1,
            AttributeValue::String("3000-4000 ft".into())
        );

        let single = BandLabels::new(vec![600.0, 700.0]);
        assert!(single.interior_edges().is_empty());
        assert_eq!(single.properties(1).len(), 3);
    }
}
