//! Clip a DEM to a unit boundary
//!
//! The grid is cropped to the boundary's envelope; cells whose centre falls
//! outside every boundary polygon become invalid.

use crate::maybe_rayon::*;
use geo::{BoundingRect, Geometry, Intersects, MultiPolygon, Point, Polygon};
use ndarray::Array2;
use wildhab_core::crs::crs_matches;
use wildhab_core::raster::Raster;
use wildhab_core::vector::{geometry_kind, FeatureCollection};
use wildhab_core::{Error, Result};

/// Gather the polygonal parts of a unit boundary.
///
/// # Errors
/// [`Error::UpstreamFailure`] when the boundary is empty, has no CRS, or
/// holds non-polygonal geometry.
pub fn boundary_polygons(boundary: &FeatureCollection) -> Result<MultiPolygon<f64>> {
    if boundary.crs().is_none() {
        return Err(Error::UpstreamFailure("unit boundary has no CRS".into()));
    }

    let mut polygons: Vec<Polygon<f64>> = Vec::new();
    for geometry in boundary.geometries() {
        match geometry {
            Geometry::Polygon(p) => polygons.push(p.clone()),
            Geometry::MultiPolygon(mp) => polygons.extend(mp.0.iter().cloned()),
            Geometry::Rect(r) => polygons.push(r.to_polygon()),
            other => {
                return Err(Error::UpstreamFailure(format!(
                    "unit boundary must be polygonal, found {}",
                    geometry_kind(other)
                )));
            }
        }
    }

    if polygons.is_empty() {
        return Err(Error::UpstreamFailure("unit boundary is empty".into()));
    }
    Ok(MultiPolygon::new(polygons))
}

/// Clip `dem` to the unit `boundary`.
///
/// # Errors
/// - [`Error::UpstreamFailure`] if the DEM has no CRS, the boundary is
///   unusable, or the two do not overlap
/// - [`Error::ShapeMismatch`] if boundary and DEM use different CRS
pub fn clip_to_boundary(dem: &Raster<f64>, boundary: &FeatureCollection) -> Result<Raster<f64>> {
    if dem.crs().is_none() {
        return Err(Error::UpstreamFailure("DEM has no CRS".into()));
    }
    let unit = boundary_polygons(boundary)?;
    if !crs_matches(dem.crs(), boundary.crs()) {
        return Err(Error::ShapeMismatch(format!(
            "unit boundary CRS {:?} differs from DEM CRS {:?}",
            boundary.crs().map(|c| c.identifier()),
            dem.crs().map(|c| c.identifier())
        )));
    }

    let rect = unit
        .bounding_rect()
        .ok_or_else(|| Error::UpstreamFailure("unit boundary has no extent".into()))?;

    // Pixel window covering the envelope, clamped to the grid
    let (c0, r0) = dem.geo_to_pixel(rect.min().x, rect.max().y);
    let (c1, r1) = dem.geo_to_pixel(rect.max().x, rect.min().y);
    let (rows, cols) = dem.shape();
    let clamp = |v: f64, hi: usize| -> usize {
        if v.is_nan() || v <= 0.0 {
            0
        } else {
            (v as usize).min(hi)
        }
    };
    let col_lo = clamp(c0.min(c1).floor(), cols);
    let col_hi = clamp(c0.max(c1).ceil(), cols);
    let row_lo = clamp(r0.min(r1).floor(), rows);
    let row_hi = clamp(r0.max(r1).ceil(), rows);

    if col_hi <= col_lo || row_hi <= row_lo {
        return Err(Error::UpstreamFailure(
            "unit boundary does not overlap the DEM".into(),
        ));
    }

    let window = dem.crop(row_lo, col_lo, row_hi - row_lo, col_hi - col_lo)?;
    let (w_rows, w_cols) = window.shape();

    let inside: Vec<bool> = (0..w_rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..w_cols)
                .map(|col| {
                    let (x, y) = window.pixel_to_geo(col, row);
                    window.is_valid(row, col) && unit.intersects(&Point::new(x, y))
                })
                .collect::<Vec<_>>()
        })
        .collect();

    let valid = Array2::from_shape_vec((w_rows, w_cols), inside)
        .map_err(|_| Error::size_mismatch((w_rows, w_cols), (0, 0)))?;
    let (data, _) = window.clone().into_parts();
    window.with_data(data, valid)
}
