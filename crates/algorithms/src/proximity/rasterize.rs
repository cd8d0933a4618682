//! Burn vector features onto a grid
//!
//! "Any touch" policy: a cell is present when any part of any geometry
//! intersects the cell's ground rectangle, not only when the geometry covers
//! the cell centre. Thin features such as roads and streams therefore leave
//! an unbroken trail of cells.

use geo::{BoundingRect, Geometry, Intersects, Line, Point, Rect};
use ndarray::Array2;
use wildhab_core::raster::{GeoTransform, Raster};
use wildhab_core::vector::FeatureCollection;
use wildhab_core::{Error, Result};

/// Rasterize `features` onto a grid of `shape` (rows, cols) placed by
/// `transform`. Present cells hold 1, all others 0; every cell is valid and
/// the grid carries the features' CRS.
///
/// # Errors
/// [`Error::InvalidConfiguration`] for a transform with a zero or non-finite
/// cell size.
pub fn rasterize(
    features: &FeatureCollection,
    shape: (usize, usize),
    transform: &GeoTransform,
) -> Result<Raster<u8>> {
    for (name, size) in [
        ("pixel_width", transform.pixel_width),
        ("pixel_height", transform.pixel_height),
    ] {
        if !size.is_finite() || size == 0.0 {
            return Err(Error::invalid_config(name, size, "cell size must be non-zero and finite"));
        }
    }

    let mut burner = Burner {
        grid: Array2::zeros(shape),
        transform,
    };
    for geometry in features.geometries() {
        burner.burn(geometry);
    }

    let grid = Raster::from_array(burner.grid)
        .with_transform(*transform)
        .with_crs(features.crs().cloned());
    Ok(grid)
}

struct Burner<'a> {
    grid: Array2<u8>,
    transform: &'a GeoTransform,
}

impl Burner<'_> {
    fn burn(&mut self, geometry: &Geometry<f64>) {
        match geometry {
            Geometry::Point(p) => self.burn_window(p),
            Geometry::MultiPoint(mp) => mp.iter().for_each(|p| self.burn_window(p)),
            Geometry::Line(l) => self.burn_window(l),
            // Segment by segment keeps each search window small
            Geometry::LineString(ls) => ls.lines().for_each(|l| self.burn_segment(l)),
            Geometry::MultiLineString(mls) => mls
                .iter()
                .flat_map(|ls| ls.lines())
                .for_each(|l| self.burn_segment(l)),
            Geometry::Polygon(p) => self.burn_window(p),
            Geometry::MultiPolygon(mp) => mp.iter().for_each(|p| self.burn_window(p)),
            Geometry::Rect(r) => self.burn_window(r),
            Geometry::Triangle(t) => self.burn_window(t),
            Geometry::GeometryCollection(gc) => gc.iter().for_each(|g| self.burn(g)),
        }
    }

    fn burn_segment(&mut self, line: Line<f64>) {
        if line.start == line.end {
            self.burn_window(&Point::from(line.start));
        } else {
            self.burn_window(&line);
        }
    }

    /// Test every cell under the geometry's envelope
    fn burn_window<G>(&mut self, geometry: &G)
    where
        G: BoundingRect<f64> + Intersects<Rect<f64>>,
        G::Output: Into<Option<Rect<f64>>>,
    {
        let envelope: Option<Rect<f64>> = geometry.bounding_rect().into();
        let Some(envelope) = envelope else {
            return;
        };
        let Some((rows, cols)) = self.window(&envelope) else {
            return;
        };
        for row in rows.0..=rows.1 {
            for col in cols.0..=cols.1 {
                if self.grid[(row, col)] == 0
                    && geometry.intersects(&self.transform.cell_rect(col, row))
                {
                    self.grid[(row, col)] = 1;
                }
            }
        }
    }

    /// Inclusive (row, col) index ranges covering `envelope`, clamped to the grid
    #[allow(clippy::type_complexity)]
    fn window(&self, envelope: &Rect<f64>) -> Option<((usize, usize), (usize, usize))> {
        let (rows, cols) = self.grid.dim();
        if rows == 0 || cols == 0 {
            return None;
        }
        let (c0, r0) = self.transform.geo_to_pixel(envelope.min().x, envelope.min().y);
        let (c1, r1) = self.transform.geo_to_pixel(envelope.max().x, envelope.max().y);

        // Cell i spans [i, i + 1], so a coordinate on a cell edge touches both sides
        let span = |a: f64, b: f64, n: usize| -> Option<(usize, usize)> {
            let lo = (a.min(b) - 1.0).ceil();
            let hi = a.max(b).floor();
            if !lo.is_finite() || !hi.is_finite() || hi < 0.0 || lo >= n as f64 {
                return None;
            }
            let lo = lo.max(0.0) as usize;
            let hi = (hi as usize).min(n - 1);
            Some((lo, hi))
        };

        Some((span(r0, r1, rows)?, span(c0, c1, cols)?))
    }
}
