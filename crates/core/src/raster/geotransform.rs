//! Affine geotransformation for rasters

use geo_types::{coord, Rect};
use serde::{Deserialize, Serialize};

/// Relative tolerance used when comparing transforms of grids that are
/// expected to line up cell for cell.
const ALIGN_EPSILON: f64 = 1e-9;

/// Axis-aligned transformation between pixel and ground coordinates.
///
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// For north-up grids `pixel_height` is negative. Width and height are
/// independent, so anisotropic cells are represented exactly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell size in X direction
    pub pixel_width: f64,
    /// Cell size in Y direction, usually negative
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Ground width of one cell
    pub fn cell_width(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Ground height of one cell
    pub fn cell_height(&self) -> f64 {
        self.pixel_height.abs()
    }

    /// Ground coordinates of the centre of cell (col, row)
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.pixel_to_geo_f(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Ground coordinates of the top-left corner of cell (col, row)
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        self.pixel_to_geo_f(col as f64, row as f64)
    }

    /// Ground coordinates of a fractional pixel position
    pub fn pixel_to_geo_f(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width,
            self.origin_y + row * self.pixel_height,
        )
    }

    /// Convert ground coordinates to fractional pixel coordinates (col, row).
    ///
    /// Use `.floor()` to get integer indices. A degenerate transform yields NaN.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        if self.pixel_width.abs() < 1e-12 || self.pixel_height.abs() < 1e-12 {
            return (f64::NAN, f64::NAN);
        }
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// Ground rectangle covered by cell (col, row)
    pub fn cell_rect(&self, col: usize, row: usize) -> Rect<f64> {
        let (x0, y0) = self.pixel_to_geo_corner(col, row);
        let (x1, y1) = self.pixel_to_geo_corner(col + 1, row + 1);
        Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 })
    }

    /// Transform of a sub-window starting at (col, row)
    pub fn window(&self, col: usize, row: usize) -> Self {
        let (origin_x, origin_y) = self.pixel_to_geo_corner(col, row);
        Self::new(origin_x, origin_y, self.pixel_width, self.pixel_height)
    }

    /// Whether two transforms place cells at the same ground positions
    pub fn aligns_with(&self, other: &GeoTransform) -> bool {
        let scale = self
            .pixel_width
            .abs()
            .max(self.pixel_height.abs())
            .max(1.0);
        let close = |a: f64, b: f64| (a - b).abs() <= ALIGN_EPSILON * scale.max(a.abs()).max(b.abs());
        close(self.origin_x, other.origin_x)
            && close(self.origin_y, other.origin_y)
            && close(self.pixel_width, other.pixel_width)
            && close(self.pixel_height, other.pixel_height)
    }

    /// Bounding box (min_x, min_y, max_x, max_y) for a grid of the given size
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.pixel_to_geo_corner(0, 0);
        let (x1, y1) = self.pixel_to_geo_corner(width, height);
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}
