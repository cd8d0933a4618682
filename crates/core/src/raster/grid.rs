//! Main Raster type

use crate::crs::{crs_matches, CRS};
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::{s, Array2, ArrayView2, Zip};

/// A georeferenced 2D raster grid with an explicit validity mask.
///
/// `Raster<T>` stores values of type `T` in a 2D grid together with a
/// boolean mask of the same shape. A cell is "no data" exactly when its mask
/// entry is `false`; invalid cells always hold `T::zero()` so stray arithmetic
/// over the raw array cannot pick up a sentinel.
///
/// # Example
///
/// ```ignore
/// use wildhab_core::Raster;
///
/// let mut raster: Raster<f64> = Raster::new(100, 100);
/// raster.set(10, 20, 42.0)?;
/// raster.set_invalid(0, 0)?;
///
/// assert_eq!(raster.value(10, 20), Some(42.0));
/// assert_eq!(raster.value(0, 0), None);
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    /// Raster data stored in row-major order (row, col)
    data: Array2<T>,
    /// `true` where the cell holds a meaningful value
    valid: Array2<bool>,
    transform: GeoTransform,
    crs: Option<CRS>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros, every cell valid
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::zero())
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from row-major data.
    ///
    /// Non-finite values (NaN, infinities) become invalid cells.
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data).map_err(|_| {
            Error::InvalidDimensions {
                width: cols,
                height: rows,
            }
        })?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray; non-finite values become invalid cells
    pub fn from_array(data: Array2<T>) -> Self {
        let valid = data.map(|v| v.is_finite_value());
        Self::normalized(data, valid, GeoTransform::default(), None)
    }

    /// Create a raster from values and an explicit validity mask
    pub fn from_parts(data: Array2<T>, valid: Array2<bool>) -> Result<Self> {
        if data.dim() != valid.dim() {
            return Err(Error::size_mismatch(data.dim(), valid.dim()));
        }
        let valid = Zip::from(&data)
            .and(&valid)
            .map_collect(|v, &ok| ok && v.is_finite_value());
        Ok(Self::normalized(data, valid, GeoTransform::default(), None))
    }

    fn normalized(
        mut data: Array2<T>,
        valid: Array2<bool>,
        transform: GeoTransform,
        crs: Option<CRS>,
    ) -> Self {
        Zip::from(&mut data).and(&valid).for_each(|v, &ok| {
            if !ok {
                *v = T::zero();
            }
        });
        Self {
            data,
            valid,
            transform,
            crs,
        }
    }

    /// Mark every cell equal to `sentinel` as invalid.
    ///
    /// For collaborators whose source format encodes no-data as a value.
    pub fn mask_value(mut self, sentinel: T) -> Self {
        Zip::from(&mut self.data)
            .and(&mut self.valid)
            .for_each(|v, ok| {
                if *v == sentinel {
                    *ok = false;
                    *v = T::zero();
                }
            });
        self
    }

    /// Build a raster of another type on the same grid as `self`
    pub fn with_data<U: RasterElement>(
        &self,
        data: Array2<U>,
        valid: Array2<bool>,
    ) -> Result<Raster<U>> {
        if data.dim() != self.shape() {
            return Err(Error::size_mismatch(self.shape(), data.dim()));
        }
        let mut out = Raster::from_parts(data, valid)?;
        out.transform = self.transform;
        out.crs = self.crs.clone();
        Ok(out)
    }

    /// Create a raster of another type with the same dimensions and metadata,
    /// filled with zeros and fully valid
    pub fn with_same_meta<U: RasterElement>(&self) -> Raster<U> {
        Raster {
            data: Array2::zeros(self.shape()),
            valid: Array2::from_elem(self.shape(), true),
            transform: self.transform,
            crs: self.crs.clone(),
        }
    }

    /// Builder-style transform setter
    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder-style CRS setter
    pub fn with_crs(mut self, crs: Option<CRS>) -> Self {
        self.crs = crs;
        self
    }

    // Dimensions

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Raw value at (row, col), regardless of validity
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Value at (row, col) if the cell exists and is valid
    pub fn value(&self, row: usize, col: usize) -> Option<T> {
        if self.is_valid(row, col) {
            Some(self.data[(row, col)])
        } else {
            None
        }
    }

    /// Whether (row, col) is inside the grid and holds a valid value
    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.valid.get((row, col)).copied().unwrap_or(false)
    }

    /// Set value at (row, col); a non-finite value marks the cell invalid
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        self.check_bounds(row, col)?;
        if value.is_finite_value() {
            self.data[(row, col)] = value;
            self.valid[(row, col)] = true;
        } else {
            self.data[(row, col)] = T::zero();
            self.valid[(row, col)] = false;
        }
        Ok(())
    }

    /// Mark (row, col) as no data
    pub fn set_invalid(&mut self, row: usize, col: usize) -> Result<()> {
        self.check_bounds(row, col)?;
        self.data[(row, col)] = T::zero();
        self.valid[(row, col)] = false;
        Ok(())
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(())
    }

    /// Get a view of the underlying data
    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// The validity mask (`true` = valid)
    pub fn validity(&self) -> &Array2<bool> {
        &self.valid
    }

    /// Consume the raster and return values and validity mask
    pub fn into_parts(self) -> (Array2<T>, Array2<bool>) {
        (self.data, self.valid)
    }

    /// Number of valid cells
    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&ok| ok).count()
    }

    // Metadata

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    /// Ground width of one cell
    pub fn cell_width(&self) -> f64 {
        self.transform.cell_width()
    }

    /// Ground height of one cell
    pub fn cell_height(&self) -> f64 {
        self.transform.cell_height()
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Convert pixel coordinates to geographic coordinates (cell centre)
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Convert geographic coordinates to fractional pixel coordinates
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        self.transform.geo_to_pixel(x, y)
    }

    // Grid agreement

    /// Ensure `other` lies on exactly the same grid: shape, transform and CRS.
    pub fn ensure_same_grid<U: RasterElement>(&self, other: &Raster<U>) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::size_mismatch(self.shape(), other.shape()));
        }
        if !self.transform.aligns_with(other.transform()) {
            return Err(Error::ShapeMismatch(format!(
                "transform {:?} does not align with {:?}",
                other.transform(),
                self.transform
            )));
        }
        if !crs_matches(self.crs(), other.crs()) {
            return Err(Error::ShapeMismatch(format!(
                "CRS {} vs {}",
                describe_crs(self.crs()),
                describe_crs(other.crs())
            )));
        }
        Ok(())
    }

    // Derivation

    /// Apply `f` to every valid cell; invalid cells stay invalid
    pub fn map_valid<U, F>(&self, f: F) -> Raster<U>
    where
        U: RasterElement,
        F: Fn(T) -> U,
    {
        let data = Zip::from(&self.data)
            .and(&self.valid)
            .map_collect(|&v, &ok| if ok { f(v) } else { U::zero() });
        Raster::normalized(data, self.valid.clone(), self.transform, self.crs.clone())
    }

    /// Copy out a window of `rows` x `cols` cells starting at (row, col).
    ///
    /// The transform is shifted so the window keeps its ground position.
    pub fn crop(&self, row: usize, col: usize, rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 || row + rows > self.rows() || col + cols > self.cols() {
            return Err(Error::IndexOutOfBounds {
                row: row + rows,
                col: col + cols,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        let window = s![row..row + rows, col..col + cols];
        Ok(Self {
            data: self.data.slice(window).to_owned(),
            valid: self.valid.slice(window).to_owned(),
            transform: self.transform.window(col, row),
            crs: self.crs.clone(),
        })
    }

    // Statistics

    /// Basic statistics over valid cells
    pub fn statistics(&self) -> RasterStatistics<T> {
        let mut min: Option<T> = None;
        let mut max: Option<T> = None;
        let mut sum: f64 = 0.0;
        let mut count: usize = 0;

        for (&value, _) in self.data.iter().zip(self.valid.iter()).filter(|(_, ok)| **ok) {
            if min.map_or(true, |m| value < m) {
                min = Some(value);
            }
            if max.map_or(true, |m| value > m) {
                max = Some(value);
            }
            if let Some(v) = value.to_f64() {
                sum += v;
            }
            count += 1;
        }

        RasterStatistics {
            min,
            max,
            mean: (count > 0).then(|| sum / count as f64),
            valid_count: count,
            invalid_count: self.len() - count,
        }
    }
}

fn describe_crs(crs: Option<&CRS>) -> String {
    crs.map(CRS::identifier).unwrap_or_else(|| "undefined".to_string())
}

/// Basic statistics for a raster
#[derive(Debug, Clone)]
pub struct RasterStatistics<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub mean: Option<f64>,
    pub valid_count: usize,
    pub invalid_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_creation() {
        let raster: Raster<f32> = Raster::new(100, 200);
        assert_eq!(raster.rows(), 100);
        assert_eq!(raster.cols(), 200);
        assert_eq!(raster.shape(), (100, 200));
        assert_eq!(raster.valid_count(), 100 * 200);
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<f32> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.value(5, 5), Some(42.0));
        assert!(raster.set(10, 0, 1.0).is_err());
        assert_eq!(raster.value(10, 0), None);
    }

    #[test]
    fn test_non_finite_values_become_invalid() {
        let raster = Raster::from_vec(vec![1.0, f64::NAN, f64::INFINITY, 4.0], 2, 2).unwrap();
        assert!(raster.is_valid(0, 0));
        assert!(!raster.is_valid(0, 1));
        assert!(!raster.is_valid(1, 0));
        assert_eq!(raster.get(0, 1).unwrap(), 0.0);
        assert_eq!(raster.valid_count(), 2);
    }

    #[test]
    fn test_mask_value() {
        let raster = Raster::from_vec(vec![-9999.0, 3.0, 2.0, -9999.0], 2, 2)
            .unwrap()
            .mask_value(-9999.0);
        assert_eq!(raster.valid_count(), 2);
        assert_eq!(raster.value(0, 0), None);
        assert_eq!(raster.value(0, 1), Some(3.0));
    }

    #[test]
    fn test_from_parts_rejects_shape_mismatch() {
        let data = Array2::<f64>::zeros((2, 3));
        let valid = Array2::from_elem((3, 2), true);
        assert!(matches!(
            Raster::from_parts(data, valid),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_map_valid_keeps_mask() {
        let mut raster: Raster<f64> = Raster::filled(2, 2, 2.0);
        raster.set_invalid(1, 1).unwrap();
        let doubled: Raster<f64> = raster.map_valid(|v| v * 2.0);
        assert_eq!(doubled.value(0, 0), Some(4.0));
        assert_eq!(doubled.value(1, 1), None);
    }

    #[test]
    fn test_crop_shifts_transform() {
        let raster: Raster<f64> = Raster::new(10, 10)
            .with_transform(GeoTransform::new(0.0, 100.0, 10.0, -10.0));
        let window = raster.crop(2, 3, 4, 5).unwrap();
        assert_eq!(window.shape(), (4, 5));
        assert_eq!(window.transform().origin_x, 30.0);
        assert_eq!(window.transform().origin_y, 80.0);
        assert!(raster.crop(8, 8, 4, 4).is_err());
    }

    #[test]
    fn test_ensure_same_grid() {
        let a: Raster<f64> = Raster::new(3, 3).with_crs(Some(CRS::web_mercator()));
        let b: Raster<u8> = a.with_same_meta();
        assert!(a.ensure_same_grid(&b).is_ok());

        let moved = b.clone().with_transform(GeoTransform::new(5.0, 0.0, 1.0, -1.0));
        assert!(matches!(a.ensure_same_grid(&moved), Err(Error::ShapeMismatch(_))));

        let other_crs = b.with_crs(Some(CRS::wgs84()));
        assert!(matches!(a.ensure_same_grid(&other_crs), Err(Error::ShapeMismatch(_))));

        let small: Raster<f64> = Raster::new(2, 3);
        assert!(matches!(a.ensure_same_grid(&small), Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn test_raster_statistics() {
        let mut raster: Raster<f32> = Raster::new(10, 10);
        for i in 0..10 {
            for j in 0..10 {
                raster.set(i, j, (i * 10 + j) as f32).unwrap();
            }
        }
        raster.set_invalid(9, 9).unwrap();

        let stats = raster.statistics();
        assert_eq!(stats.min, Some(0.0));
        assert_eq!(stats.max, Some(98.0));
        assert_eq!(stats.valid_count, 99);
        assert_eq!(stats.invalid_count, 1);
    }
}
