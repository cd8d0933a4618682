//! Remove line features that touch nothing else
//!
//! Clipping a stream or road network to a unit boundary leaves short
//! fragments floating free of the rest of the network. A feature is kept
//! when one of its terminal endpoints (first or last vertex of any part)
//! touches some other feature, either exactly or within a tolerance.

use crate::maybe_rayon::*;
use geo::{BoundingRect, Coord, Intersects, LineString, Point};
use rstar::{RTree, RTreeObject, AABB};
use tracing::debug;
use wildhab_core::vector::{line_parts, LineNetwork};
use wildhab_core::{Algorithm, Error, Result};

/// One line part in the R-tree, tagged with its owning feature
struct IndexedPart<'a> {
    feature: usize,
    line: &'a LineString<f64>,
    envelope: AABB<[f64; 2]>,
}

impl<'a> IndexedPart<'a> {
    fn new(feature: usize, line: &'a LineString<f64>) -> Option<Self> {
        let rect = line.bounding_rect()?;
        Some(Self {
            feature,
            line,
            envelope: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
        })
    }

    /// Whether `point` lies on the line, or within `tolerance` of it
    fn touches(&self, point: Coord<f64>, tolerance: f64) -> bool {
        if tolerance == 0.0 {
            return self.line.intersects(&Point::from(point));
        }
        let tol_sq = tolerance * tolerance;
        match self.line.0.as_slice() {
            [only] => squared_distance(point, *only) <= tol_sq,
            coords => coords
                .windows(2)
                .any(|w| segment_squared_distance(point, w[0], w[1]) <= tol_sq),
        }
    }
}

impl RTreeObject for IndexedPart<'_> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Parameters for the connectivity filter
#[derive(Debug, Clone, Default)]
pub struct ConnectivityParams {
    /// Endpoint search radius in CRS units; 0 means exact contact
    pub tolerance: f64,
}

/// Connectivity filter algorithm
#[derive(Debug, Clone, Default)]
pub struct ConnectivityFilter;

impl Algorithm for ConnectivityFilter {
    type Input = LineNetwork;
    type Output = LineNetwork;
    type Params = ConnectivityParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "ConnectivityFilter"
    }

    fn description(&self) -> &'static str {
        "Keep line features whose endpoints touch another feature"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        filter_connected(&input, params.tolerance)
    }
}

/// Keep the features of `network` with at least one terminal endpoint
/// touching another feature.
///
/// Parts with fewer than two vertices have no endpoints. A feature never
/// counts as touching itself. An empty network comes back empty.
///
/// # Errors
/// [`Error::InvalidConfiguration`] when `tolerance` is negative or not
/// finite, or when it is positive and the network has no projected CRS.
pub fn filter_connected(network: &LineNetwork, tolerance: f64) -> Result<LineNetwork> {
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(Error::invalid_config(
            "tolerance",
            tolerance,
            "must be a finite, non-negative distance",
        ));
    }
    if tolerance > 0.0 && !network.crs().is_some_and(|crs| crs.is_projected()) {
        return Err(Error::invalid_config(
            "tolerance",
            tolerance,
            "a positive tolerance needs a projected CRS",
        ));
    }
    if network.is_empty() {
        return Ok(network.clone());
    }

    let features = network.features();
    let parts: Vec<IndexedPart<'_>> = features
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.geometry.as_ref().map(|g| (i, g)))
        .flat_map(|(i, g)| line_parts(g).into_iter().map(move |ls| (i, ls)))
        .filter_map(|(i, ls)| IndexedPart::new(i, ls))
        .collect();
    let tree = RTree::bulk_load(parts);

    let keep: Vec<bool> = (0..features.len())
        .into_par_iter()
        .map(|i| {
            let Some(geometry) = features[i].geometry.as_ref() else {
                return false;
            };
            endpoints(line_parts(geometry)).any(|end| {
                let query = AABB::from_corners(
                    [end.x - tolerance, end.y - tolerance],
                    [end.x + tolerance, end.y + tolerance],
                );
                tree.locate_in_envelope_intersecting(&query)
                    .any(|part| part.feature != i && part.touches(end, tolerance))
            })
        })
        .collect();

    let kept = keep.iter().filter(|&&k| k).count();
    debug!(
        "Connectivity filter kept {} of {} features (tolerance {})",
        kept,
        keep.len(),
        tolerance
    );

    Ok(network.clone().retain_indices(&keep))
}

/// First and last vertex of every part with at least two vertices
fn endpoints<'a>(parts: Vec<&'a LineString<f64>>) -> impl Iterator<Item = Coord<f64>> + 'a {
    parts
        .into_iter()
        .filter(|ls| ls.0.len() >= 2)
        .flat_map(|ls| [ls.0[0], ls.0[ls.0.len() - 1]])
}

fn squared_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let (dx, dy) = (a.x - b.x, a.y - b.y);
    dx * dx + dy * dy
}

/// Squared distance from `p` to the segment `a`-`b`
fn segment_squared_distance(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return squared_distance(p, a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    squared_distance(p, Coord { x: a.x + t * dx, y: a.y + t * dy })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, Geometry, MultiLineString};
    use wildhab_core::vector::{Feature, FeatureCollection};
    use wildhab_core::CRS;

    fn network(lines: Vec<Geometry<f64>>, crs: Option<CRS>) -> LineNetwork {
        let features = lines
            .into_iter()
            .enumerate()
            .map(|(i, g)| Feature::new(g).with_property("idx", i as i64))
            .collect();
        LineNetwork::new(FeatureCollection::from_features(features, crs)).unwrap()
    }

    fn kept_ids(net: &LineNetwork) -> Vec<i64> {
        net.features()
            .iter()
            .filter_map(|f| f.get_property("idx").and_then(|v| v.as_i64()))
            .collect()
    }

    #[test]
    fn test_touching_kept_isolated_dropped() {
        let net = network(
            vec![
                line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)].into(),
                line_string![(x: 10.0, y: 0.0), (x: 10.0, y: 10.0)].into(),
                line_string![(x: 50.0, y: 50.0), (x: 60.0, y: 50.0)].into(),
            ],
            Some(CRS::web_mercator()),
        );
        let filtered = filter_connected(&net, 0.0).unwrap();
        assert_eq!(kept_ids(&filtered), vec![0, 1]);
        assert_eq!(filtered.crs(), Some(&CRS::web_mercator()));
    }

    #[test]
    fn test_endpoint_on_interior_of_other_line() {
        // T-junction: the stem's end lies mid-way along the bar. Only the
        // stem's endpoint touches; the bar's own ends touch nothing.
        let net = network(
            vec![
                line_string![(x: 0.0, y: 0.0), (x: 20.0, y: 0.0)].into(),
                line_string![(x: 10.0, y: 0.0), (x: 10.0, y: 15.0)].into(),
            ],
            None,
        );
        assert_eq!(kept_ids(&filter_connected(&net, 0.0).unwrap()), vec![1]);
    }

    #[test]
    fn test_crossing_without_endpoint_contact_is_dropped() {
        let net = network(
            vec![
                line_string![(x: 0.0, y: 5.0), (x: 10.0, y: 5.0)].into(),
                line_string![(x: 5.0, y: 0.0), (x: 5.0, y: 10.0)].into(),
            ],
            None,
        );
        assert!(filter_connected(&net, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_self_touching_feature_is_not_connected() {
        let multi = MultiLineString::new(vec![
            line_string![(x: 0.0, y: 0.0), (x: 5.0, y: 0.0)],
            line_string![(x: 5.0, y: 0.0), (x: 5.0, y: 5.0)],
        ]);
        let net = network(vec![multi.into()], None);
        assert!(filter_connected(&net, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_tolerance_bridges_small_gaps() {
        let lines = || {
            vec![
                line_string![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0)].into(),
                line_string![(x: 10.5, y: 0.0), (x: 20.0, y: 0.0)].into(),
            ]
        };
        let net = network(lines(), Some(CRS::web_mercator()));
        assert!(filter_connected(&net, 0.0).unwrap().is_empty());
        assert_eq!(kept_ids(&filter_connected(&net, 1.0).unwrap()), vec![0, 1]);
    }

    #[test]
    fn test_empty_network() {
        let net = LineNetwork::empty(Some(CRS::wgs84()));
        let filtered = filter_connected(&net, 0.0).unwrap();
        assert!(filtered.is_empty());
        assert_eq!(filtered.crs(), Some(&CRS::wgs84()));
    }

    #[test]
    fn test_tolerance_validation() {
        let geographic = network(
            vec![line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)].into()],
            Some(CRS::wgs84()),
        );
        assert!(matches!(
            filter_connected(&geographic, 5.0),
            Err(Error::InvalidConfiguration { name: "tolerance", .. })
        ));
        let no_crs = network(vec![], None);
        assert!(filter_connected(&no_crs, 5.0).is_err());
        assert!(filter_connected(&no_crs, -1.0).is_err());
        assert!(filter_connected(&no_crs, f64::NAN).is_err());
    }

    #[test]
    fn test_algorithm_trait() {
        let net = network(
            vec![
                line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)].into(),
                line_string![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0)].into(),
            ],
            None,
        );
        let filtered = ConnectivityFilter.execute_default(net).unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_segment_distance() {
        let a = Coord { x: 0.0, y: 0.0 };
        let b = Coord { x: 10.0, y: 0.0 };
        assert_eq!(segment_squared_distance(Coord { x: 5.0, y: 3.0 }, a, b), 9.0);
        assert_eq!(segment_squared_distance(Coord { x: -3.0, y: 4.0 }, a, b), 25.0);
    }
}
