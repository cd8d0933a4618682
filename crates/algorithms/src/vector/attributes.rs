//! Attribute-driven cleanup of vector layers

use super::connectivity::filter_connected;
use geo::{Geometry, GeometryCollection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use wildhab_core::vector::{Feature, FeatureCollection, LineNetwork};
use wildhab_core::Result;

/// Attribute holding a line feature's name
pub const NAME_ATTRIBUTE: &str = "Name";

/// Attribute holding a parcel's owner
pub const OWNER_ATTRIBUTE: &str = "Owner";

/// Kind of line network, selecting its cleanup steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    /// Streams and rivers: connected and named
    Flowline,
    Trail,
    Road,
}

/// Drop features whose `key` attribute is missing or null.
///
/// A collection where no feature carries `key` at all is returned unchanged.
pub fn drop_missing_attribute(collection: FeatureCollection, key: &str) -> FeatureCollection {
    if !collection.has_attribute(key) {
        return collection;
    }

    let crs = collection.crs().cloned();
    let before = collection.len();
    let features: Vec<Feature> = collection
        .into_iter()
        .filter(|f| f.get_property(key).is_some_and(|v| !v.is_null()))
        .collect();
    debug!("Dropped {} features without '{}'", before - features.len(), key);

    FeatureCollection::from_features(features, crs)
}

/// Merge features sharing a value of `key` into one feature per value.
///
/// The merged geometry is a `GeometryCollection` of the members' geometries;
/// attributes are taken from the first member. Features with a missing or
/// null `key` are dropped. Output is ordered by the value's text. A
/// collection where no feature carries `key` is returned unchanged.
pub fn group_by_attribute(collection: FeatureCollection, key: &str) -> FeatureCollection {
    if !collection.has_attribute(key) {
        return collection;
    }

    let crs = collection.crs().cloned();
    let mut groups: BTreeMap<String, (Feature, Vec<Geometry<f64>>)> = BTreeMap::new();

    for mut feature in collection {
        let Some(group) = feature.get_property(key).and_then(|v| v.group_key()) else {
            continue;
        };
        let geometry = feature.geometry.take();
        let entry = groups
            .entry(group)
            .or_insert_with(|| (feature, Vec::new()));
        entry.1.extend(geometry);
    }

    let features = groups
        .into_iter()
        .map(|(group, (mut first, geometries))| {
            first.geometry = Some(Geometry::GeometryCollection(GeometryCollection(geometries)));
            first.id = Some(group);
            first
        })
        .collect();

    FeatureCollection::from_features(features, crs)
}

/// Per-layer cleanup of a line network.
///
/// Every kind goes through [`filter_connected`] with `tolerance`; flowlines
/// additionally lose features without a [`NAME_ATTRIBUTE`].
pub fn clean_network(network: LineNetwork, kind: NetworkKind, tolerance: f64) -> Result<LineNetwork> {
    let connected = filter_connected(&network, tolerance)?;
    debug!(
        "{:?} network: {} of {} features connected",
        kind,
        connected.len(),
        network.len()
    );
    match kind {
        NetworkKind::Flowline => LineNetwork::new(drop_missing_attribute(
            connected.into_collection(),
            NAME_ATTRIBUTE,
        )),
        NetworkKind::Trail | NetworkKind::Road => Ok(connected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{line_string, polygon};
    use wildhab_core::vector::AttributeValue;
    use wildhab_core::CRS;

    fn square(x: f64) -> Geometry<f64> {
        polygon![
            (x: x, y: 0.0),
            (x: x + 1.0, y: 0.0),
            (x: x + 1.0, y: 1.0),
            (x: x, y: 1.0),
            (x: x, y: 0.0),
        ]
        .into()
    }

    #[test]
    fn test_drop_missing_attribute() {
        let fc = FeatureCollection::from_features(
            vec![
                Feature::new(square(0.0)).with_property("Name", "Elk Creek"),
                Feature::new(square(1.0)),
                Feature::new(square(2.0)).with_property("Name", AttributeValue::Null),
            ],
            None,
        );
        let kept = drop_missing_attribute(fc, "Name");
        assert_eq!(kept.len(), 1);
        assert_eq!(
            kept.features[0].get_property("Name").and_then(|v| v.as_str()),
            Some("Elk Creek")
        );
    }

    #[test]
    fn test_drop_missing_attribute_without_column_is_noop() {
        let fc = FeatureCollection::from_features(
            vec![Feature::new(square(0.0)), Feature::new(square(1.0))],
            None,
        );
        assert_eq!(drop_missing_attribute(fc, "Name").len(), 2);
    }

    #[test]
    fn test_group_by_owner() {
        let fc = FeatureCollection::from_features(
            vec![
                Feature::new(square(0.0)).with_property("Owner", "US Forest Service"),
                Feature::new(square(1.0)).with_property("Owner", "Private"),
                Feature::new(square(2.0)).with_property("Owner", "US Forest Service"),
                Feature::new(square(3.0)),
            ],
            Some(CRS::web_mercator()),
        );
        let grouped = group_by_attribute(fc, OWNER_ATTRIBUTE);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped.crs(), Some(&CRS::web_mercator()));

        let forest = &grouped.features[1];
        assert_eq!(forest.id.as_deref(), Some("US Forest Service"));
        match forest.geometry.as_ref() {
            Some(Geometry::GeometryCollection(gc)) => assert_eq!(gc.len(), 2),
            other => panic!("expected collection, got {:?}", other),
        }
    }

    #[test]
    fn test_clean_flowlines_requires_names() {
        let fc = FeatureCollection::from_features(
            vec![
                Feature::new(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)])
                    .with_property("Name", "Elk Creek"),
                Feature::new(line_string![(x: 1.0, y: 0.0), (x: 2.0, y: 0.0)]),
                Feature::new(line_string![(x: 9.0, y: 9.0), (x: 9.0, y: 10.0)])
                    .with_property("Name", "Isolated Draw"),
            ],
            Some(CRS::web_mercator()),
        );
        let network = LineNetwork::new(fc).unwrap();

        let flow = clean_network(network.clone(), NetworkKind::Flowline, 0.0).unwrap();
        assert_eq!(flow.len(), 1);

        let roads = clean_network(network, NetworkKind::Road, 0.0).unwrap();
        assert_eq!(roads.len(), 2);
    }

    #[test]
    fn test_network_kind_serde() {
        let kind: NetworkKind = serde_json::from_str("\"flowline\"").unwrap();
        assert_eq!(kind, NetworkKind::Flowline);
    }
}
