//! Vector data structures
//!
//! - [`Feature`]: geometry plus attribute table
//! - [`FeatureCollection`]: ordered features sharing one CRS
//! - [`LineNetwork`]: a collection restricted to line geometries

use crate::crs::CRS;
use crate::error::{Error, Result};
use geo_types::{Geometry, LineString};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(v) => Some(*v as f64),
            AttributeValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Textual form used when grouping features; `None` for null
    pub fn group_key(&self) -> Option<String> {
        match self {
            AttributeValue::Null => None,
            AttributeValue::Bool(b) => Some(b.to_string()),
            AttributeValue::Int(v) => Some(v.to_string()),
            AttributeValue::Float(v) => Some(v.to_string()),
            AttributeValue::String(s) => Some(s.clone()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone)]
pub struct Feature {
    pub geometry: Option<Geometry<f64>>,
    pub properties: HashMap<String, AttributeValue>,
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: Some(geometry.into()),
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self {
            geometry: None,
            properties: HashMap::new(),
            id: None,
        }
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set an attribute, replacing any previous value under the same key
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

/// Ordered collection of features in one coordinate reference system
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    crs: Option<CRS>,
}

impl FeatureCollection {
    pub fn new(crs: Option<CRS>) -> Self {
        Self {
            features: Vec::new(),
            crs,
        }
    }

    pub fn from_features(features: Vec<Feature>, crs: Option<CRS>) -> Self {
        Self { features, crs }
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Geometries of all features that have one
    pub fn geometries(&self) -> impl Iterator<Item = &Geometry<f64>> {
        self.features.iter().filter_map(|f| f.geometry.as_ref())
    }

    /// Whether any feature carries the attribute `key`
    pub fn has_attribute(&self, key: &str) -> bool {
        self.features.iter().any(|f| f.properties.contains_key(key))
    }

    /// Append the features of `other`; both collections must share a CRS
    pub fn concat(mut self, other: FeatureCollection) -> Result<Self> {
        if !crate::crs::crs_matches(self.crs(), other.crs()) {
            return Err(Error::ShapeMismatch(format!(
                "cannot merge feature sets in {} and {}",
                describe(self.crs()),
                describe(other.crs())
            )));
        }
        self.features.extend(other.features);
        Ok(self)
    }
}

fn describe(crs: Option<&CRS>) -> String {
    crs.map(CRS::identifier).unwrap_or_else(|| "undefined CRS".to_string())
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

/// A feature collection holding only single- or multi-part lines.
///
/// Features without geometry are dropped on construction; `Line` geometries
/// are widened to two-vertex `LineString`s.
#[derive(Debug, Clone, Default)]
pub struct LineNetwork {
    collection: FeatureCollection,
}

impl LineNetwork {
    /// Validate and wrap a collection.
    ///
    /// Fails with [`Error::UpstreamFailure`] if any geometry is not linear.
    pub fn new(collection: FeatureCollection) -> Result<Self> {
        let crs = collection.crs.clone();
        let mut features = Vec::with_capacity(collection.len());

        for (index, mut feature) in collection.features.into_iter().enumerate() {
            let geometry = match feature.geometry.take() {
                None => continue,
                Some(Geometry::Line(line)) => Geometry::LineString(LineString::from(line)),
                Some(g @ Geometry::LineString(_)) | Some(g @ Geometry::MultiLineString(_)) => g,
                Some(other) => {
                    return Err(Error::UpstreamFailure(format!(
                        "feature {} of a line network has a {} geometry",
                        index,
                        geometry_kind(&other)
                    )));
                }
            };
            feature.geometry = Some(geometry);
            features.push(feature);
        }

        Ok(Self {
            collection: FeatureCollection::from_features(features, crs),
        })
    }

    /// An empty network in `crs`
    pub fn empty(crs: Option<CRS>) -> Self {
        Self {
            collection: FeatureCollection::new(crs),
        }
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.collection.crs()
    }

    pub fn features(&self) -> &[Feature] {
        &self.collection.features
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    /// Keep only the features whose position satisfies `keep`
    pub fn retain_indices(self, keep: &[bool]) -> Self {
        let crs = self.collection.crs.clone();
        let features = self
            .collection
            .features
            .into_iter()
            .zip(keep.iter().copied().chain(std::iter::repeat(false)))
            .filter_map(|(f, k)| k.then_some(f))
            .collect();
        Self {
            collection: FeatureCollection::from_features(features, crs),
        }
    }

    pub fn as_collection(&self) -> &FeatureCollection {
        &self.collection
    }

    pub fn into_collection(self) -> FeatureCollection {
        self.collection
    }
}

/// The line parts of a linear geometry (empty for anything else)
pub fn line_parts(geometry: &Geometry<f64>) -> Vec<&LineString<f64>> {
    match geometry {
        Geometry::LineString(ls) => vec![ls],
        Geometry::MultiLineString(mls) => mls.0.iter().collect(),
        _ => Vec::new(),
    }
}

/// Short name of a geometry variant, for messages
pub fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
