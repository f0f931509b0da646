use geo::Rect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::crs::Crs;
use super::geometry::Geometry;

/// Scalar attribute value carried by a feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl AttributeValue {
    /// Convert a JSON property value.
    ///
    /// `null` has no scalar form and yields `None`. Arrays and objects are kept
    /// as their compact JSON text.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(AttributeValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(AttributeValue::Number),
            serde_json::Value::String(s) => Some(AttributeValue::String(s.clone())),
            nested => Some(AttributeValue::String(nested.to_string())),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            AttributeValue::Bool(b) => serde_json::Value::Bool(*b),
            AttributeValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            AttributeValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Attribute mapping of a feature, ordered by key
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A single geometry plus its descriptive attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// GeoJSON `id` when present, otherwise the position in the source file
    pub id: String,

    pub geometry: Geometry,

    pub attributes: Attributes,
}

impl Feature {
    pub fn new(id: impl Into<String>, geometry: Geometry, attributes: Attributes) -> Self {
        Self { id: id.into(), geometry, attributes }
    }

    /// Look up an attribute by key
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Same attributes and id, different geometry
    pub fn with_geometry(&self, geometry: Geometry) -> Self {
        Self { id: self.id.clone(), geometry, attributes: self.attributes.clone() }
    }

    /// Convert to a GeoJSON feature
    pub fn to_geojson(&self) -> geojson::Feature {
        let properties: serde_json::Map<String, serde_json::Value> =
            self.attributes.iter().map(|(k, v)| (k.clone(), v.to_json())).collect();

        geojson::Feature {
            bbox: None,
            geometry: Some(self.geometry.to_geojson()),
            id: Some(geojson::feature::Id::String(self.id.clone())),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Immutable, named set of features sharing one CRS
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    name: String,
    crs: Crs,
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(name: impl Into<String>, crs: Crs, features: Vec<Feature>) -> Self {
        Self { name: name.into(), crs, features }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Feature at a position in the collection
    pub fn get(&self, idx: usize) -> Option<&Feature> {
        self.features.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Combined bounding box of every feature, `None` when nothing has extent
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.bounding_rect())
            .reduce(|acc, r| {
                Rect::new(
                    geo::coord! { x: acc.min().x.min(r.min().x), y: acc.min().y.min(r.min().y) },
                    geo::coord! { x: acc.max().x.max(r.max().x), y: acc.max().y.max(r.max().y) },
                )
            })
    }

    /// Build a sibling collection with the same name from new features and CRS
    pub fn derive(&self, crs: Crs, features: Vec<Feature>) -> Self {
        Self { name: self.name.clone(), crs, features }
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attribute_from_json() {
        assert_eq!(
            AttributeValue::from_json(&json!("RPZ-12")),
            Some(AttributeValue::String("RPZ-12".into()))
        );
        assert_eq!(AttributeValue::from_json(&json!(3)), Some(AttributeValue::Number(3.0)));
        assert_eq!(AttributeValue::from_json(&json!(true)), Some(AttributeValue::Bool(true)));
        assert_eq!(AttributeValue::from_json(&json!(null)), None);
        assert_eq!(
            AttributeValue::from_json(&json!(["mon", "tue"])),
            Some(AttributeValue::String("[\"mon\",\"tue\"]".into()))
        );
    }

    #[test]
    fn test_attribute_serializes_untagged() {
        let mut attributes = Attributes::new();
        attributes.insert("zone".into(), AttributeValue::String("A".into()));
        attributes.insert("limit".into(), AttributeValue::Number(120.0));
        let json = serde_json::to_value(&attributes).unwrap();
        assert_eq!(json, json!({ "limit": 120.0, "zone": "A" }));
    }

    #[test]
    fn test_feature_to_geojson() {
        let mut attributes = Attributes::new();
        attributes.insert("zone".into(), AttributeValue::String("A".into()));
        let feature = Feature::new("7", Geometry::point(1.0, 2.0), attributes);

        let json = serde_json::to_value(feature.to_geojson()).unwrap();
        assert_eq!(json["id"], "7");
        assert_eq!(json["properties"]["zone"], "A");
        assert_eq!(json["geometry"]["type"], "Point");
    }

    #[test]
    fn test_collection_bounds() {
        let collection = FeatureCollection::new(
            "signs",
            Crs::wgs84(),
            vec![
                Feature::new("0", Geometry::point(1.0, 5.0), Attributes::new()),
                Feature::new("1", Geometry::point(-2.0, 3.0), Attributes::new()),
            ],
        );

        let bounds = collection.bounds().unwrap();
        assert_eq!(bounds.min(), geo::coord! { x: -2.0, y: 3.0 });
        assert_eq!(bounds.max(), geo::coord! { x: 1.0, y: 5.0 });
        assert!(FeatureCollection::new("empty", Crs::wgs84(), vec![]).bounds().is_none());
    }
}
