//! GeoJSON format reader implementation

use std::fs;
use std::path::Path;

use ::geojson::GeoJson;

use crate::error::{CurbsideError, Result};
use crate::formats::{FormatDataset, FormatReader};
use crate::models::{AttributeValue, Attributes, Crs, Feature, Geometry};

/// GeoJSON format reader
pub struct GeoJsonReader;

impl FormatReader for GeoJsonReader {
    fn read(&self, path: &Path) -> Result<FormatDataset> {
        let content = fs::read_to_string(path)
            .map_err(|e| CurbsideError::load(path, format!("Cannot read file: {}", e)))?;

        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string();

        self.parse(&name, &content).map_err(|e| match e {
            CurbsideError::Serialization(reason) => CurbsideError::load(path, reason),
            other => other,
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json", "geojson"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }
}

impl GeoJsonReader {
    /// Parse GeoJSON text into a dataset named `name`
    pub fn parse(&self, name: &str, content: &str) -> Result<FormatDataset> {
        let geojson: GeoJson = content
            .parse()
            .map_err(|e| CurbsideError::Serialization(format!("Failed to parse GeoJSON: {}", e)))?;

        let mut features = Vec::new();
        let mut skipped = 0;

        let crs = match geojson {
            GeoJson::FeatureCollection(fc) => {
                let crs = match fc.foreign_members.as_ref().and_then(|fm| fm.get("crs")) {
                    Some(member) => extract_crs(member)?,
                    None => None,
                };

                for (idx, feature) in fc.features.into_iter().enumerate() {
                    match convert_feature(feature, idx)? {
                        Some(f) => features.push(f),
                        None => skipped += 1,
                    }
                }
                crs
            }
            GeoJson::Feature(feature) => {
                match convert_feature(feature, 0)? {
                    Some(f) => features.push(f),
                    None => skipped += 1,
                }
                None
            }
            GeoJson::Geometry(geometry) => {
                let geometry = convert_geometry(geometry, "0")?;
                features.push(Feature::new("0", geometry, Attributes::new()));
                None
            }
        };

        if skipped > 0 {
            tracing::warn!(dataset = name, skipped, "Skipped features without geometry");
        }

        Ok(FormatDataset { name: name.to_string(), crs, features, skipped })
    }
}

/// Convert a GeoJSON feature; `None` when it carries no geometry
fn convert_feature(feature: ::geojson::Feature, idx: usize) -> Result<Option<Feature>> {
    let id = feature
        .id
        .as_ref()
        .map(|id| match id {
            ::geojson::feature::Id::String(s) => s.clone(),
            ::geojson::feature::Id::Number(n) => n.to_string(),
        })
        .unwrap_or_else(|| idx.to_string());

    let Some(geometry) = feature.geometry else {
        return Ok(None);
    };
    let geometry = convert_geometry(geometry, &id)?;

    let attributes: Attributes = feature
        .properties
        .iter()
        .flatten()
        .filter_map(|(k, v)| AttributeValue::from_json(v).map(|v| (k.clone(), v)))
        .collect();

    Ok(Some(Feature::new(id, geometry, attributes)))
}

fn convert_geometry(geometry: ::geojson::Geometry, feature: &str) -> Result<Geometry> {
    let geo_geometry = geo::Geometry::<f64>::try_from(geometry).map_err(|e| {
        CurbsideError::Serialization(format!("Invalid geometry at feature {}: {}", feature, e))
    })?;
    Geometry::from_geo(geo_geometry, feature)
}

/// Extract the CRS from a legacy GeoJSON `crs` member.
///
/// A `null` member declares nothing. Any other member must name a CRS we can
/// parse, otherwise the file would be read in the wrong coordinates.
fn extract_crs(crs: &serde_json::Value) -> Result<Option<Crs>> {
    if crs.is_null() {
        return Ok(None);
    }

    // "EPSG:4326", "urn:ogc:def:crs:EPSG::4326" or "urn:ogc:def:crs:OGC:1.3:CRS84"
    let name = crs
        .get("properties")
        .and_then(|props| props.get("name"))
        .and_then(|name| name.as_str())
        .ok_or_else(|| CurbsideError::UnsupportedCrs { crs: crs.to_string() })?;

    name.parse().map(Some)
}
