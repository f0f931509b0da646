use curbside_core::config::ConfigSource;
use curbside_geo::models::Feature;
use curbside_geo::CollectionStats;
use serde::Serialize;

/// Output for `inspect datasets`
#[derive(Debug, Serialize)]
pub struct InspectDatasetsOutput {
    pub datasets: Vec<DatasetInfo>,
}

#[derive(Debug, Serialize)]
pub struct DatasetInfo {
    pub name: String,
    pub crs: String,
    pub features: usize,
    pub repaired: usize,
    pub emptied: usize,
    /// `[min_x, min_y, max_x, max_y]`
    pub bounds: Option<[f64; 4]>,
}

impl From<&CollectionStats> for DatasetInfo {
    fn from(stats: &CollectionStats) -> Self {
        Self {
            name: stats.name.clone(),
            crs: stats.crs.to_string(),
            features: stats.features,
            repaired: stats.repair.repaired,
            emptied: stats.repair.emptied,
            bounds: stats.bounds.map(|b| [b.min().x, b.min().y, b.max().x, b.max().y]),
        }
    }
}

/// Output for `inspect config`
#[derive(Debug, Serialize)]
pub struct InspectConfigOutput {
    pub values: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: ConfigSource,
}

/// Output for `query`
#[derive(Debug, Serialize)]
pub struct QueryOutput {
    pub lat: f64,
    pub lon: f64,
    pub radius_meters: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zones: Option<Vec<geojson::Feature>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<geojson::Feature>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signs: Option<Vec<geojson::Feature>>,
}

/// GeoJSON features for a list of matches
pub fn to_geojson(features: &[&Feature]) -> Vec<geojson::Feature> {
    features.iter().map(|f| f.to_geojson()).collect()
}
