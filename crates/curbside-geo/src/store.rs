//! Geometry store: reads datasets from disk and moves them between CRS

use std::path::Path;

use crate::models::{Crs, FeatureCollection};
use crate::transform::reproject_collection;
use crate::validation::{normalize_collection, RepairReport};
use curbside_core::error::Result;
use curbside_core::formats::FormatRegistry;
use geo::Rect;

/// Load summary of a prepared collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStats {
    pub name: String,
    pub crs: Crs,
    pub features: usize,
    pub repair: RepairReport,
    pub bounds: Option<Rect<f64>>,
}

impl CollectionStats {
    fn of(collection: &FeatureCollection, repair: RepairReport) -> Self {
        Self {
            name: collection.name().to_string(),
            crs: collection.crs().clone(),
            features: collection.len(),
            repair,
            bounds: collection.bounds(),
        }
    }
}

/// Reads feature collections through the registered format readers
pub struct GeometryStore {
    registry: FormatRegistry,
}

impl GeometryStore {
    pub fn new() -> Self {
        Self { registry: FormatRegistry::with_defaults() }
    }

    /// Load a collection from `path`.
    ///
    /// `crs` overrides whatever the file declares. Without either, coordinates
    /// are taken to be WGS 84.
    pub fn load(&self, path: &Path, crs: Option<&Crs>) -> Result<FeatureCollection> {
        let reader = self.registry.detect_format(path)?;
        let dataset = reader.read(path)?;

        let crs = match (crs, dataset.crs) {
            (Some(configured), Some(embedded)) if configured.epsg != embedded.epsg => {
                tracing::warn!(
                    dataset = %dataset.name,
                    configured = %configured,
                    embedded = %embedded,
                    "Configured CRS overrides the one declared in the file"
                );
                configured.clone()
            }
            (Some(configured), _) => configured.clone(),
            (None, Some(embedded)) => embedded,
            (None, None) => Crs::wgs84(),
        };

        tracing::debug!(
            dataset = %dataset.name,
            format = reader.format_name(),
            features = dataset.features.len(),
            crs = %crs,
            "Loaded dataset"
        );

        Ok(FeatureCollection::new(dataset.name, crs, dataset.features))
    }

    /// New collection with every geometry transformed into `target`.
    ///
    /// The input collection is left untouched.
    pub fn reproject(
        &self,
        collection: &FeatureCollection,
        target: &Crs,
    ) -> Result<FeatureCollection> {
        reproject_collection(collection, target)
    }

    /// Load, move into `canonical`, and repair a dataset.
    ///
    /// This is the startup path for every dataset the engine serves.
    pub fn prepare(
        &self,
        name: &str,
        path: &Path,
        crs: Option<&Crs>,
        canonical: &Crs,
    ) -> Result<(FeatureCollection, CollectionStats)> {
        let loaded = self.load(path, crs)?;
        let loaded = FeatureCollection::new(name, loaded.crs().clone(), loaded.features().to_vec());
        let reprojected = self.reproject(&loaded, canonical)?;
        let (normalized, repair) = normalize_collection(&reprojected);

        let stats = CollectionStats::of(&normalized, repair);
        log_stats(&stats);

        Ok((normalized, stats))
    }
}

impl Default for GeometryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn log_stats(stats: &CollectionStats) {
    let bounds = stats
        .bounds
        .map(|b| format!("[{}, {}, {}, {}]", b.min().x, b.min().y, b.max().x, b.max().y))
        .unwrap_or_else(|| "empty".to_string());

    tracing::info!(
        dataset = %stats.name,
        crs = %stats.crs,
        features = stats.features,
        repaired = stats.repair.repaired,
        emptied = stats.repair.emptied,
        bounds = %bounds,
        "Prepared dataset"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Geometry;
    use curbside_core::error::CurbsideError;
    use geo::{Area, Contains};
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const SIGNS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [1.0, 1.0] },
                "properties": { "text": "P30" }
            }
        ]
    }"#;

    #[test]
    fn test_load_defaults_to_wgs84() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "signs.geojson", SIGNS);

        let collection = GeometryStore::new().load(&path, None).unwrap();
        assert_eq!(collection.name(), "signs");
        assert_eq!(collection.crs(), &Crs::wgs84());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_configured_crs_wins() {
        let dir = tempfile::tempdir().unwrap();
        let content = r#"{
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "EPSG:4326" } },
            "features": []
        }"#;
        let path = write(dir.path(), "zones.geojson", content);

        let collection = GeometryStore::new().load(&path, Some(&Crs::web_mercator())).unwrap();
        assert_eq!(collection.crs(), &Crs::web_mercator());
        assert!(collection.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let missing = Path::new("/nonexistent/zones.geojson");
        let err = GeometryStore::new().load(missing, None).unwrap_err();
        assert!(matches!(err, CurbsideError::Load { .. }));
    }

    #[test]
    fn test_reproject_is_non_destructive() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "signs.geojson", SIGNS);
        let store = GeometryStore::new();

        let original = store.load(&path, None).unwrap();
        let projected = store.reproject(&original, &Crs::web_mercator()).unwrap();

        assert_eq!(projected.crs(), &Crs::web_mercator());
        assert_eq!(original.get(0).unwrap().geometry, Geometry::point(1.0, 1.0));

        let Geometry::Point(p) = projected.get(0).unwrap().geometry else {
            panic!("Expected Point geometry");
        };
        assert!((p.x() - 111_319.49).abs() < 0.01);
        assert_eq!(projected.get(0).unwrap().attributes, original.get(0).unwrap().attributes);
    }

    #[cfg(not(feature = "proj"))]
    #[test]
    fn test_reproject_unknown_crs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "signs.geojson", SIGNS);
        let store = GeometryStore::new();

        let original = store.load(&path, Some(&Crs::from_epsg(999_999))).unwrap();
        let err = store.reproject(&original, &Crs::wgs84()).unwrap_err();
        assert!(matches!(err, CurbsideError::UnsupportedCrs { .. }));
    }

    #[test]
    fn test_prepare_names_and_normalizes() {
        let dir = tempfile::tempdir().unwrap();
        let content = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0,0],[2,2],[2,0],[0,2],[0,0]]]
                    },
                    "properties": {}
                }
            ]
        }"#;
        let path = write(dir.path(), "rpz_areas_4326.geojson", content);

        let (zones, stats) =
            GeometryStore::new().prepare("zones", &path, None, &Crs::wgs84()).unwrap();

        assert_eq!(zones.name(), "zones");
        assert_eq!(stats.features, 1);
        assert_eq!(stats.repair.repaired, 1);
        assert_eq!(crate::validation::count_invalid(&zones), 0);
        assert!(stats.bounds.is_some());

        // Both lobes survive the repair
        let lobes = zones.get(0).unwrap().geometry.to_geo();
        assert!((lobes.unsigned_area() - 2.0).abs() < 1e-9);
        assert!(lobes.contains(&geo::Point::new(0.5, 1.0)));
        assert!(lobes.contains(&geo::Point::new(1.5, 1.0)));
    }
}
