//! Query engine
//!
//! Owns the three prepared collections and answers point queries against
//! them. Everything is built at construction and read-only afterwards, so a
//! single engine can be shared between threads without locking.

use crate::index::SpatialIndex;
use crate::models::{lat_lon_point, Crs, Feature, FeatureCollection};
use crate::store::{CollectionStats, GeometryStore};
use crate::transform::{check_crs_mismatch, project_point, reproject_collection};
use curbside_core::config::LayeredConfig;
use curbside_core::error::{CurbsideError, Result};
use geo::Point;

pub const ZONES: &str = "zones";
pub const SIGNS: &str = "signs";
pub const CATEGORIES: &str = "categories";

/// Collections loaded, reprojected and repaired from a configuration
#[derive(Debug, Clone)]
pub struct PreparedDatasets {
    pub zones: FeatureCollection,
    pub signs: FeatureCollection,
    pub categories: FeatureCollection,
    pub stats: Vec<CollectionStats>,
}

impl PreparedDatasets {
    /// Run the startup sequence for every configured dataset
    pub fn load(config: &LayeredConfig) -> Result<Self> {
        let store = GeometryStore::new();
        let canonical = Crs::from_epsg(config.canonical_crs.value);

        let (zones, zone_stats) =
            store.prepare(ZONES, &config.zones_path.value, None, &canonical)?;
        let (signs, sign_stats) =
            store.prepare(SIGNS, &config.signs_path.value, None, &canonical)?;
        let (categories, category_stats) =
            store.prepare(CATEGORIES, &config.categories_path.value, None, &canonical)?;

        Ok(Self {
            zones,
            signs,
            categories,
            stats: vec![zone_stats, sign_stats, category_stats],
        })
    }
}

/// Everything found at one location
#[derive(Debug, Clone, PartialEq)]
pub struct LocationReport<'a> {
    pub zones: Vec<&'a Feature>,
    pub categories: Vec<&'a Feature>,
    pub signs: Vec<&'a Feature>,
}

impl LocationReport<'_> {
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty() && self.categories.is_empty() && self.signs.is_empty()
    }
}

/// Point lookups over zones, parking categories and signs
pub struct QueryEngine {
    zones: SpatialIndex,
    categories: SpatialIndex,
    signs: SpatialIndex,
    /// Signs in the projected CRS, positions aligned with `signs`
    projected_signs: SpatialIndex,
    canonical: Crs,
    projected: Crs,
    default_radius: f64,
}

impl QueryEngine {
    /// Build an engine from prepared collections.
    ///
    /// All three collections must share one CRS, which becomes the canonical
    /// CRS of the engine. The signs are reprojected into `projected` here,
    /// once.
    pub fn new(
        zones: FeatureCollection,
        categories: FeatureCollection,
        signs: FeatureCollection,
        projected: Crs,
        default_radius: f64,
    ) -> Result<Self> {
        let canonical = zones.crs().clone();
        check_crs_mismatch(&canonical, categories.crs())?;
        check_crs_mismatch(&canonical, signs.crs())?;
        let default_radius = validate_radius(default_radius)?;
        if projected.is_geographic() {
            return Err(CurbsideError::ConfigInvalid {
                key: "projected_crs".to_string(),
                reason: format!("{} measures degrees, not meters", projected),
            });
        }

        let projected_signs = SpatialIndex::build(reproject_collection(&signs, &projected)?);

        tracing::debug!(
            canonical = %canonical,
            projected = %projected,
            zones = zones.len(),
            categories = categories.len(),
            signs = signs.len(),
            "Query engine ready"
        );

        Ok(Self {
            zones: SpatialIndex::build(zones),
            categories: SpatialIndex::build(categories),
            signs: SpatialIndex::build(signs),
            projected_signs,
            canonical,
            projected,
            default_radius,
        })
    }

    /// Build an engine from datasets already prepared for `config`
    pub fn from_prepared(prepared: PreparedDatasets, config: &LayeredConfig) -> Result<Self> {
        Self::new(
            prepared.zones,
            prepared.categories,
            prepared.signs,
            Crs::from_epsg(config.projected_crs.value),
            config.default_radius_meters.value,
        )
    }

    /// Load every configured dataset and build the engine
    pub fn from_config(config: &LayeredConfig) -> Result<Self> {
        let prepared = PreparedDatasets::load(config)?;
        Self::from_prepared(prepared, config)
    }

    /// Zones whose area, boundary included, covers the location
    pub fn zone_containment(&self, lat: f64, lon: f64) -> Result<Vec<&Feature>> {
        let point = self.canonical_point(lat, lon)?;
        let ids = self.zones.containing(point, &self.canonical)?;
        tracing::debug!(lat, lon, hits = ids.len(), "Zone containment");
        Ok(self.zones.features(&ids))
    }

    /// Parking categories whose interior covers the location
    pub fn category_containment(&self, lat: f64, lon: f64) -> Result<Vec<&Feature>> {
        let point = self.canonical_point(lat, lon)?;
        let ids = self.categories.strictly_containing(point, &self.canonical)?;
        tracing::debug!(lat, lon, hits = ids.len(), "Category containment");
        Ok(self.categories.features(&ids))
    }

    /// Signs within `radius_meters` of the location, or the default radius.
    ///
    /// Distance is measured in the projected CRS; the returned features keep
    /// their canonical geometry.
    pub fn proximity_search(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: Option<f64>,
    ) -> Result<Vec<&Feature>> {
        validate_coordinates(lat, lon)?;
        let radius = match radius_meters {
            Some(radius) => validate_radius(radius)?,
            None => self.default_radius,
        };

        let point = project_point(lat_lon_point(lat, lon), &Crs::wgs84(), &self.projected)?;
        let ids = self.projected_signs.within(point, &self.projected, radius)?;
        tracing::debug!(lat, lon, radius, hits = ids.len(), "Sign proximity");
        Ok(self.signs.features(&ids))
    }

    /// Run every query at one location
    pub fn lookup(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: Option<f64>,
    ) -> Result<LocationReport<'_>> {
        Ok(LocationReport {
            zones: self.zone_containment(lat, lon)?,
            categories: self.category_containment(lat, lon)?,
            signs: self.proximity_search(lat, lon, radius_meters)?,
        })
    }

    /// A served collection by name (`zones`, `signs` or `categories`)
    pub fn collection(&self, name: &str) -> Result<&FeatureCollection> {
        match name {
            ZONES => Ok(self.zones.collection()),
            SIGNS => Ok(self.signs.collection()),
            CATEGORIES => Ok(self.categories.collection()),
            _ => Err(CurbsideError::DatasetNotFound { name: name.to_string() }),
        }
    }

    pub fn canonical_crs(&self) -> &Crs {
        &self.canonical
    }

    pub fn projected_crs(&self) -> &Crs {
        &self.projected
    }

    pub fn default_radius(&self) -> f64 {
        self.default_radius
    }

    fn canonical_point(&self, lat: f64, lon: f64) -> Result<Point<f64>> {
        validate_coordinates(lat, lon)?;
        project_point(lat_lon_point(lat, lon), &Crs::wgs84(), &self.canonical)
    }
}

fn validate_coordinates(lat: f64, lon: f64) -> Result<()> {
    if !lat.is_finite() || !lon.is_finite() {
        return Err(CurbsideError::invalid_query(format!(
            "coordinates must be finite, got ({}, {})",
            lat, lon
        )));
    }
    if lat.abs() > 90.0 {
        return Err(CurbsideError::invalid_query(format!(
            "latitude {} is outside [-90, 90]",
            lat
        )));
    }
    if lon.abs() > 180.0 {
        return Err(CurbsideError::invalid_query(format!(
            "longitude {} is outside [-180, 180]",
            lon
        )));
    }
    Ok(())
}

fn validate_radius(radius: f64) -> Result<f64> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(CurbsideError::invalid_query(format!(
            "radius must be a non-negative number of meters, got {}",
            radius
        )));
    }
    Ok(radius)
}
