//! Feature model as seen by the spatial engine.
//!
//! Re-exports the canonical types from `curbside-core` and adds the point
//! helpers the query side needs.

use geo::Point;

pub use curbside_core::models::{
    AttributeValue, Attributes, Crs, Feature, FeatureCollection, Geometry, GeometryType,
};

/// Geographic query point; `geo` stores longitude first
pub fn lat_lon_point(lat: f64, lon: f64) -> Point<f64> {
    Point::new(lon, lat)
}
