//! Canonical geometry type used across all curbside crates.
//!
//! Features carry one of three shapes. The variants wrap `geo` types directly so
//! the spatial algorithms can work on them without another conversion layer.

use geo::{BoundingRect, Geometry as GeoGeometry, MultiPolygon, Point, Polygon, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CurbsideError, Result};

/// Geometry type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    Polygon,
    MultiPolygon,
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryType::Point => "Point",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPolygon => "MultiPolygon",
        };
        f.write_str(name)
    }
}

/// Feature geometry
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point<f64>),
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl Geometry {
    /// Create a Point geometry
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point(Point::new(x, y))
    }

    /// Create a Polygon geometry from coordinate rings, the first being the exterior
    pub fn polygon(rings: Vec<Vec<[f64; 2]>>) -> Self {
        Geometry::Polygon(polygon_from_rings(rings))
    }

    /// Get the geometry type
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::Polygon(_) => GeometryType::Polygon,
            Geometry::MultiPolygon(_) => GeometryType::MultiPolygon,
        }
    }

    /// Whether this is a polygonal geometry
    pub fn is_polygonal(&self) -> bool {
        !matches!(self, Geometry::Point(_))
    }

    /// Bounding rectangle, `None` for an empty multipolygon
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            Geometry::Point(p) => Some(p.bounding_rect()),
            Geometry::Polygon(p) => p.bounding_rect(),
            Geometry::MultiPolygon(mp) => mp.bounding_rect(),
        }
    }

    /// Convert to a `geo::Geometry`
    pub fn to_geo(&self) -> GeoGeometry<f64> {
        self.clone().into()
    }

    /// Convert a `geo::Geometry`, rejecting shapes features may not carry.
    ///
    /// `feature` is only used to label the error.
    pub fn from_geo(geometry: GeoGeometry<f64>, feature: &str) -> Result<Self> {
        match geometry {
            GeoGeometry::Point(p) => Ok(Geometry::Point(p)),
            GeoGeometry::Polygon(p) => Ok(Geometry::Polygon(p)),
            GeoGeometry::MultiPolygon(mp) => Ok(Geometry::MultiPolygon(mp)),
            GeoGeometry::Rect(r) => Ok(Geometry::Polygon(r.to_polygon())),
            GeoGeometry::Triangle(t) => Ok(Geometry::Polygon(t.to_polygon())),
            other => Err(CurbsideError::UnsupportedGeometry {
                feature: feature.to_string(),
                kind: geo_type_name(&other).to_string(),
            }),
        }
    }

    /// Convert to a GeoJSON geometry
    pub fn to_geojson(&self) -> geojson::Geometry {
        geojson::Geometry::new(geojson::Value::from(&self.to_geo()))
    }
}

impl From<Geometry> for GeoGeometry<f64> {
    fn from(geometry: Geometry) -> Self {
        match geometry {
            Geometry::Point(p) => GeoGeometry::Point(p),
            Geometry::Polygon(p) => GeoGeometry::Polygon(p),
            Geometry::MultiPolygon(mp) => GeoGeometry::MultiPolygon(mp),
        }
    }
}

fn polygon_from_rings(rings: Vec<Vec<[f64; 2]>>) -> Polygon<f64> {
    let mut rings = rings.into_iter().map(|ring| {
        geo::LineString::from(
            ring.into_iter().map(|c| geo::Coord { x: c[0], y: c[1] }).collect::<Vec<_>>(),
        )
    });

    let exterior = rings.next().unwrap_or_else(|| geo::LineString::new(vec![]));
    Polygon::new(exterior, rings.collect())
}

fn geo_type_name(geometry: &GeoGeometry<f64>) -> &'static str {
    match geometry {
        GeoGeometry::Point(_) => "Point",
        GeoGeometry::Line(_) => "Line",
        GeoGeometry::LineString(_) => "LineString",
        GeoGeometry::Polygon(_) => "Polygon",
        GeoGeometry::MultiPoint(_) => "MultiPoint",
        GeoGeometry::MultiLineString(_) => "MultiLineString",
        GeoGeometry::MultiPolygon(_) => "MultiPolygon",
        GeoGeometry::GeometryCollection(_) => "GeometryCollection",
        GeoGeometry::Rect(_) => "Rect",
        GeoGeometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_rings_are_closed() {
        let geom = Geometry::polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]);
        let Geometry::Polygon(poly) = geom else {
            panic!("Expected Polygon geometry");
        };
        assert!(poly.exterior().is_closed());
        assert_eq!(poly.exterior().0.len(), 4);
    }

    #[test]
    fn test_rejects_linestring() {
        let line = GeoGeometry::LineString(geo::LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]));
        let err = Geometry::from_geo(line, "road-7").unwrap_err();
        match err {
            CurbsideError::UnsupportedGeometry { feature, kind } => {
                assert_eq!(feature, "road-7");
                assert_eq!(kind, "LineString");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bounding_rect() {
        let geom = Geometry::polygon(vec![vec![[0.0, 0.0], [4.0, 0.0], [4.0, 2.0], [0.0, 0.0]]]);
        let rect = geom.bounding_rect().unwrap();
        assert_eq!(rect.min(), geo::coord! { x: 0.0, y: 0.0 });
        assert_eq!(rect.max(), geo::coord! { x: 4.0, y: 2.0 });

        let empty = Geometry::MultiPolygon(MultiPolygon::new(vec![]));
        assert!(empty.bounding_rect().is_none());
    }

    #[test]
    fn test_geojson_output() {
        let json = serde_json::to_value(Geometry::point(174.77, -41.29).to_geojson()).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], 174.77);
    }
}
