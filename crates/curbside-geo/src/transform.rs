//! CRS transformation
//!
//! Containment runs in the canonical geographic CRS, distance needs meters, so
//! points and geometries move between EPSG:4326 and a projected CRS. The
//! spherical Web Mercator pair is built in; with the `proj` feature any pair
//! PROJ knows about is accepted as well.

use crate::models::{Crs, FeatureCollection, Geometry};
use curbside_core::error::{CurbsideError, Result};
use geo::{Coord, MapCoords, Point};

/// WGS 84 semi-major axis, the sphere radius used by EPSG:3857
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude at which Web Mercator turns square; the poles themselves have no image
const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;

/// Check if two CRS are the same
pub fn crs_match(crs1: &Crs, crs2: &Crs) -> bool {
    crs1.epsg == crs2.epsg
}

/// Detect CRS mismatch and return error if they don't match
pub fn check_crs_mismatch(expected: &Crs, found: &Crs) -> Result<()> {
    if !crs_match(expected, found) {
        return Err(CurbsideError::CrsMismatch {
            expected: format!("{} ({})", expected, expected.name),
            found: format!("{} ({})", found, found.name),
        });
    }
    Ok(())
}

enum Transform {
    Identity,
    GeographicToWebMercator,
    WebMercatorToGeographic,
    #[cfg(feature = "proj")]
    Proj(proj::Proj),
}

impl Transform {
    fn new(from: &Crs, to: &Crs) -> Result<Self> {
        if crs_match(from, to) {
            return Ok(Transform::Identity);
        }

        match (from.epsg, to.epsg) {
            (4326, 3857) => Ok(Transform::GeographicToWebMercator),
            (3857, 4326) => Ok(Transform::WebMercatorToGeographic),
            _ => Self::fallback(from, to),
        }
    }

    #[cfg(not(feature = "proj"))]
    fn fallback(from: &Crs, to: &Crs) -> Result<Self> {
        let unknown = if matches!(from.epsg, 4326 | 3857) { to } else { from };
        Err(CurbsideError::UnsupportedCrs { crs: unknown.to_string() })
    }

    #[cfg(feature = "proj")]
    fn fallback(from: &Crs, to: &Crs) -> Result<Self> {
        let from_proj = from.to_string();
        let to_proj = to.to_string();

        proj::Proj::new_known_crs(&from_proj, &to_proj, None)
            .map(Transform::Proj)
            .map_err(|e| CurbsideError::UnsupportedCrs {
                crs: format!("{} -> {} ({})", from_proj, to_proj, e),
            })
    }

    fn apply(&self, coord: Coord<f64>) -> std::result::Result<Coord<f64>, String> {
        let projected = match self {
            Transform::Identity => return Ok(coord),
            Transform::GeographicToWebMercator => {
                if !(-90.0..=90.0).contains(&coord.y) || !(-180.0..=180.0).contains(&coord.x) {
                    return Err(format!(
                        "({}, {}) is not a geographic coordinate",
                        coord.x, coord.y
                    ));
                }
                let lat = coord.y.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
                let x = EARTH_RADIUS * coord.x.to_radians();
                let y = EARTH_RADIUS
                    * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
                Coord { x, y }
            }
            Transform::WebMercatorToGeographic => {
                let lon = (coord.x / EARTH_RADIUS).to_degrees();
                let lat = (2.0 * (coord.y / EARTH_RADIUS).exp().atan()
                    - std::f64::consts::FRAC_PI_2)
                    .to_degrees();
                Coord { x: lon, y: lat }
            }
            #[cfg(feature = "proj")]
            Transform::Proj(proj) => {
                let (x, y) = proj.convert((coord.x, coord.y)).map_err(|e| e.to_string())?;
                Coord { x, y }
            }
        };

        if projected.x.is_finite() && projected.y.is_finite() {
            Ok(projected)
        } else {
            Err(format!("({}, {}) has no finite image", coord.x, coord.y))
        }
    }
}

/// A resolved transform between two CRS
///
/// Resolve once and reuse it when a whole collection moves between CRS.
pub struct Reprojector {
    from: Crs,
    to: Crs,
    transform: Transform,
}

impl Reprojector {
    /// Resolve the transform from `from` to `to`
    pub fn new(from: &Crs, to: &Crs) -> Result<Self> {
        let transform = Transform::new(from, to)?;
        Ok(Self { from: from.clone(), to: to.clone(), transform })
    }

    pub fn source(&self) -> &Crs {
        &self.from
    }

    pub fn target(&self) -> &Crs {
        &self.to
    }

    pub fn is_identity(&self) -> bool {
        matches!(self.transform, Transform::Identity)
    }

    pub fn project_point(&self, point: Point<f64>) -> Result<Point<f64>> {
        point.try_map_coords(|c| self.convert(c))
    }

    pub fn project_geometry(&self, geometry: &Geometry) -> Result<Geometry> {
        if self.is_identity() {
            return Ok(geometry.clone());
        }

        let transformed = match geometry {
            Geometry::Point(p) => Geometry::Point(p.try_map_coords(|c| self.convert(c))?),
            Geometry::Polygon(poly) => {
                Geometry::Polygon(poly.try_map_coords(|c| self.convert(c))?)
            }
            Geometry::MultiPolygon(mp) => {
                Geometry::MultiPolygon(mp.try_map_coords(|c| self.convert(c))?)
            }
        };

        Ok(transformed)
    }

    fn convert(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        self.transform.apply(coord).map_err(|reason| CurbsideError::Reprojection {
            from: self.from.to_string(),
            to: self.to.to_string(),
            reason,
        })
    }
}

/// Reproject a single point from one CRS to another
pub fn project_point(point: Point<f64>, from_crs: &Crs, to_crs: &Crs) -> Result<Point<f64>> {
    Reprojector::new(from_crs, to_crs)?.project_point(point)
}

/// Reproject a geometry from one CRS to another
pub fn project_geometry(geometry: &Geometry, from_crs: &Crs, to_crs: &Crs) -> Result<Geometry> {
    Reprojector::new(from_crs, to_crs)?.project_geometry(geometry)
}

/// Reproject every feature of a collection, resolving the transform once
pub fn reproject_collection(
    collection: &FeatureCollection,
    target: &Crs,
) -> Result<FeatureCollection> {
    let reprojector = Reprojector::new(collection.crs(), target)?;
    if reprojector.is_identity() {
        return Ok(collection.derive(target.clone(), collection.features().to_vec()));
    }

    let features = collection
        .iter()
        .map(|feature| {
            let geometry = reprojector.project_geometry(&feature.geometry)?;
            Ok(feature.with_geometry(geometry))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(collection.derive(target.clone(), features))
}
