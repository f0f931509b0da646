//! Polygon validity repair
//!
//! Containment tests against self-intersecting or degenerate polygons are
//! unreliable, so every collection is normalized once, before it is indexed.
//! Each invalid part is noded and rebuilt through a boolean union with an
//! empty operand, then the parts are unioned together. Rings the overlay
//! leaves touching themselves are split into simple loops afterwards.

use crate::models::{FeatureCollection, Geometry};
use geo::orient::Direction;
use geo::{
    Area, BooleanOps, Contains, Coord, InteriorPoint, LineString, MultiPolygon, Orient, Polygon,
    Validation,
};

/// Counts gathered while normalizing a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Polygonal geometries inspected
    pub inspected: usize,
    /// Geometries that were invalid and got rebuilt
    pub repaired: usize,
    /// Rebuilt geometries that collapsed to nothing (zero-area input)
    pub emptied: usize,
}

/// Check whether a geometry is valid.
///
/// On top of the OGC rules checked by `geo`, a polygon with a zero-area ring
/// is invalid.
pub fn is_valid(geometry: &Geometry) -> bool {
    match geometry {
        Geometry::Point(p) => p.x().is_finite() && p.y().is_finite(),
        Geometry::Polygon(poly) => poly.is_valid() && has_area(poly),
        Geometry::MultiPolygon(mp) => mp.is_valid() && mp.iter().all(has_area),
    }
}

fn has_area(polygon: &Polygon<f64>) -> bool {
    polygon.unsigned_area() > 0.0
        && std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .all(|ring| ring_area(ring) != 0.0)
}

fn ring_area(ring: &LineString<f64>) -> f64 {
    Polygon::new(ring.clone(), vec![]).signed_area()
}

/// Count invalid geometries in a collection
pub fn count_invalid(collection: &FeatureCollection) -> usize {
    collection.iter().filter(|f| !is_valid(&f.geometry)).count()
}

/// Repair a geometry into its nearest valid equivalent.
///
/// Valid input comes back geometrically unchanged; only ring orientation is
/// normalized (exterior counter-clockwise, holes clockwise). Points pass
/// through untouched. Overlapping parts of a multi-polygon are merged.
pub fn repair(geometry: &Geometry) -> Geometry {
    match geometry {
        Geometry::Point(p) => Geometry::Point(*p),
        Geometry::Polygon(poly) if is_valid(geometry) => {
            Geometry::Polygon(poly.orient(Direction::Default))
        }
        Geometry::MultiPolygon(mp) if is_valid(geometry) => {
            Geometry::MultiPolygon(mp.orient(Direction::Default))
        }
        Geometry::Polygon(poly) => finish(rebuild_part(poly)),
        Geometry::MultiPolygon(mp) => {
            let merged = mp
                .iter()
                .map(rebuild_part)
                .fold(MultiPolygon::new(vec![]), |merged, part| merged.union(&part));
            finish(merged)
        }
    }
}

fn rebuild_part(polygon: &Polygon<f64>) -> MultiPolygon<f64> {
    strip_non_finite(polygon).union(&MultiPolygon::<f64>::new(vec![]))
}

fn finish(multi: MultiPolygon<f64>) -> Geometry {
    let mut multi = multi.orient(Direction::Default);
    if !multi.is_valid() {
        multi = split_touching(multi).orient(Direction::Default);
    }
    if !multi.is_valid() {
        tracing::warn!(parts = multi.0.len(), "Polygon still invalid after repair");
    }

    let mut polygons = multi.0;
    if polygons.len() == 1 {
        Geometry::Polygon(polygons.remove(0))
    } else {
        Geometry::MultiPolygon(MultiPolygon::new(polygons))
    }
}

/// Break rings that pass through a vertex more than once into simple loops.
///
/// The filled side of an oriented ring is always on its left, so loop
/// orientation alone says what it bounds: counter-clockwise loops are shells,
/// clockwise loops are holes. Each hole goes to the smallest shell around it.
fn split_touching(multi: MultiPolygon<f64>) -> MultiPolygon<f64> {
    let mut shells: Vec<(Polygon<f64>, Vec<LineString<f64>>)> = Vec::new();
    let mut holes = Vec::new();

    for polygon in &multi {
        let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
        for ring in rings.flat_map(simple_loops) {
            let area = ring_area(&ring);
            if area > 0.0 {
                shells.push((Polygon::new(ring, vec![]), Vec::new()));
            } else if area < 0.0 {
                holes.push(ring);
            }
        }
    }

    for hole in holes {
        let outline = Polygon::new(hole.clone(), vec![]);
        let Some(inside) = outline.interior_point() else {
            continue;
        };
        let hole_area = outline.unsigned_area();

        let owner = shells
            .iter_mut()
            .filter(|(shell, _)| shell.unsigned_area() > hole_area && shell.contains(&inside))
            .min_by(|(a, _), (b, _)| a.unsigned_area().total_cmp(&b.unsigned_area()));

        if let Some((_, interiors)) = owner {
            interiors.push(hole);
        }
    }

    shells
        .into_iter()
        .map(|(shell, interiors)| Polygon::new(shell.into_inner().0, interiors))
        .collect()
}

/// Closed loops of `ring`, cut wherever a vertex repeats
fn simple_loops(ring: &LineString<f64>) -> Vec<LineString<f64>> {
    let coords = match ring.0.split_last() {
        Some((_, open)) if ring.is_closed() => open,
        _ => &ring.0[..],
    };

    let mut loops = Vec::new();
    let mut path: Vec<Coord<f64>> = Vec::with_capacity(coords.len());

    for &coord in coords {
        if let Some(start) = path.iter().position(|c| *c == coord) {
            let mut cycle = path.split_off(start);
            cycle.push(coord);
            loops.push(LineString::from(cycle));
        }
        path.push(coord);
    }

    if let Some(&first) = path.first() {
        path.push(first);
        loops.push(LineString::from(path));
    }
    loops
}

fn strip_non_finite(polygon: &Polygon<f64>) -> Polygon<f64> {
    let keep = |ring: &LineString<f64>| -> LineString<f64> {
        ring.coords()
            .filter(|c| c.x.is_finite() && c.y.is_finite())
            .copied()
            .collect::<Vec<Coord<f64>>>()
            .into()
    };

    Polygon::new(keep(polygon.exterior()), polygon.interiors().iter().map(keep).collect())
}

/// Repair every polygonal feature of a collection.
///
/// Returns the normalized collection alongside repair counts. Invalid
/// geometries are never an error.
pub fn normalize_collection(collection: &FeatureCollection) -> (FeatureCollection, RepairReport) {
    let mut report = RepairReport::default();

    let features = collection
        .iter()
        .map(|feature| {
            if !feature.geometry.is_polygonal() {
                return feature.clone();
            }

            report.inspected += 1;
            if is_valid(&feature.geometry) {
                return feature.with_geometry(repair(&feature.geometry));
            }

            let repaired = repair(&feature.geometry);
            report.repaired += 1;
            if repaired.bounding_rect().is_none() {
                report.emptied += 1;
                tracing::warn!(
                    dataset = collection.name(),
                    feature = %feature.id,
                    "Degenerate polygon collapsed to an empty geometry"
                );
            }
            feature.with_geometry(repaired)
        })
        .collect();

    (collection.derive(collection.crs().clone(), features), report)
}
