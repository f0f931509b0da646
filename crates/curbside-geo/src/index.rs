use crate::models::{Crs, Feature, FeatureCollection, Geometry};
use crate::transform::check_crs_mismatch;
use curbside_core::error::Result;
use geo::{Closest, ClosestPoint, Contains, Distance, Euclidean, Intersects, Point};
use rstar::{RTree, RTreeObject, AABB};

/// Envelope of one feature, pointing back at its position in the collection
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedGeometry {
    /// Position of the feature in its collection
    pub id: usize,

    /// Bounding box for spatial indexing
    envelope: AABB<[f64; 2]>,
}

impl IndexedGeometry {
    /// Create a new indexed entry, `None` when the geometry has no extent
    pub fn new(id: usize, geometry: &Geometry) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        let min = rect.min();
        let max = rect.max();
        Some(Self { id, envelope: AABB::from_corners([min.x, min.y], [max.x, max.y]) })
    }
}

impl RTreeObject for IndexedGeometry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// R-tree over a feature collection it owns.
///
/// Queries prefilter on bounding boxes, then run the exact geometric test.
/// Results are positions in the indexed collection, in ascending order.
pub struct SpatialIndex {
    tree: RTree<IndexedGeometry>,
    collection: FeatureCollection,
}

impl SpatialIndex {
    /// Build an index over every feature of a collection
    pub fn build(collection: FeatureCollection) -> Self {
        let indexed: Vec<IndexedGeometry> = collection
            .iter()
            .enumerate()
            .filter_map(|(id, feature)| IndexedGeometry::new(id, &feature.geometry))
            .collect();

        Self { tree: RTree::bulk_load(indexed), collection }
    }

    /// The indexed collection
    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    /// CRS the indexed geometries are expressed in
    pub fn crs(&self) -> &Crs {
        self.collection.crs()
    }

    /// Polygons whose interior or boundary contains the point
    pub fn containing(&self, point: Point<f64>, crs: &Crs) -> Result<Vec<usize>> {
        self.exact_at_point(point, crs, |geometry| match geometry {
            Geometry::Point(_) => false,
            Geometry::Polygon(poly) => poly.intersects(&point),
            Geometry::MultiPolygon(mp) => mp.intersects(&point),
        })
    }

    /// Polygons whose interior, boundary excluded, contains the point
    pub fn strictly_containing(&self, point: Point<f64>, crs: &Crs) -> Result<Vec<usize>> {
        self.exact_at_point(point, crs, |geometry| match geometry {
            Geometry::Point(_) => false,
            Geometry::Polygon(poly) => poly.contains(&point),
            Geometry::MultiPolygon(mp) => mp.contains(&point),
        })
    }

    /// Features within `radius` of the point, boundary inclusive.
    ///
    /// Distance is planar in the index's CRS, so a metric CRS gives meters.
    pub fn within(&self, point: Point<f64>, crs: &Crs, radius: f64) -> Result<Vec<usize>> {
        check_crs_mismatch(self.crs(), crs)?;

        let search = AABB::from_corners(
            [point.x() - radius, point.y() - radius],
            [point.x() + radius, point.y() + radius],
        );

        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&search)
            .filter(|candidate| {
                self.collection
                    .get(candidate.id)
                    .and_then(|feature| planar_distance(&feature.geometry, point))
                    .is_some_and(|distance| distance <= radius)
            })
            .map(|candidate| candidate.id)
            .collect();

        hits.sort_unstable();
        Ok(hits)
    }

    fn exact_at_point(
        &self,
        point: Point<f64>,
        crs: &Crs,
        test: impl Fn(&Geometry) -> bool,
    ) -> Result<Vec<usize>> {
        check_crs_mismatch(self.crs(), crs)?;

        let cell = AABB::from_point([point.x(), point.y()]);
        let mut hits: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&cell)
            .filter(|candidate| {
                self.collection.get(candidate.id).is_some_and(|f| test(&f.geometry))
            })
            .map(|candidate| candidate.id)
            .collect();

        hits.sort_unstable();
        Ok(hits)
    }

    /// Resolve positions returned by a query into features
    pub fn features(&self, ids: &[usize]) -> Vec<&Feature> {
        ids.iter().filter_map(|&id| self.collection.get(id)).collect()
    }

    /// Get the total number of geometries in the index
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Planar distance from a geometry to a point; zero inside polygons
fn planar_distance(geometry: &Geometry, point: Point<f64>) -> Option<f64> {
    let closest = match geometry {
        Geometry::Point(p) => return Some(Euclidean.distance(*p, point)),
        Geometry::Polygon(poly) => poly.closest_point(&point),
        Geometry::MultiPolygon(mp) => mp.closest_point(&point),
    };

    match closest {
        Closest::Intersection(_) => Some(0.0),
        Closest::SinglePoint(p) => Some(Euclidean.distance(p, point)),
        Closest::Indeterminate => None,
    }
}
