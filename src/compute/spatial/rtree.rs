//! R*-tree backed implementation of [`SpatialTree`].
//!
//! Points are stored as degenerate envelopes in (longitude, latitude) space.
//! Intersection searches return every point inside the query rectangle, edges
//! included. Nearest-neighbor searches walk `rstar`'s nearest neighbor
//! iterator, which orders by planar squared distance in degrees; callers
//! re-rank with exact great-circle distances.

use super::{IndexedPoint, SpatialTree};
use crate::error::Result;
use geo::{Point as GeoPoint, Rect};
use rstar::{AABB, PointDistance, RStarInsertionStrategy, RTree, RTreeObject, RTreeParams};

/// Minimum number of children per node.
pub const MIN_CHILDREN: usize = 25;
/// Maximum number of children per node.
pub const MAX_CHILDREN: usize = 50;

/// Node sizing used for every partition tree.
pub struct GeoTreeParams;

impl RTreeParams for GeoTreeParams {
    const MIN_SIZE: usize = MIN_CHILDREN;
    const MAX_SIZE: usize = MAX_CHILDREN;
    const REINSERTION_COUNT: usize = 8;
    type DefaultInsertionStrategy = RStarInsertionStrategy;
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.lon, self.location.lat])
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.location.lon - point[0];
        let dy = self.location.lat - point[1];
        dx * dx + dy * dy
    }
}

/// Two-dimensional R*-tree over indexed points.
pub struct RStarTree {
    tree: RTree<IndexedPoint, GeoTreeParams>,
}

impl RStarTree {
    pub fn new() -> Self {
        Self {
            tree: RTree::new_with_params(),
        }
    }

    /// Build a tree from a batch in one pass (STR bulk loading).
    pub fn bulk_load(items: Vec<IndexedPoint>) -> Self {
        Self {
            tree: RTree::bulk_load_with_params(items),
        }
    }
}

impl Default for RStarTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialTree for RStarTree {
    fn insert(&mut self, item: IndexedPoint) {
        self.tree.insert(item);
    }

    /// Bulk loads when the tree is empty, which is the rebuild path.
    fn insert_batch(&mut self, items: Vec<IndexedPoint>) {
        if self.tree.size() == 0 {
            *self = Self::bulk_load(items);
        } else {
            for item in items {
                self.tree.insert(item);
            }
        }
    }

    fn search_intersecting(&self, rect: &Rect<f64>) -> Result<Vec<&IndexedPoint>> {
        let envelope = AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
        Ok(self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .collect())
    }

    fn k_nearest(&self, k: usize, query: GeoPoint<f64>) -> Result<Vec<&IndexedPoint>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        Ok(self
            .tree
            .nearest_neighbor_iter(&[query.x(), query.y()])
            .take(k)
            .collect())
    }

    fn len(&self) -> usize {
        self.tree.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;
    use geoshard_types::point::Location;

    fn item(id: &str, lat: f64, lon: f64) -> IndexedPoint {
        IndexedPoint::new(id, Location::new(lat, lon))
    }

    fn rect(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Rect<f64> {
        Rect::new(
            coord! { x: min_lon, y: min_lat },
            coord! { x: max_lon, y: max_lat },
        )
    }

    #[test]
    fn test_insert_and_search() {
        let mut tree = RStarTree::new();
        tree.insert(item("sf", 37.7749, -122.4194));
        tree.insert(item("la", 34.0522, -118.2437));
        tree.insert(item("nyc", 40.7128, -74.0060));
        assert_eq!(tree.len(), 3);

        let mut ids: Vec<_> = tree
            .search_intersecting(&rect(32.0, -125.0, 42.0, -114.0))
            .unwrap()
            .into_iter()
            .map(|p| p.id.as_str())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["la", "sf"]);
    }

    #[test]
    fn test_search_includes_edges() {
        let mut tree = RStarTree::new();
        tree.insert(item("corner", 10.0, 20.0));
        let hits = tree.search_intersecting(&rect(10.0, 20.0, 11.0, 21.0)).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_k_nearest_order() {
        let mut tree = RStarTree::new();
        for i in 0..100 {
            tree.insert(item(&format!("p{}", i), 0.0, i as f64 * 0.1));
        }

        let nearest = tree.k_nearest(3, GeoPoint::new(0.0, 0.0)).unwrap();
        let ids: Vec<_> = nearest.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2"]);

        assert!(tree.k_nearest(0, GeoPoint::new(0.0, 0.0)).unwrap().is_empty());
        assert_eq!(tree.k_nearest(500, GeoPoint::new(0.0, 0.0)).unwrap().len(), 100);
    }

    #[test]
    fn test_bulk_load_matches_inserts() {
        let items: Vec<_> = (0..1000)
            .map(|i| item(&format!("p{}", i), (i % 90) as f64, (i % 180) as f64))
            .collect();
        let tree = RStarTree::bulk_load(items);
        assert_eq!(tree.len(), 1000);
        assert!(!tree.is_empty());

        let all = tree.search_intersecting(&rect(-90.0, -180.0, 90.0, 180.0)).unwrap();
        assert_eq!(all.len(), 1000);
    }

    #[test]
    fn test_insert_batch_into_empty_and_populated_trees() {
        let mut tree = RStarTree::new();
        tree.insert_batch((0..500).map(|i| item(&format!("a{}", i), 1.0, i as f64 * 0.1)).collect());
        assert_eq!(tree.len(), 500);

        tree.insert_batch((0..200).map(|i| item(&format!("b{}", i), -1.0, i as f64 * 0.1)).collect());
        assert_eq!(tree.len(), 700);

        let south = tree.search_intersecting(&rect(-2.0, -180.0, 0.0, 180.0)).unwrap();
        assert_eq!(south.len(), 200);
        assert!(south.iter().all(|p| p.id.starts_with('b')));

        let nearest = tree.k_nearest(1, GeoPoint::new(0.0, 1.0)).unwrap();
        assert_eq!(nearest[0].id, "a0");
    }
}
