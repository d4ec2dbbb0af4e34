//! The spatial-tree primitive each partition wraps.
//!
//! Partitions only ever talk to their tree through [`SpatialTree`], so the
//! node-level algorithm stays pluggable. [`RStarTree`] is the default
//! implementation.

use crate::error::Result;
use geo::{Point as GeoPoint, Rect};
use geoshard_types::point::{Location, Point};

pub mod rtree;
pub use rtree::{GeoTreeParams, MAX_CHILDREN, MIN_CHILDREN, RStarTree};

/// A located point as stored inside a spatial tree.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPoint {
    pub id: String,
    pub location: Location,
}

impl IndexedPoint {
    pub fn new(id: impl Into<String>, location: Location) -> Self {
        Self {
            id: id.into(),
            location,
        }
    }

    /// Build from a point, or `None` when the point has no location.
    pub fn from_point(point: Point) -> Option<Self> {
        let location = point.location?;
        Some(Self {
            id: point.id,
            location,
        })
    }

    pub fn to_point(&self) -> Point {
        Point::with_location(self.id.clone(), self.location)
    }
}

/// Capability set required from a node-level spatial index.
///
/// Implementations must tolerate concurrent `&self` calls from multiple
/// threads; mutation happens only through `&mut self` under the index write
/// lock.
pub trait SpatialTree: Send + Sync {
    fn insert(&mut self, item: IndexedPoint);

    /// Insert a whole batch. Trees with a faster bulk path override this.
    fn insert_batch(&mut self, items: Vec<IndexedPoint>) {
        for item in items {
            self.insert(item);
        }
    }

    /// Every item whose envelope intersects `rect` (x = longitude, y = latitude).
    fn search_intersecting(&self, rect: &Rect<f64>) -> Result<Vec<&IndexedPoint>>;

    /// Up to `k` items ordered by the tree's own distance metric.
    fn k_nearest(&self, k: usize, query: GeoPoint<f64>) -> Result<Vec<&IndexedPoint>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_point_requires_location() {
        let item = IndexedPoint::from_point(Point::new("sf", 37.7749, -122.4194)).unwrap();
        assert_eq!(item.id, "sf");
        assert_eq!(item.location, Location::new(37.7749, -122.4194));
        assert_eq!(item.to_point(), Point::new("sf", 37.7749, -122.4194));

        assert!(IndexedPoint::from_point(Point::unlocated("ghost")).is_none());
    }
}
