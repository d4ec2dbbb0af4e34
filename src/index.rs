//! The partitioned index.
//!
//! Points are sharded into fixed-width longitude bands, one spatial tree per
//! band. A single `parking_lot::RwLock` guards every partition and the point
//! counter: inserts, clears and loads take it exclusively for their whole
//! duration, queries share it and fan out across the routed partitions on
//! scoped threads that never touch the lock themselves.

mod insert;
pub mod partition;
pub mod query;

pub use partition::{Partition, PartitionLayout, PartitionStats};
pub use query::QueryOutcome;

use crate::compute::distance::radius_envelope;
use crate::compute::merge::{Neighbor, merge_nearest, merge_union};
use crate::compute::routing::{LonBand, route_all, route_bbox};
use crate::compute::spatial::{RStarTree, SpatialTree};
use crate::compute::validation::{validate_bbox, validate_location, validate_radius};
use crate::config::{Config, FailurePolicy};
use crate::error::{GeoShardError, Result};
use geoshard_types::bbox::BoundingBox;
use geoshard_types::point::{Location, Point};
use log::{debug, warn};
use parking_lot::RwLock;

struct IndexState<T> {
    partitions: Vec<Partition<T>>,
    /// Stored count of the most recent `index_points` call
    total_count: usize,
}

impl<T: SpatialTree + Default> IndexState<T> {
    fn reset(&mut self) {
        for partition in &mut self.partitions {
            partition.reset();
        }
        self.total_count = 0;
    }
}

/// A geographic point index sharded by longitude.
///
/// `T` is the per-partition spatial tree; [`RStarTree`] unless a different
/// [`SpatialTree`] is plugged in through [`PartitionedIndex::from_config`].
///
/// # Example
///
/// ```rust
/// use geoshard::{BoundingBox, Location, PartitionedIndex, Point};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let index = PartitionedIndex::with_partitions(4);
/// index.index_points(vec![
///     Point::new("sf", 37.7749, -122.4194),
///     Point::new("la", 34.0522, -118.2437),
///     Point::new("nyc", 40.7128, -74.0060),
/// ]);
/// assert_eq!(index.count(), 3);
///
/// let california = BoundingBox::from_bounds(32.0, -125.0, 42.0, -114.0);
/// assert_eq!(index.query_box(&california)?.len(), 2);
///
/// let nearest = index.nearest_neighbors(&Location::new(37.7749, -122.4194), 1)?;
/// assert_eq!(nearest[0].point.id, "sf");
/// # Ok(())
/// # }
/// ```
pub struct PartitionedIndex<T = RStarTree> {
    layout: PartitionLayout,
    config: Config,
    state: RwLock<IndexState<T>>,
}

impl PartitionedIndex<RStarTree> {
    /// Index with one partition per available CPU.
    pub fn new() -> Self {
        Self::from_valid_config(Config::default())
    }

    /// Index with a fixed partition count. Zero means the default count.
    pub fn with_partitions(partitions: usize) -> Self {
        Self::from_valid_config(Config::default().with_partitions(partitions))
    }

    pub fn with_config(config: Config) -> Result<Self> {
        Self::from_config(config)
    }
}

impl Default for PartitionedIndex<RStarTree> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SpatialTree + Default> PartitionedIndex<T> {
    /// Build an index over any spatial tree implementation.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate().map_err(GeoShardError::InvalidConfig)?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: Config) -> Self {
        let layout = PartitionLayout::new(config.partition_count());
        let partitions = layout
            .bands()
            .iter()
            .enumerate()
            .map(|(id, band)| Partition::new(id, *band))
            .collect();

        debug!(
            "Created partitioned index with {} partitions of {:.3} degrees",
            layout.count(),
            layout.width()
        );

        Self {
            layout,
            config,
            state: RwLock::new(IndexState {
                partitions,
                total_count: 0,
            }),
        }
    }

    /// Index a batch of points and return how many were stored.
    ///
    /// Points without a location are dropped; points with out-of-range
    /// coordinates are skipped with a warning. The write lock is held for the
    /// whole batch, so readers see either none or all of it.
    ///
    /// The value reported by [`count`](Self::count) is replaced by this
    /// batch's stored count rather than accumulated. Indexing twice without a
    /// [`clear`](Self::clear) stores both batches but only counts the last.
    pub fn index_points<I>(&self, points: I) -> usize
    where
        I: IntoIterator<Item = Point>,
    {
        let mut state = self.state.write();
        self.insert_locked(&mut state, points)
    }

    /// Clear the index and index `points` under a single write lock.
    pub(crate) fn replace_all<I>(&self, points: I) -> usize
    where
        I: IntoIterator<Item = Point>,
    {
        let mut state = self.state.write();
        state.reset();
        self.insert_locked(&mut state, points)
    }

    fn insert_locked<I>(&self, state: &mut IndexState<T>, points: I) -> usize
    where
        I: IntoIterator<Item = Point>,
    {
        let batch = insert::bucket_points(&self.layout, points);
        if batch.invalid > 0 {
            warn!("Skipped {} points with invalid coordinates", batch.invalid);
        }

        let stored = insert::insert_buckets(&mut state.partitions, batch.buckets);
        state.total_count = stored;

        debug!(
            "Indexed {} points ({} without location, {} invalid)",
            stored, batch.unlocated, batch.invalid
        );
        stored
    }

    /// Discard every partition tree and reset all counts.
    pub fn clear(&self) {
        self.state.write().reset();
        debug!("Cleared partitioned index");
    }
}

impl<T: SpatialTree> PartitionedIndex<T> {
    /// Points inside `bbox`, edges included, in no particular order.
    ///
    /// Zero-width and zero-height boxes are valid and match points lying
    /// exactly on them.
    ///
    /// Returns [`GeoShardError::InvalidInput`] for a non-finite or inverted
    /// box.
    pub fn query_box(&self, bbox: &BoundingBox) -> Result<Vec<Point>> {
        let outcome = self.query_box_detailed(bbox)?;
        self.resolve("box", outcome)
    }

    /// Like [`query_box`](Self::query_box), but returns partition failures
    /// alongside the results instead of applying the failure policy.
    pub fn query_box_detailed(&self, bbox: &BoundingBox) -> Result<QueryOutcome<Point>> {
        validate_bbox(bbox)?;
        let routed = route_bbox(self.layout.bands(), bbox);
        debug!("Box query routed to {} of {} partitions", routed.len(), self.layout.count());

        let state = self.state.read();
        Ok(query::fan_out(&state.partitions, &routed, |partition| {
            query::search_box(partition, bbox)
        })
        .merge_with(merge_union))
    }

    /// Every stored point together with the stored count, both read under
    /// one guard.
    #[cfg(feature = "snapshot")]
    pub(crate) fn contents(&self) -> (QueryOutcome<Point>, usize) {
        let world = BoundingBox::world();
        let routed = route_all(self.layout.bands());

        let state = self.state.read();
        let outcome = query::fan_out(&state.partitions, &routed, |partition| {
            query::search_box(partition, &world)
        })
        .merge_with(merge_union);
        (outcome, state.total_count)
    }

    /// Points within `radius_km` great-circle kilometers of `center`,
    /// boundary included, in no particular order.
    pub fn query_radius(&self, center: &Location, radius_km: f64) -> Result<Vec<Point>> {
        let outcome = self.query_radius_detailed(center, radius_km)?;
        self.resolve("radius", outcome)
    }

    pub fn query_radius_detailed(
        &self,
        center: &Location,
        radius_km: f64,
    ) -> Result<QueryOutcome<Point>> {
        validate_radius(center, radius_km)?;
        let envelope = radius_envelope(center, radius_km);
        let routed = route_bbox(self.layout.bands(), &envelope);
        debug!(
            "Radius query ({} km) routed to {} of {} partitions",
            radius_km,
            routed.len(),
            self.layout.count()
        );

        let state = self.state.read();
        Ok(query::fan_out(&state.partitions, &routed, |partition| {
            query::search_radius(partition, center, radius_km, &envelope)
        })
        .merge_with(merge_union))
    }

    /// The `k` points nearest to `center`, nearest first.
    ///
    /// Returns every indexed point when fewer than `k` exist, and nothing when
    /// `k` is zero.
    pub fn nearest_neighbors(&self, center: &Location, k: usize) -> Result<Vec<Neighbor>> {
        let outcome = self.nearest_neighbors_detailed(center, k)?;
        self.resolve("k-NN", outcome)
    }

    pub fn nearest_neighbors_detailed(
        &self,
        center: &Location,
        k: usize,
    ) -> Result<QueryOutcome<Neighbor>> {
        validate_location(center)?;
        if k == 0 {
            return Ok(QueryOutcome {
                results: Vec::new(),
                failures: Vec::new(),
                partitions_queried: 0,
            });
        }

        let local_k = k.saturating_mul(self.config.knn_overfetch);
        let routed = route_all(self.layout.bands());

        let state = self.state.read();
        Ok(query::fan_out(&state.partitions, &routed, |partition| {
            query::search_nearest(partition, center, local_k)
        })
        .merge_with(|partials| merge_nearest(partials, k)))
    }

    fn resolve<R>(&self, kind: &str, outcome: QueryOutcome<R>) -> Result<Vec<R>> {
        let policy = self.config.failure_policy;
        if policy == FailurePolicy::BestEffort {
            for failure in &outcome.failures {
                warn!("{} query lost {}", kind, failure);
            }
        }
        outcome.into_result(policy)
    }

    /// Stored count of the most recent [`index_points`](Self::index_points)
    /// call, or zero after [`clear`](Self::clear).
    pub fn count(&self) -> usize {
        self.state.read().total_count
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn partition_count(&self) -> usize {
        self.layout.count()
    }

    /// Width of each longitude band in degrees.
    pub fn partition_width(&self) -> f64 {
        self.layout.width()
    }

    /// Partition that owns `lon`.
    pub fn partition_of(&self, lon: f64) -> usize {
        self.layout.partition_of(lon)
    }

    pub fn bands(&self) -> &[LonBand] {
        self.layout.bands()
    }

    /// Per-partition point counts, in partition order.
    pub fn partition_stats(&self) -> Vec<PartitionStats> {
        self.state
            .read()
            .partitions
            .iter()
            .map(Partition::stats)
            .collect()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PartitionedIndex>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::spatial::IndexedPoint;
    use geo::{Point as GeoPoint, Rect};

    fn cities() -> Vec<Point> {
        vec![
            Point::new("sf", 37.7749, -122.4194),
            Point::new("oakland", 37.8044, -122.2712),
            Point::new("la", 34.0522, -118.2437),
            Point::new("nyc", 40.7128, -74.0060),
            Point::new("london", 51.5074, -0.1278),
            Point::new("tokyo", 35.6762, 139.6503),
        ]
    }

    fn sorted_ids(points: Vec<Point>) -> Vec<String> {
        let mut ids: Vec<_> = points.into_iter().map(|p| p.id).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_construction() {
        let index = PartitionedIndex::with_partitions(4);
        assert_eq!(index.partition_count(), 4);
        assert_eq!(index.partition_width(), 90.0);
        assert!(index.is_empty());
        assert!(PartitionedIndex::new().partition_count() >= 1);

        let bad = Config {
            knn_overfetch: 0,
            ..Config::default()
        };
        assert!(matches!(
            PartitionedIndex::with_config(bad),
            Err(GeoShardError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_index_and_count() {
        let index = PartitionedIndex::with_partitions(4);
        let mut points = cities();
        points.push(Point::unlocated("ghost"));
        assert_eq!(index.index_points(points), 6);
        assert_eq!(index.count(), 6);

        let per_partition: usize = index.partition_stats().iter().map(|s| s.point_count).sum();
        assert_eq!(per_partition, 6);
    }

    #[test]
    fn test_count_is_overwritten_by_each_batch() {
        let index = PartitionedIndex::with_partitions(2);
        index.index_points(cities());
        index.index_points(vec![Point::new("extra", 1.0, 1.0)]);
        assert_eq!(index.count(), 1);

        // Both batches are still stored
        let all = index.query_box(&BoundingBox::world()).unwrap();
        assert_eq!(all.len(), 7);
    }

    #[test]
    fn test_box_query() {
        let index = PartitionedIndex::with_partitions(4);
        index.index_points(cities());
        let california = BoundingBox::from_bounds(32.0, -125.0, 42.0, -114.0);
        assert_eq!(
            sorted_ids(index.query_box(&california).unwrap()),
            vec!["la", "oakland", "sf"]
        );
    }

    #[test]
    fn test_radius_query() {
        let index = PartitionedIndex::with_partitions(4);
        index.index_points(cities());
        let sf = Location::new(37.7749, -122.4194);
        assert_eq!(
            sorted_ids(index.query_radius(&sf, 20.0).unwrap()),
            vec!["oakland", "sf"]
        );
        assert_eq!(sorted_ids(index.query_radius(&sf, 0.0).unwrap()), vec!["sf"]);
    }

    #[test]
    fn test_nearest_neighbors() {
        let index = PartitionedIndex::with_partitions(4);
        index.index_points(cities());
        let sf = Location::new(37.7749, -122.4194);

        let nearest = index.nearest_neighbors(&sf, 3).unwrap();
        let ids: Vec<_> = nearest.iter().map(|n| n.point.id.as_str()).collect();
        assert_eq!(ids, vec!["sf", "oakland", "la"]);
        assert!(nearest.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));

        assert_eq!(index.nearest_neighbors(&sf, 100).unwrap().len(), 6);
        assert!(index.nearest_neighbors(&sf, 0).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_queries_rejected() {
        let index = PartitionedIndex::with_partitions(2);
        let inverted = BoundingBox::from_bounds(40.0, -100.0, 30.0, -90.0);
        assert!(matches!(
            index.query_box(&inverted),
            Err(GeoShardError::InvalidInput(_))
        ));
        assert!(index.query_radius(&Location::new(0.0, 0.0), -5.0).is_err());
        assert!(index.nearest_neighbors(&Location::new(0.0, 999.0), 3).is_err());
    }

    #[test]
    fn test_clear() {
        let index = PartitionedIndex::with_partitions(3);
        index.index_points(cities());
        index.clear();
        assert_eq!(index.count(), 0);
        assert!(index.query_box(&BoundingBox::world()).unwrap().is_empty());
        assert!(index.partition_stats().iter().all(|s| s.point_count == 0));
    }

    #[test]
    fn test_replace_all() {
        let index = PartitionedIndex::with_partitions(3);
        index.index_points(cities());
        let stored = index.replace_all(vec![Point::new("only", 0.0, 0.0)]);
        assert_eq!(stored, 1);
        assert_eq!(index.query_box(&BoundingBox::world()).unwrap().len(), 1);
    }

    /// Tree that fails every search once it holds a point named "poison".
    #[derive(Default)]
    struct FlakyTree {
        inner: RStarTree,
        poisoned: bool,
    }

    impl SpatialTree for FlakyTree {
        fn insert(&mut self, item: IndexedPoint) {
            self.poisoned |= item.id == "poison";
            self.inner.insert(item);
        }

        fn search_intersecting(&self, rect: &Rect<f64>) -> Result<Vec<&IndexedPoint>> {
            if self.poisoned {
                return Err(GeoShardError::Tree("poisoned partition".to_string()));
            }
            self.inner.search_intersecting(rect)
        }

        fn k_nearest(&self, k: usize, query: GeoPoint<f64>) -> Result<Vec<&IndexedPoint>> {
            if self.poisoned {
                return Err(GeoShardError::Tree("poisoned partition".to_string()));
            }
            self.inner.k_nearest(k, query)
        }

        fn len(&self) -> usize {
            self.inner.len()
        }
    }

    fn flaky_index(policy: FailurePolicy) -> PartitionedIndex<FlakyTree> {
        let config = Config::default()
            .with_partitions(4)
            .with_failure_policy(policy);
        let index = PartitionedIndex::<FlakyTree>::from_config(config).unwrap();
        let mut points = cities();
        // Lands in partition 3 next to Tokyo
        points.push(Point::new("poison", 35.0, 139.0));
        index.index_points(points);
        index
    }

    #[test]
    fn test_best_effort_drops_failed_partition() {
        let index = flaky_index(FailurePolicy::BestEffort);

        let all = index.query_box(&BoundingBox::world()).unwrap();
        assert_eq!(sorted_ids(all), vec!["la", "london", "nyc", "oakland", "sf"]);

        let detailed = index.query_box_detailed(&BoundingBox::world()).unwrap();
        assert_eq!(detailed.partitions_queried, 4);
        assert_eq!(detailed.failures.len(), 1);
        assert_eq!(detailed.failures[0].partition, 3);

        let nearest = index
            .nearest_neighbors(&Location::new(35.6762, 139.6503), 10)
            .unwrap();
        assert_eq!(nearest.len(), 5);
        assert!(nearest.iter().all(|n| n.point.id != "tokyo"));
    }

    #[test]
    fn test_strict_policy_fails_query() {
        let index = flaky_index(FailurePolicy::Strict);

        match index.query_box(&BoundingBox::world()) {
            Err(GeoShardError::PartialQuery { failed, total, failures }) => {
                assert_eq!(failed, 1);
                assert_eq!(total, 4);
                assert_eq!(failures[0].partition, 3);
            }
            other => panic!("expected PartialQuery, got {:?}", other.map(|r| r.len())),
        }

        // Queries that never reach the poisoned partition still succeed
        let california = BoundingBox::from_bounds(32.0, -125.0, 42.0, -114.0);
        assert_eq!(index.query_box(&california).unwrap().len(), 3);
    }
}
