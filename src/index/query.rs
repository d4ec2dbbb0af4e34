//! Concurrent query execution over routed partitions.
//!
//! Each routed partition answers its share of a query on its own scoped
//! thread. Every thread is joined before the executor returns; a failing or
//! panicking task contributes no candidates and is recorded as a
//! [`PartitionFailure`].

use super::partition::Partition;
use crate::compute::distance::haversine_km;
use crate::compute::merge::{Neighbor, merge_nearest};
use crate::compute::spatial::{IndexedPoint, SpatialTree};
use crate::config::FailurePolicy;
use crate::error::{GeoShardError, PartitionFailure, Result};
use geo::Point as GeoPoint;
use geoshard_types::bbox::BoundingBox;
use geoshard_types::point::{Location, Point};
use std::collections::HashSet;
use std::thread;

/// Merged results of a fan-out query together with any partition failures.
///
/// # Example
///
/// ```rust
/// use geoshard::{BoundingBox, PartitionedIndex, Point};
///
/// let index = PartitionedIndex::with_partitions(4);
/// index.index_points(vec![Point::new("sf", 37.7749, -122.4194)]);
///
/// let outcome = index.query_box_detailed(&BoundingBox::world()).unwrap();
/// assert!(outcome.is_complete());
/// assert_eq!(outcome.partitions_queried, 4);
/// assert_eq!(outcome.results.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome<R> {
    pub results: Vec<R>,
    pub failures: Vec<PartitionFailure>,
    /// Number of partitions the query was routed to
    pub partitions_queried: usize,
}

impl<R> QueryOutcome<R> {
    /// True when every routed partition answered.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Apply a failure policy: best-effort keeps the partial results, strict
    /// turns any failure into [`GeoShardError::PartialQuery`].
    pub fn into_result(self, policy: FailurePolicy) -> Result<Vec<R>> {
        match policy {
            FailurePolicy::Strict if !self.failures.is_empty() => {
                Err(GeoShardError::PartialQuery {
                    failed: self.failures.len(),
                    total: self.partitions_queried,
                    failures: self.failures,
                })
            }
            _ => Ok(self.results),
        }
    }
}

/// Per-partition partials in routed order, before merging.
pub(crate) struct Partials<R> {
    partials: Vec<Vec<R>>,
    failures: Vec<PartitionFailure>,
    queried: usize,
}

impl<R> Partials<R> {
    pub(crate) fn merge_with<F>(self, merge: F) -> QueryOutcome<R>
    where
        F: FnOnce(Vec<Vec<R>>) -> Vec<R>,
    {
        QueryOutcome {
            results: merge(self.partials),
            failures: self.failures,
            partitions_queried: self.queried,
        }
    }
}

/// Run `task` against every routed partition concurrently and wait for all
/// of them. Partials come back in `routed` order.
pub(crate) fn fan_out<T, R, F>(partitions: &[Partition<T>], routed: &[usize], task: F) -> Partials<R>
where
    T: SpatialTree,
    R: Send,
    F: Fn(&Partition<T>) -> Result<Vec<R>> + Sync,
{
    let answers: Vec<(usize, Result<Vec<R>>)> = if routed.len() <= 1 {
        routed.iter().map(|&id| (id, task(&partitions[id]))).collect()
    } else {
        let task = &task;
        thread::scope(|scope| {
            let handles: Vec<_> = routed
                .iter()
                .map(|&id| {
                    let partition = &partitions[id];
                    (id, scope.spawn(move || task(partition)))
                })
                .collect();

            handles
                .into_iter()
                .map(|(id, handle)| {
                    let answer = handle.join().unwrap_or_else(|_| {
                        Err(GeoShardError::Tree("partition task panicked".to_string()))
                    });
                    (id, answer)
                })
                .collect()
        })
    };

    let mut partials = Vec::with_capacity(answers.len());
    let mut failures = Vec::new();
    for (id, answer) in answers {
        match answer {
            Ok(found) => partials.push(found),
            Err(e) => failures.push(PartitionFailure {
                partition: id,
                reason: e.to_string(),
            }),
        }
    }

    Partials {
        partials,
        failures,
        queried: routed.len(),
    }
}

/// Points of one partition inside `bbox`, edges included.
pub(crate) fn search_box<T: SpatialTree>(
    partition: &Partition<T>,
    bbox: &BoundingBox,
) -> Result<Vec<Point>> {
    let hits = partition.tree().search_intersecting(&bbox.to_rect())?;
    Ok(hits
        .into_iter()
        .filter(|item| bbox.contains(&item.location))
        .map(|item| item.to_point())
        .collect())
}

/// Points of one partition within `radius_km` of `center`.
///
/// `envelope` prunes the tree search; membership is decided by the exact
/// great-circle distance.
pub(crate) fn search_radius<T: SpatialTree>(
    partition: &Partition<T>,
    center: &Location,
    radius_km: f64,
    envelope: &BoundingBox,
) -> Result<Vec<Point>> {
    let hits = partition.tree().search_intersecting(&envelope.to_rect())?;
    Ok(hits
        .into_iter()
        .filter(|item| haversine_km(center, &item.location) <= radius_km)
        .map(|item| item.to_point())
        .collect())
}

/// Up to `local_k` candidates from one partition with exact distances,
/// nearest first.
///
/// The tree ranks by planar degrees, where a point just across the
/// antimeridian sits a full turn away. The center is also searched shifted
/// by ±360° of longitude and the union is re-ranked by great-circle distance.
pub(crate) fn search_nearest<T: SpatialTree>(
    partition: &Partition<T>,
    center: &Location,
    local_k: usize,
) -> Result<Vec<Neighbor>> {
    let tree = partition.tree();
    let mut seen: HashSet<*const IndexedPoint> = HashSet::new();
    let mut candidates = Vec::new();

    for shift in [0.0, -360.0, 360.0] {
        let query = GeoPoint::new(center.lon + shift, center.lat);
        for item in tree.k_nearest(local_k, query)? {
            if seen.insert(item as *const IndexedPoint) {
                candidates.push(Neighbor::new(
                    item.to_point(),
                    haversine_km(center, &item.location),
                ));
            }
        }
    }

    Ok(merge_nearest(vec![candidates], local_k))
}
