//! Batch insertion: sequential bucketing, then one insertion task per
//! non-empty partition.

use super::partition::{Partition, PartitionLayout};
use crate::compute::spatial::{IndexedPoint, SpatialTree};
use crate::compute::validation::validate_location;
use geoshard_types::point::Point;
use log::warn;
use std::thread;

/// Points grouped by target partition.
pub(crate) struct Buckets {
    pub(crate) buckets: Vec<Vec<IndexedPoint>>,
    /// Points without a location
    pub(crate) unlocated: usize,
    /// Points whose location failed validation
    pub(crate) invalid: usize,
}

/// Assign each located point to its partition's bucket.
///
/// Runs on the calling thread so assignment never touches shared state.
pub(crate) fn bucket_points<I>(layout: &PartitionLayout, points: I) -> Buckets
where
    I: IntoIterator<Item = Point>,
{
    let mut buckets: Vec<Vec<IndexedPoint>> = (0..layout.count()).map(|_| Vec::new()).collect();
    let mut unlocated = 0;
    let mut invalid = 0;

    for point in points {
        let Some(item) = IndexedPoint::from_point(point) else {
            unlocated += 1;
            continue;
        };

        if let Err(e) = validate_location(&item.location) {
            warn!("Skipping point '{}': {}", item.id, e);
            invalid += 1;
            continue;
        }

        let id = layout.partition_of(item.location.lon);
        buckets[id].push(item);
    }

    Buckets {
        buckets,
        unlocated,
        invalid,
    }
}

/// Insert every non-empty bucket into its partition concurrently and return
/// the total number of points inserted.
///
/// `buckets[i]` goes to `partitions[i]`; both slices have one entry per
/// partition. Each bucket gets its own scoped thread, so the caller keeps no
/// pool busy while it holds the write lock.
pub(crate) fn insert_buckets<T: SpatialTree>(
    partitions: &mut [Partition<T>],
    buckets: Vec<Vec<IndexedPoint>>,
) -> usize {
    debug_assert_eq!(partitions.len(), buckets.len());

    let mut work: Vec<_> = partitions
        .iter_mut()
        .zip(buckets)
        .filter(|(_, bucket)| !bucket.is_empty())
        .collect();

    if work.len() <= 1 {
        return work
            .pop()
            .map_or(0, |(partition, bucket)| partition.insert_all(bucket));
    }

    thread::scope(|scope| {
        let handles: Vec<_> = work
            .into_iter()
            .map(|(partition, bucket)| scope.spawn(move || partition.insert_all(bucket)))
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(inserted) => inserted,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .sum()
    })
}
