//! Merging of per-partition partial results.

use geoshard_types::point::Point;
use std::cmp::Ordering;

/// A k-NN candidate with its exact great-circle distance.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub point: Point,
    pub distance_km: f64,
}

impl Neighbor {
    pub fn new(point: Point, distance_km: f64) -> Self {
        Self { point, distance_km }
    }
}

/// Unordered union of box/radius partials. Duplicates are kept.
pub fn merge_union<T>(partials: Vec<Vec<T>>) -> Vec<T> {
    let total = partials.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);
    for partial in partials {
        merged.extend(partial);
    }
    merged
}

/// Global top-`k` of k-NN partials, nearest first.
///
/// Candidates are concatenated in partition order and stable-sorted, so equal
/// distances keep their arrival order. Fewer than `k` candidates are returned
/// as-is.
///
/// # Examples
///
/// ```
/// use geoshard::compute::merge::{Neighbor, merge_nearest};
/// use geoshard::Point;
///
/// let west = vec![Neighbor::new(Point::new("a", 0.0, -10.0), 1100.0)];
/// let east = vec![
///     Neighbor::new(Point::new("b", 0.0, 1.0), 110.0),
///     Neighbor::new(Point::new("c", 0.0, 30.0), 3300.0),
/// ];
/// let top = merge_nearest(vec![west, east], 2);
/// assert_eq!(top[0].point.id, "b");
/// assert_eq!(top[1].point.id, "a");
/// ```
pub fn merge_nearest(partials: Vec<Vec<Neighbor>>, k: usize) -> Vec<Neighbor> {
    let mut candidates = merge_union(partials);
    candidates.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
    });
    candidates.truncate(k);
    candidates
}
