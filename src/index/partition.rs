//! Longitude partitioning and the partition slots themselves.

use crate::compute::routing::LonBand;
use crate::compute::spatial::{IndexedPoint, SpatialTree};

/// Fixed-width longitude bands for `count` partitions.
///
/// Band `i` covers `[-180 + i*W, -180 + (i+1)*W)` with `W = 360 / count`; the
/// last band's upper edge is forced to exactly +180 and is inclusive.
#[derive(Debug, Clone)]
pub struct PartitionLayout {
    count: usize,
    width: f64,
    bands: Vec<LonBand>,
}

impl PartitionLayout {
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn new(count: usize) -> Self {
        assert!(count > 0, "Partition count must be greater than zero");
        let width = 360.0 / count as f64;
        let bands = (0..count)
            .map(|i| {
                let last = i + 1 == count;
                let lon_min = -180.0 + i as f64 * width;
                let lon_max = if last {
                    180.0
                } else {
                    -180.0 + (i + 1) as f64 * width
                };
                LonBand::new(lon_min, lon_max, last)
            })
            .collect();

        Self {
            count,
            width,
            bands,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Band width in degrees.
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn bands(&self) -> &[LonBand] {
        &self.bands
    }

    /// Partition id for a longitude: `clamp(floor((lon + 180) / W), 0, P-1)`.
    ///
    /// The arithmetic estimate is nudged onto the band whose precomputed
    /// bounds contain `lon`, so assignment and routing always agree.
    ///
    /// # Examples
    ///
    /// ```
    /// use geoshard::index::PartitionLayout;
    ///
    /// let layout = PartitionLayout::new(4);
    /// assert_eq!(layout.partition_of(-170.0), 0);
    /// assert_eq!(layout.partition_of(10.0), 2);
    /// assert_eq!(layout.partition_of(180.0), 3);
    /// ```
    pub fn partition_of(&self, lon: f64) -> usize {
        let raw = ((lon + 180.0) / self.width).floor();
        let mut id = if raw.is_nan() || raw < 0.0 {
            0
        } else {
            (raw as usize).min(self.count - 1)
        };

        while id > 0 && lon < self.bands[id].lon_min {
            id -= 1;
        }
        while id + 1 < self.count && lon >= self.bands[id].lon_max {
            id += 1;
        }
        id
    }
}

/// One shard: a spatial tree owning a single longitude band.
pub struct Partition<T> {
    id: usize,
    band: LonBand,
    tree: T,
    local_count: usize,
}

impl<T: SpatialTree + Default> Partition<T> {
    pub fn new(id: usize, band: LonBand) -> Self {
        Self {
            id,
            band,
            tree: T::default(),
            local_count: 0,
        }
    }

    /// Drop the tree and start over empty.
    pub(crate) fn reset(&mut self) {
        self.tree = T::default();
        self.local_count = 0;
    }
}

impl<T: SpatialTree> Partition<T> {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn band(&self) -> &LonBand {
        &self.band
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    /// Points inserted since the last reset.
    pub fn len(&self) -> usize {
        self.local_count
    }

    pub fn is_empty(&self) -> bool {
        self.local_count == 0
    }

    /// Insert a bucket and return how many points went in.
    pub(crate) fn insert_all(&mut self, items: Vec<IndexedPoint>) -> usize {
        let inserted = items.len();
        self.tree.insert_batch(items);
        self.local_count += inserted;
        inserted
    }

    pub fn stats(&self) -> PartitionStats {
        PartitionStats {
            id: self.id,
            lon_min: self.band.lon_min,
            lon_max: self.band.lon_max,
            point_count: self.local_count,
        }
    }
}

/// Statistics for a single partition.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionStats {
    pub id: usize,
    pub lon_min: f64,
    pub lon_max: f64,
    /// Number of points in this partition's tree
    pub point_count: usize,
}
