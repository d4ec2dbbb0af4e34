//! Query routing over longitude bands.
//!
//! Points are sharded by longitude only, so a query can skip every partition
//! whose band does not overlap the query's longitude span. Latitude is never
//! used for routing.

use geoshard_types::bbox::BoundingBox;

/// The longitude range owned by one partition.
///
/// The band is half-open, `[lon_min, lon_max)`, except for the last band which
/// also owns `lon_max` (= +180).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonBand {
    pub lon_min: f64,
    pub lon_max: f64,
    pub closed_max: bool,
}

impl LonBand {
    pub fn new(lon_min: f64, lon_max: f64, closed_max: bool) -> Self {
        Self {
            lon_min,
            lon_max,
            closed_max,
        }
    }

    /// Whether `lon` belongs to this band.
    pub fn contains(&self, lon: f64) -> bool {
        lon >= self.lon_min && (lon < self.lon_max || (self.closed_max && lon <= self.lon_max))
    }

    /// Whether this band overlaps the closed interval `[min_lon, max_lon]`.
    pub fn overlaps(&self, min_lon: f64, max_lon: f64) -> bool {
        let below_max = if self.closed_max {
            min_lon <= self.lon_max
        } else {
            min_lon < self.lon_max
        };
        self.lon_min <= max_lon && below_max
    }
}

/// Ids of the bands whose longitude range overlaps `bbox`.
///
/// # Examples
///
/// ```
/// use geoshard::compute::routing::{LonBand, route_bbox};
/// use geoshard::BoundingBox;
///
/// let bands = [
///     LonBand::new(-180.0, 0.0, false),
///     LonBand::new(0.0, 180.0, true),
/// ];
/// let west = BoundingBox::from_bounds(30.0, -125.0, 45.0, -70.0);
/// assert_eq!(route_bbox(&bands, &west), vec![0]);
/// ```
pub fn route_bbox(bands: &[LonBand], bbox: &BoundingBox) -> Vec<usize> {
    route_lon_span(bands, bbox.min_lon(), bbox.max_lon())
}

pub fn route_lon_span(bands: &[LonBand], min_lon: f64, max_lon: f64) -> Vec<usize> {
    bands
        .iter()
        .enumerate()
        .filter(|(_, band)| band.overlaps(min_lon, max_lon))
        .map(|(id, _)| id)
        .collect()
}

/// Every band id; k-NN queries always fan out to all partitions.
pub fn route_all(bands: &[LonBand]) -> Vec<usize> {
    (0..bands.len()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter_bands() -> Vec<LonBand> {
        vec![
            LonBand::new(-180.0, -90.0, false),
            LonBand::new(-90.0, 0.0, false),
            LonBand::new(0.0, 90.0, false),
            LonBand::new(90.0, 180.0, true),
        ]
    }

    #[test]
    fn test_band_contains() {
        let bands = quarter_bands();
        assert!(bands[0].contains(-180.0));
        assert!(!bands[0].contains(-90.0));
        assert!(bands[1].contains(-90.0));
        assert!(bands[3].contains(180.0));
    }

    #[test]
    fn test_route_single_band() {
        let bands = quarter_bands();
        let california = BoundingBox::from_bounds(32.0, -125.0, 42.0, -114.0);
        assert_eq!(route_bbox(&bands, &california), vec![0]);
    }

    #[test]
    fn test_route_spanning_bands() {
        let bands = quarter_bands();
        let atlantic = BoundingBox::from_bounds(0.0, -100.0, 10.0, 10.0);
        assert_eq!(route_bbox(&bands, &atlantic), vec![0, 1, 2]);
        assert_eq!(route_bbox(&bands, &BoundingBox::world()), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_route_on_band_boundary() {
        let bands = quarter_bands();
        // A box ending exactly at -90 touches band 1's first longitude
        let edge = BoundingBox::from_bounds(0.0, -100.0, 10.0, -90.0);
        assert_eq!(route_bbox(&bands, &edge), vec![0, 1]);

        // A box starting exactly at -90 does not reach back into band 0
        let start = BoundingBox::from_bounds(0.0, -90.0, 10.0, -80.0);
        assert_eq!(route_bbox(&bands, &start), vec![1]);

        // Only the last band owns +180
        let antimeridian = BoundingBox::from_bounds(0.0, 180.0, 10.0, 180.0);
        assert_eq!(route_bbox(&bands, &antimeridian), vec![3]);
    }

    #[test]
    fn test_route_all() {
        assert_eq!(route_all(&quarter_bands()), vec![0, 1, 2, 3]);
    }
}
