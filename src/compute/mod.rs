//! Compute layer for query processing and algorithms.
//!
//! This module holds the pure, lock-free pieces of the index:
//! - Great-circle distance and radius envelopes
//! - Coordinate and query validation
//! - The spatial-tree primitive each partition wraps
//! - Longitude-band routing
//! - Partial result merging
//!
//! Nothing here knows about partitions' ownership or locking; that lives in
//! [`crate::index`].

pub mod distance;
pub mod merge;
pub mod routing;
pub mod spatial;
pub mod validation;

pub use distance::{EARTH_RADIUS_KM, haversine_km, radius_envelope, radius_to_degrees};
pub use merge::{Neighbor, merge_nearest, merge_union};
pub use routing::LonBand;
pub use spatial::{IndexedPoint, RStarTree, SpatialTree};
