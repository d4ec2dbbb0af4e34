//! Partitioned concurrent geo index with box, radius and k-nearest queries.
//!
//! ```rust
//! use geoshard::{Location, PartitionedIndex, Point};
//!
//! let index = PartitionedIndex::with_partitions(4);
//! index.index_points(vec![
//!     Point::new("sf", 37.7749, -122.4194),
//!     Point::new("oakland", 37.8044, -122.2712),
//! ]);
//!
//! let sf = Location::new(37.7749, -122.4194);
//! let nearby = index.query_radius(&sf, 20.0)?;
//! assert_eq!(nearby.len(), 2);
//! # Ok::<(), geoshard::GeoShardError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod error;
pub mod index;

#[cfg(feature = "snapshot")]
pub mod storage;

pub use builder::IndexBuilder;
pub use config::{Config, FailurePolicy};
pub use error::{GeoShardError, PartitionFailure, Result};
pub use index::{PartitionStats, PartitionedIndex, QueryOutcome};

pub use compute::merge::Neighbor;
pub use compute::spatial::{RStarTree, SpatialTree};

pub use geoshard_types::bbox::BoundingBox;
pub use geoshard_types::point::{Location, Point};

#[cfg(feature = "snapshot")]
pub use storage::{IndexEnvelope, SnapshotFile};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GeoShardError, IndexBuilder, PartitionedIndex, Result};

    pub use crate::{BoundingBox, Location, Neighbor, Point};

    pub use crate::{Config, FailurePolicy};
}
