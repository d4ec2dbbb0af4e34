//! Index builder for flexible configuration
//!
//! This module provides a builder pattern for creating a partitioned index
//! with an explicit partition count, failure policy and an optional snapshot
//! to restore on startup.

use crate::config::{Config, FailurePolicy};
use crate::error::Result;
use crate::index::PartitionedIndex;
#[cfg(feature = "snapshot")]
use crate::storage::SnapshotFile;
#[cfg(feature = "snapshot")]
use log::debug;
#[cfg(feature = "snapshot")]
use std::path::PathBuf;

/// Builder for a [`PartitionedIndex`].
///
/// # Example
///
/// ```rust
/// use geoshard::{FailurePolicy, IndexBuilder};
///
/// let index = IndexBuilder::new()
///     .partitions(8)
///     .failure_policy(FailurePolicy::Strict)
///     .build()
///     .unwrap();
/// assert_eq!(index.partition_count(), 8);
/// ```
#[derive(Debug, Default)]
pub struct IndexBuilder {
    #[cfg(feature = "snapshot")]
    snapshot_path: Option<PathBuf>,
    config: Config,
}

impl IndexBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of longitude partitions. Zero means one per available CPU.
    pub fn partitions(mut self, partitions: usize) -> Self {
        self.config = self.config.with_partitions(partitions);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config = self.config.with_failure_policy(policy);
        self
    }

    /// k-NN over-fetch factor. Zero is rejected by [`build`](Self::build).
    pub fn knn_overfetch(mut self, factor: usize) -> Self {
        self.config = self.config.with_knn_overfetch(factor);
        self
    }

    /// Restore the index from this snapshot on build if the file exists.
    #[cfg(feature = "snapshot")]
    pub fn snapshot_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Build the index, loading the snapshot if one is configured and present.
    pub fn build(self) -> Result<PartitionedIndex> {
        let index = PartitionedIndex::with_config(self.config)?;

        #[cfg(feature = "snapshot")]
        if let Some(path) = self.snapshot_path {
            let snapshot = SnapshotFile::new(&path);
            if snapshot.has_data() {
                index.load_from_file(&path)?;
            } else {
                debug!("No snapshot at {}, starting empty", path.display());
            }
        }

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeoShardError;

    #[test]
    fn test_builder_default() {
        let index = IndexBuilder::new().build().unwrap();
        assert_eq!(index.partition_count(), Config::default_partitions());
        assert_eq!(index.config().failure_policy, FailurePolicy::BestEffort);
    }

    #[test]
    fn test_builder_with_config() {
        let config = Config::default()
            .with_partitions(5)
            .with_knn_overfetch(4);
        let index = IndexBuilder::new().config(config).build().unwrap();
        assert_eq!(index.partition_count(), 5);
        assert_eq!(index.config().knn_overfetch, 4);
    }

    #[test]
    fn test_builder_rejects_zero_overfetch() {
        let result = IndexBuilder::new().knn_overfetch(0).build();
        assert!(matches!(result, Err(GeoShardError::InvalidConfig(_))));
    }

    #[cfg(feature = "snapshot")]
    #[test]
    fn test_builder_missing_snapshot_starts_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let index = IndexBuilder::new()
            .partitions(2)
            .snapshot_path(dir.path().join("none.bin"))
            .build()
            .unwrap();
        assert!(index.is_empty());
    }
}
