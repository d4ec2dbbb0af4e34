//! Error types for geoshard.

use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeoShardError>;

/// A single partition task that failed during a fan-out query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionFailure {
    pub partition: usize,
    pub reason: String,
}

impl fmt::Display for PartitionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "partition {}: {}", self.partition, self.reason)
    }
}

#[derive(Debug, Error)]
pub enum GeoShardError {
    /// Malformed query or construction parameters (inverted box, bad radius, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding of a persisted envelope failed
    #[error("codec error: {0}")]
    Codec(String),

    /// One or more partitions failed while answering a query
    #[error("{failed} of {total} partitions failed: {}", format_failures(.failures))]
    PartialQuery {
        failed: usize,
        total: usize,
        failures: Vec<PartitionFailure>,
    },

    /// Failure raised by a spatial tree implementation
    #[error("spatial tree error: {0}")]
    Tree(String),
}

fn format_failures(failures: &[PartitionFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(feature = "snapshot")]
impl From<bincode::Error> for GeoShardError {
    fn from(err: bincode::Error) -> Self {
        GeoShardError::Codec(err.to_string())
    }
}
