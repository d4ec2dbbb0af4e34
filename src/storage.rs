//! Persistence for the partitioned index.
//!
//! The whole point set is written as one bincode-encoded envelope and read
//! back as a full rebuild. There is no incremental or partial persistence.

pub mod snapshot;

pub use snapshot::{IndexEnvelope, SnapshotFile};
