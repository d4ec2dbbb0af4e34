//! Index configuration.
//!
//! This module provides a small, serializable configuration for the
//! partitioned index that can be loaded from JSON or (with the `toml` feature)
//! TOML.
use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// What a query does when some of its partition tasks fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Return whatever the healthy partitions produced and log the failures
    #[default]
    BestEffort,
    /// Fail the whole query if any partition failed
    Strict,
}

/// Partitioned index configuration
///
/// # Example
///
/// ```rust
/// use geoshard::{Config, FailurePolicy};
///
/// let config = Config::default();
/// assert_eq!(config.knn_overfetch, 2);
///
/// let json = r#"{
///     "partitions": 8,
///     "failure_policy": "strict"
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.partition_count(), 8);
/// assert_eq!(config.failure_policy, FailurePolicy::Strict);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of longitude partitions (None means host parallelism)
    #[serde(default)]
    pub partitions: Option<usize>,

    /// Local candidates requested per partition for k-NN, as a multiple of k
    #[serde(default = "Config::default_knn_overfetch")]
    pub knn_overfetch: usize,

    /// Handling of per-partition query failures
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Config {
    const fn default_knn_overfetch() -> usize {
        2
    }

    /// Partition count used when none is configured.
    pub fn default_partitions() -> usize {
        std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1)
    }

    /// Set an explicit partition count. Zero falls back to host parallelism.
    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = (partitions > 0).then_some(partitions);
        self
    }

    /// Candidates fetched per partition, as a multiple of `k`. Zero is
    /// rejected by [`validate`](Self::validate).
    pub fn with_knn_overfetch(mut self, factor: usize) -> Self {
        self.knn_overfetch = factor;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// The effective partition count.
    pub fn partition_count(&self) -> usize {
        self.partitions.unwrap_or_else(Self::default_partitions)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.partitions == Some(0) {
            return Err("Partition count must be greater than zero".to_string());
        }

        if self.knn_overfetch == 0 {
            return Err("k-NN over-fetch factor must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            partitions: None,
            knn_overfetch: Self::default_knn_overfetch(),
            failure_policy: FailurePolicy::default(),
        }
    }
}
