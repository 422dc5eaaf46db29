//! Ring configuration.
//!
//! [`Config`] is what [`crate::Consistent`] is built from. [`RingConfig`] is its on-disk (json) counterpart,
//! used by the `ring-inspect` binary.
use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    hashing::{HashFunction, Murmur3},
};

/// Prime numbers are good at spreading keys uniformly across partitions.
pub const DEFAULT_PARTITION_COUNT: usize = 271;
pub const DEFAULT_REPLICATION_FACTOR: usize = 20;
pub const DEFAULT_LOAD: f64 = 1.25;

/// Configuration used to construct a [`crate::Consistent`]. It can't be changed after construction.
///
/// Zero values for `partition_count`, `replication_factor` and `load` are replaced by their defaults
/// when the ring is built. `hash_fn` has no default and is mandatory.
#[derive(Clone)]
pub struct Config {
    pub hash_fn: Option<Arc<dyn HashFunction>>,
    /// How many partitions keys are split into
    pub partition_count: usize,
    /// How many virtual nodes each member gets on the ring
    pub replication_factor: usize,
    /// Multiplier applied to the uniform average load to compute each member's capacity
    pub load: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hash_fn: None,
            partition_count: DEFAULT_PARTITION_COUNT,
            replication_factor: DEFAULT_REPLICATION_FACTOR,
            load: DEFAULT_LOAD,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("hash_fn", &self.hash_fn.as_ref().map(|_| "<hash function>"))
            .field("partition_count", &self.partition_count)
            .field("replication_factor", &self.replication_factor)
            .field("load", &self.load)
            .finish()
    }
}

impl Config {
    pub fn with_hash_fn<H: HashFunction + 'static>(mut self, hash_fn: H) -> Self {
        self.hash_fn = Some(Arc::new(hash_fn));
        self
    }

    pub fn with_partition_count(mut self, partition_count: usize) -> Self {
        self.partition_count = partition_count;
        self
    }

    pub fn with_replication_factor(mut self, replication_factor: usize) -> Self {
        self.replication_factor = replication_factor;
        self
    }

    pub fn with_load(mut self, load: f64) -> Self {
        self.load = load;
        self
    }

    /// Fills in defaults and validates the configuration.
    /// Returns the hash function separately since it is mandatory from here on.
    pub(crate) fn validate(mut self) -> Result<(Self, Arc<dyn HashFunction>)> {
        let hash_fn = self.hash_fn.clone().ok_or(Error::InvalidConfig {
            reason: "a hash function is required to build a ring".to_string(),
        })?;

        if self.partition_count == 0 {
            self.partition_count = DEFAULT_PARTITION_COUNT;
        }
        if self.replication_factor == 0 {
            self.replication_factor = DEFAULT_REPLICATION_FACTOR;
        }
        if self.load == 0.0 {
            self.load = DEFAULT_LOAD;
        }
        if !self.load.is_finite() || self.load < 0.0 {
            return Err(Error::InvalidConfig {
                reason: format!("load must be a positive number, got {}", self.load),
            });
        }

        Ok((self, hash_fn))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashFunctionKind {
    #[default]
    Murmur3,
}

/// On-disk ring configuration
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RingConfig {
    #[serde(default = "default_partition_count")]
    pub partition_count: usize,
    #[serde(default = "default_replication_factor")]
    pub replication_factor: usize,
    #[serde(default = "default_load")]
    pub load: f64,
    #[serde(default)]
    pub hash_function: HashFunctionKind,
    #[serde(default)]
    pub members: Vec<String>,
}

fn default_partition_count() -> usize {
    DEFAULT_PARTITION_COUNT
}

fn default_replication_factor() -> usize {
    DEFAULT_REPLICATION_FACTOR
}

fn default_load() -> f64 {
    DEFAULT_LOAD
}

impl RingConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let stringified_json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&stringified_json)?)
    }

    /// Splits the file configuration into the in-process [`Config`] and the initial member list
    pub fn into_parts(self) -> (Config, Vec<String>) {
        let config = Config::default()
            .with_partition_count(self.partition_count)
            .with_replication_factor(self.replication_factor)
            .with_load(self.load);
        let config = match self.hash_function {
            HashFunctionKind::Murmur3 => config.with_hash_fn(Murmur3),
        };

        (config, self.members)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{Config, HashFunctionKind, RingConfig};
    use crate::{error::Error, hashing::Murmur3};

    #[test]
    fn deserialize_ring_config() {
        let mut ring_config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        ring_config_path.push("conf/ring.json");

        let config = RingConfig::from_path(ring_config_path).unwrap();

        assert!(matches!(
            config,
            RingConfig {
                partition_count: 23,
                replication_factor: 20,
                hash_function: HashFunctionKind::Murmur3,
                ..
            }
        ));
        assert_eq!(config.load, 1.25);
        assert_eq!(config.members, vec!["node1", "node2", "node3"]);
    }

    #[test]
    fn deserialize_applies_defaults() {
        let config: RingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.partition_count, 271);
        assert_eq!(config.replication_factor, 20);
        assert_eq!(config.load, 1.25);
        assert_eq!(config.hash_function, HashFunctionKind::Murmur3);
        assert!(config.members.is_empty());
    }

    #[test]
    fn test_missing_config_file() {
        let err = RingConfig::from_path("conf/does_not_exist.json").unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_validate_requires_hash_fn() {
        let err = Config::default().validate().err().unwrap();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[test]
    fn test_validate_fills_defaults() {
        let (config, _) = Config {
            partition_count: 0,
            replication_factor: 0,
            load: 0.0,
            ..Default::default()
        }
        .with_hash_fn(Murmur3)
        .validate()
        .unwrap();

        assert_eq!(config.partition_count, 271);
        assert_eq!(config.replication_factor, 20);
        assert_eq!(config.load, 1.25);
    }

    #[test]
    fn test_validate_rejects_negative_load() {
        let err = Config::default()
            .with_hash_fn(Murmur3)
            .with_load(-1.0)
            .validate()
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }
}
