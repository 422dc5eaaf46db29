//! This module defines the errors that can be returned by the ring.

use std::fmt::Display;

use serde::Serialize;

pub type Result<T> = std::result::Result<T, Error>;

/// Error enum with all possible variants
#[derive(Debug, Serialize)]
pub enum Error {
    /// The provided [`crate::Config`] can't be used to build a ring (eg: no hash function)
    InvalidConfig { reason: String },
    /// The bounded placement probe walked the whole ring without finding a member with spare capacity.
    /// The operator has to increase the member count, the load factor or decrease the partition count.
    InfeasibleDistribution {
        partition_id: usize,
        members: usize,
        average_load: usize,
    },
    /// More replica owners were requested than there are members in the ring
    InsufficientMemberCount { requested: usize, available: usize },
    /// Partition ids are only valid in the range [0, partition_count)
    InvalidPartition {
        partition_id: usize,
        partition_count: usize,
    },
    Logic { reason: String },
    Io { reason: String },
}

impl Error {
    /// Returns true if this is an instance of a [`Error::InsufficientMemberCount`] variant
    pub fn is_insufficient_member_count(&self) -> bool {
        matches!(self, Error::InsufficientMemberCount { .. })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig {
            reason: err.to_string(),
        }
    }
}
