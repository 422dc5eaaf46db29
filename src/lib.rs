pub mod config;
pub mod error;
pub mod hashing;
pub mod member;
pub mod partitioning;
pub mod telemetry;

pub use config::Config;
pub use error::{Error, Result};
pub use hashing::{HashFunction, Murmur3};
pub use member::Member;
pub use partitioning::{consistent_hashing::Consistent, PartitioningScheme};

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;
