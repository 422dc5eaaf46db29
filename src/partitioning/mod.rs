//! Module that contains the bounded-load consistent hashing scheme
use crate::error::Result;

pub mod assigner;
pub mod consistent_hashing;
pub mod lookup;
pub mod ring;

/// This trait defines a PartitioningScheme (ie: how should keys be split amongst cluster members)
///
/// For the 2 mutating operations: `add_node` and `remove_node`, data has to be moved between members.
/// This operation is called resharding and it is expensive. For this reason, the more stable the cluster
/// configuration is, the better.
pub trait PartitioningScheme<M> {
    /// adds a new member to the partition state
    fn add_node(&mut self, member: M) -> Result<()>;

    /// removes a member from the partition state
    fn remove_node(&mut self, name: &str) -> Result<()>;

    /// returns the owner of a given key or None if there are no members
    fn key_owner(&self, key: &[u8]) -> Result<Option<M>>;

    /// returns `list_size` distinct members that should hold a copy of the given key. The owner comes first.
    fn preference_list(&self, key: &[u8], list_size: usize) -> Result<Vec<M>>;
}
