//! Read-only queries over the latest partition table.
//!
//! All of these (except [`Consistent::find_partition_id`], which is a pure function of the key) take the
//! shared read lock, so they can run concurrently with each other but never observe a mutation halfway.
use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    hashing::HashFunction,
    member::Member,
};

use super::{assigner::average_load, consistent_hashing::Consistent, ring::HashRing};

impl<M: Member> Consistent<M> {
    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    /// Maps a key to its partition: `hash(key) % partition_count`.
    /// This doesn't depend on the current members.
    pub fn find_partition_id(&self, key: &[u8]) -> usize {
        (self.hash_fn.sum64(key) % self.partition_count as u64) as usize
    }

    /// Returns the member that owns `partition_id` or None if the ring has no members
    pub fn get_partition_owner(&self, partition_id: usize) -> Result<Option<M>> {
        self.check_partition_id(partition_id)?;
        let guard = self.acquire_read_lock()?;
        Ok(guard
            .table
            .owner(partition_id)
            .and_then(|name| guard.ring.member(name))
            .cloned())
    }

    /// Returns the member that owns the partition `key` belongs to or None if the ring has no members
    pub fn locate_key(&self, key: &[u8]) -> Result<Option<M>> {
        self.get_partition_owner(self.find_partition_id(key))
    }

    /// Returns `count` distinct members that should hold copies of `key`. See [`Self::get_closest_n_for_partition`].
    pub fn get_closest_n(&self, key: &[u8], count: usize) -> Result<Vec<M>> {
        self.get_closest_n_for_partition(self.find_partition_id(key), count)
    }

    /// Returns `count` distinct members "closest" to the owner of `partition_id`, used to pick replica holders.
    ///
    /// **The owner itself is part of the result, always in the first position**, so asking for 3 members
    /// returns the owner plus 2 replicas.
    ///
    /// Closeness is computed on a different ordering than the one used to assign partitions: every member
    /// *name* (not its virtual nodes) is hashed and sorted, and members are collected walking clockwise from
    /// the owner. This keeps replica placement decorrelated from primary placement.
    ///
    /// Returns [`Error::InsufficientMemberCount`] if `count` is bigger than the number of members.
    pub fn get_closest_n_for_partition(&self, partition_id: usize, count: usize) -> Result<Vec<M>> {
        self.check_partition_id(partition_id)?;
        let guard = self.acquire_read_lock()?;
        if count > guard.ring.len() {
            return Err(Error::InsufficientMemberCount {
                requested: count,
                available: guard.ring.len(),
            });
        }

        match guard.table.owner(partition_id) {
            Some(owner) => closest_n(&guard.ring, owner, count),
            None => Ok(Vec::new()),
        }
    }

    /// A copy of the current members, in no particular order
    pub fn members(&self) -> Result<Vec<M>> {
        let guard = self.acquire_read_lock()?;
        Ok(guard.ring.members().cloned().collect())
    }

    pub fn member_count(&self) -> Result<usize> {
        Ok(self.acquire_read_lock()?.ring.len())
    }

    /// A copy of how many partitions each member owns. Empty if there are no members.
    pub fn load_distribution(&self) -> Result<HashMap<String, usize>> {
        Ok(self.acquire_read_lock()?.table.loads().clone())
    }

    /// Maximum number of partitions a member can own with the current member count. 0 if there are no members.
    pub fn average_load(&self) -> Result<usize> {
        let member_count = self.member_count()?;
        Ok(average_load(self.partition_count, member_count, self.load))
    }

    fn check_partition_id(&self, partition_id: usize) -> Result<()> {
        if partition_id >= self.partition_count {
            return Err(Error::InvalidPartition {
                partition_id,
                partition_count: self.partition_count,
            });
        }

        Ok(())
    }
}

/// Walks the members sorted by `hash(name)`, starting at `owner`, and collects `count` of them.
/// `count` must not be bigger than the number of members.
fn closest_n<M: Member>(ring: &HashRing<M>, owner: &str, count: usize) -> Result<Vec<M>> {
    let hash_fn: &dyn HashFunction = ring.hash_fn();
    let mut hashed_members: Vec<(u64, &M)> = ring
        .members()
        .map(|member| (hash_fn.sum64(member.name().as_bytes()), member))
        .collect();
    // ties on the hash are broken by name so that every member shows up exactly once
    hashed_members.sort_by(|(lhs_hash, lhs), (rhs_hash, rhs)| {
        lhs_hash
            .cmp(rhs_hash)
            .then_with(|| lhs.name().cmp(rhs.name()))
    });

    let owner_index = hashed_members
        .iter()
        .position(|(_, member)| member.name() == owner)
        .ok_or(Error::Logic {
            reason: format!("partition owner {} is not a member of the ring", owner),
        })?;

    Ok(hashed_members
        .iter()
        .cycle()
        .skip(owner_index)
        .take(count)
        .map(|(_, member)| (*member).clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::closest_n;
    use crate::{
        config::Config, error::Error, partitioning::consistent_hashing::Consistent,
        partitioning::ring::HashRing,
    };
    use std::{collections::HashMap, sync::Arc};

    fn test_hash_fn(key: &[u8]) -> u64 {
        // member names sit on a small circle, everything else is spread through the hash space
        let table: HashMap<&[u8], u64> = vec![
            (&b"Node A"[..], 10u64),
            (&b"Node B"[..], 20u64),
            (&b"Node C"[..], 30u64),
            (&b"Node D"[..], 40u64),
        ]
        .into_iter()
        .collect();

        match table.get(key) {
            Some(hash) => *hash,
            None => key
                .iter()
                .fold(0xcbf29ce484222325u64, |hash, byte| {
                    hash.wrapping_mul(0x100000001b3) ^ *byte as u64
                }),
        }
    }

    fn test_ring() -> HashRing<String> {
        let mut ring = HashRing::new(20, Arc::new(test_hash_fn));
        for name in ["Node C", "Node A", "Node D", "Node B"] {
            ring.add(name.to_string());
        }
        ring
    }

    #[test]
    fn test_closest_n_starts_at_owner() {
        let ring = test_ring();
        assert_eq!(closest_n(&ring, "Node B", 1).unwrap(), vec!["Node B"]);
        assert_eq!(
            closest_n(&ring, "Node B", 3).unwrap(),
            vec!["Node B", "Node C", "Node D"]
        );
    }

    #[test]
    fn test_closest_n_wraps_around() {
        let ring = test_ring();
        assert_eq!(
            closest_n(&ring, "Node D", 4).unwrap(),
            vec!["Node D", "Node A", "Node B", "Node C"]
        );
    }

    #[test]
    fn test_closest_n_zero() {
        let ring = test_ring();
        assert!(closest_n(&ring, "Node A", 0).unwrap().is_empty());
    }

    #[test]
    fn test_closest_n_unknown_owner() {
        let ring = test_ring();
        assert!(matches!(
            closest_n(&ring, "Node E", 2).unwrap_err(),
            Error::Logic { .. }
        ));
    }

    fn test_consistent(members: Vec<&str>) -> Consistent<String> {
        let config = Config::default()
            .with_hash_fn(test_hash_fn)
            .with_partition_count(23);
        Consistent::new(members.into_iter().map(String::from), config).unwrap()
    }

    #[test]
    fn test_find_partition_id_ignores_members() {
        let empty = test_consistent(vec![]);
        let full = test_consistent(vec!["Node A", "Node B"]);
        for key in ["foo", "bar", "zoo"] {
            let partition_id = empty.find_partition_id(key.as_bytes());
            assert!(partition_id < 23);
            assert_eq!(partition_id, full.find_partition_id(key.as_bytes()));
        }
    }

    #[test]
    fn test_locate_key_matches_partition_owner() {
        let ring = test_consistent(vec!["Node A", "Node B", "Node C"]);
        for key in ["foo", "bar", "zoo"] {
            let partition_id = ring.find_partition_id(key.as_bytes());
            assert_eq!(
                ring.locate_key(key.as_bytes()).unwrap(),
                ring.get_partition_owner(partition_id).unwrap()
            );
            assert!(ring.locate_key(key.as_bytes()).unwrap().is_some());
        }
    }

    #[test]
    fn test_invalid_partition_id() {
        let ring = test_consistent(vec!["Node A"]);
        assert!(matches!(
            ring.get_partition_owner(23).unwrap_err(),
            Error::InvalidPartition {
                partition_id: 23,
                partition_count: 23
            }
        ));
        assert!(matches!(
            ring.get_closest_n_for_partition(100, 1).unwrap_err(),
            Error::InvalidPartition { .. }
        ));
    }

    #[test]
    fn test_closest_n_for_partition() {
        let ring = test_consistent(vec!["Node A", "Node B", "Node C", "Node D"]);
        for partition_id in 0..23 {
            let owner = ring.get_partition_owner(partition_id).unwrap().unwrap();
            let closest = ring.get_closest_n_for_partition(partition_id, 2).unwrap();
            assert_eq!(closest.len(), 2);
            assert_eq!(closest[0], owner);
            assert_ne!(closest[0], closest[1]);
        }
    }

    #[test]
    fn test_insufficient_member_count() {
        let ring = test_consistent(vec!["Node A", "Node B"]);
        let err = ring.get_closest_n(b"foo", 3).unwrap_err();
        assert!(err.is_insufficient_member_count());
        assert!(matches!(
            err,
            Error::InsufficientMemberCount {
                requested: 3,
                available: 2
            }
        ));

        let empty = test_consistent(vec![]);
        assert!(empty.get_closest_n(b"foo", 1).unwrap_err().is_insufficient_member_count());
        assert!(empty.get_closest_n(b"foo", 0).unwrap().is_empty());
    }

    #[test]
    fn test_average_load() {
        let ring = test_consistent(vec!["Node A", "Node B", "Node C"]);
        assert_eq!(ring.average_load().unwrap(), 10);
        ring.remove("Node B").unwrap();
        assert_eq!(ring.average_load().unwrap(), 15);
    }
}
