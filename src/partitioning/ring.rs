//! The hash ring that holds every member's virtual nodes.
use std::{collections::HashMap, sync::Arc};

use tracing::{event, Level};

use crate::{hashing::HashFunction, member::Member};

/// HashRing keeps `replication_factor` virtual nodes per member on a circular hash space [0, 2^64).
///
/// Each virtual node is placed at `hash(name + replica_index)`. Two views of the ring are kept in sync:
///  - `ring` maps a virtual node hash to the name of the member that owns it
///  - `sorted_set` holds the same hashes sorted ascendingly (and without duplicates), so that the
///    first virtual node clockwise from any hash can be found via binary search.
///
/// Example with 2 members and a replication factor of 2, on a hash space that goes from 0 to 40:
/// Members:     ['A', 'B']
/// Virtual nodes: A0 -> 10, B0 -> 20, A1 -> 25, B1 -> 35
/// sorted_set:  [10, 20, 25, 35]
///
/// hash 12 -> first virtual node is B0 (20)
/// hash 37 -> no virtual node is bigger, so we wrap around to A0 (10)
///
/// More virtual nodes per member means less variance in how many partitions each member receives.
#[derive(Clone)]
pub struct HashRing<M> {
    replication_factor: usize,
    hash_fn: Arc<dyn HashFunction>,
    ring: HashMap<u64, String>,
    sorted_set: Vec<u64>,
    members: HashMap<String, M>,
}

impl<M> std::fmt::Debug for HashRing<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashRing")
            .field("replication_factor", &self.replication_factor)
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .field("virtual_nodes", &self.sorted_set.len())
            .finish()
    }
}

fn virtual_node_key(name: &str, replica: usize) -> Vec<u8> {
    format!("{}{}", name, replica).into_bytes()
}

impl<M: Member> HashRing<M> {
    pub fn new(replication_factor: usize, hash_fn: Arc<dyn HashFunction>) -> Self {
        Self {
            replication_factor,
            hash_fn,
            ring: HashMap::new(),
            sorted_set: Vec::new(),
            members: HashMap::new(),
        }
    }

    /// Inserts the member's virtual nodes on the ring.
    /// Returns false (and changes nothing) if a member with the same name is already present.
    pub fn add(&mut self, member: M) -> bool {
        let name = member.name().to_string();
        if self.members.contains_key(&name) {
            return false;
        }

        for replica in 0..self.replication_factor {
            let hash = self.hash_fn.sum64(&virtual_node_key(&name, replica));
            if let Some(previous) = self.ring.insert(hash, name.clone()) {
                // last writer wins. The previous owner just loses one of its virtual nodes
                event!(
                    Level::WARN,
                    "virtual node collision at {}: {} replaced {}",
                    hash,
                    name,
                    previous
                );
            }

            if let Err(index) = self.sorted_set.binary_search(&hash) {
                self.sorted_set.insert(index, hash);
            }
        }

        self.members.insert(name, member);
        true
    }

    /// Removes every virtual node of the given member.
    /// Returns the removed member or None if no member with that name exists.
    pub fn remove(&mut self, name: &str) -> Option<M> {
        let member = self.members.remove(name)?;

        for replica in 0..self.replication_factor {
            let hash = self.hash_fn.sum64(&virtual_node_key(name, replica));
            // a colliding member may have taken this virtual node over
            if self.ring.get(&hash).map(String::as_str) != Some(name) {
                continue;
            }

            self.ring.remove(&hash);
            if let Ok(index) = self.sorted_set.binary_search(&hash) {
                self.sorted_set.remove(index);
            }
        }

        Some(member)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = &M> {
        self.members.values()
    }

    pub fn member(&self, name: &str) -> Option<&M> {
        self.members.get(name)
    }

    /// All virtual node hashes, sorted ascendingly
    pub fn sorted_set(&self) -> &[u64] {
        &self.sorted_set
    }

    /// Name of the member that owns the virtual node at `hash`
    pub fn virtual_node_owner(&self, hash: u64) -> Option<&str> {
        self.ring.get(&hash).map(String::as_str)
    }

    /// Index (into [`Self::sorted_set`]) of the first virtual node whose hash is >= `hash`,
    /// wrapping around to 0. Must not be called on an empty ring.
    pub fn successor_index(&self, hash: u64) -> usize {
        self.sorted_set.partition_point(|elem| *elem < hash) % self.sorted_set.len()
    }

    pub fn hash_fn(&self) -> &dyn HashFunction {
        self.hash_fn.as_ref()
    }
}
