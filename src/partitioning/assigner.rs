//! Bounded-load assignment of partitions to ring members.
//!
//! Classic consistent hashing sends all of a removed member's load to its immediate successor on the ring,
//! which can overload that successor. Here every partition still goes to the nearest virtual node clockwise
//! from its hash, but members that already reached their capacity ([`average_load`]) are skipped. The displaced
//! load is therefore spread across the ring while ownership stays as local as possible.
//! (see <https://research.googleblog.com/2017/04/consistent-hashing-with-bounded-loads.html>)
//!
//! The partition table is always rebuilt from scratch. The load bound only holds because every member's
//! load is recomputed from zero on each pass, so this must not be turned into an incremental update.
use std::collections::HashMap;

use tracing::{event, Level};

use crate::{
    error::{Error, Result},
    member::Member,
};

use super::ring::HashRing;

/// Owner of every partition plus how many partitions each member owns.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartitionTable {
    // index is the partition id
    partitions: Vec<String>,
    loads: HashMap<String, usize>,
}

impl PartitionTable {
    /// Name of the member that owns `partition_id`
    pub fn owner(&self, partition_id: usize) -> Option<&str> {
        self.partitions.get(partition_id).map(String::as_str)
    }

    pub fn loads(&self) -> &HashMap<String, usize> {
        &self.loads
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

/// Maximum number of partitions a single member may own: `ceil(ceil(partition_count / member_count) * load)`.
/// Returns 0 if there are no members.
pub fn average_load(partition_count: usize, member_count: usize, load: f64) -> usize {
    if member_count == 0 {
        return 0;
    }

    let uniform = partition_count.div_ceil(member_count);
    (uniform as f64 * load).ceil() as usize
}

/// Hash used to place a partition on the ring: the partition id encoded as a little endian u64
fn partition_key<M: Member>(ring: &HashRing<M>, partition_id: usize) -> u64 {
    ring.hash_fn().sum64(&(partition_id as u64).to_le_bytes())
}

/// Computes the owner of each one of the `partition_count` partitions.
///
/// Partitions are placed in increasing id order. For each partition, the ring is walked clockwise starting
/// at the first virtual node whose hash is >= the partition hash. The partition goes to the first member found
/// that still has room under [`average_load`]. If a full lap around the ring doesn't find any room,
/// [`Error::InfeasibleDistribution`] is returned.
///
/// An empty ring produces an empty table.
pub fn distribute<M: Member>(
    ring: &HashRing<M>,
    partition_count: usize,
    load: f64,
) -> Result<PartitionTable> {
    if ring.is_empty() {
        return Ok(PartitionTable::default());
    }

    let avg_load = average_load(partition_count, ring.len(), load);
    let sorted_set = ring.sorted_set();
    event!(
        Level::DEBUG,
        "distributing {} partitions across {} members ({} virtual nodes, average load {})",
        partition_count,
        ring.len(),
        sorted_set.len(),
        avg_load
    );

    let mut partitions = Vec::with_capacity(partition_count);
    let mut loads: HashMap<String, usize> = ring
        .members()
        .map(|member| (member.name().to_string(), 0))
        .collect();

    for partition_id in 0..partition_count {
        let mut index = ring.successor_index(partition_key(ring, partition_id));
        let mut owner = None;
        for _ in 0..sorted_set.len() {
            let name = ring
                .virtual_node_owner(sorted_set[index])
                .ok_or(Error::Logic {
                    reason: "virtual node without owner. This should never happen.".to_string(),
                })?;
            let member_load = loads.get_mut(name).ok_or(Error::Logic {
                reason: format!("member {} owns a virtual node but has no load entry", name),
            })?;
            if *member_load < avg_load {
                *member_load += 1;
                owner = Some(name);
                break;
            }

            index = (index + 1) % sorted_set.len();
        }

        match owner {
            Some(name) => partitions.push(name.to_string()),
            None => {
                event!(
                    Level::ERROR,
                    "not enough room to place partition {}. Decrease the partition count, add members or increase the load factor",
                    partition_id
                );
                return Err(Error::InfeasibleDistribution {
                    partition_id,
                    members: ring.len(),
                    average_load: avg_load,
                });
            }
        }
    }

    Ok(PartitionTable { partitions, loads })
}
