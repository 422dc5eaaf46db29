//! [`Consistent`] is the thread-safe entry point of the ring.
//!
//! It owns a [`HashRing`] and the [`PartitionTable`] computed from it. A single [`RwLock`] guards both:
//! mutations (`add`/`remove`) hold the write lock for their whole duration, including the
//! redistribution pass, so readers never observe a partially rebuilt table.
//! The read-only surface lives in [`super::lookup`].
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{event, Level};

use crate::{
    config::Config,
    error::{Error, Result},
    hashing::HashFunction,
    member::Member,
};

use super::{
    assigner::{distribute, PartitionTable},
    ring::HashRing,
    PartitioningScheme,
};

/// Consistent hashing with bounded loads over a fixed number of partitions.
///
/// Keys are first mapped to one of `partition_count` partitions (`hash(key) % partition_count`), which never
/// changes. Partitions are then assigned to members such that no member owns more than
/// [`super::assigner::average_load`] partitions. Every membership change recomputes the whole assignment.
///
/// Cloning a [`Consistent`] is cheap and every clone shares the same state.
#[derive(Clone)]
pub struct Consistent<M> {
    pub(super) partition_count: usize,
    pub(super) load: f64,
    pub(super) hash_fn: Arc<dyn HashFunction>,
    pub(super) inner: Arc<RwLock<ConsistentInner<M>>>,
}

pub(super) struct ConsistentInner<M> {
    pub(super) ring: HashRing<M>,
    pub(super) table: PartitionTable,
}

impl<M> std::fmt::Debug for Consistent<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_read() {
            Ok(inner) => {
                write!(
                    f,
                    "Consistent: partition_count: {} load: {} {:?}",
                    self.partition_count, self.load, inner.ring
                )
            }
            Err(_) => {
                write!(f, "Unable to acquire lock for logging at this time...")
            }
        }
    }
}

impl<M: Member> Consistent<M> {
    /// Builds a ring with the given initial members. Partitions are distributed once, after all members are added.
    ///
    /// Fails if the config doesn't carry a hash function or if the initial members can't hold
    /// every partition under the configured load.
    pub fn new<I>(members: I, config: Config) -> Result<Self>
    where
        I: IntoIterator<Item = M>,
    {
        let (config, hash_fn) = config.validate()?;
        let mut ring = HashRing::new(config.replication_factor, hash_fn.clone());
        for member in members {
            ring.add(member);
        }
        let table = distribute(&ring, config.partition_count, config.load)?;
        event!(
            Level::INFO,
            "ring created with {} members and {} partitions",
            ring.len(),
            config.partition_count
        );

        Ok(Self {
            partition_count: config.partition_count,
            load: config.load,
            hash_fn,
            inner: Arc::new(RwLock::new(ConsistentInner { ring, table })),
        })
    }

    pub(super) fn acquire_read_lock(&self) -> Result<RwLockReadGuard<'_, ConsistentInner<M>>> {
        self.inner.read().map_err(|_| Error::Logic {
            reason: "Unable to acquire read lock".to_string(),
        })
    }

    fn acquire_write_lock(&self) -> Result<RwLockWriteGuard<'_, ConsistentInner<M>>> {
        self.inner.write().map_err(|_| Error::Logic {
            reason: "Unable to acquire write lock".to_string(),
        })
    }

    /// Adds a new member to the ring and redistributes all partitions.
    /// Adding a member whose name is already present is a no-op.
    ///
    /// If the new distribution is infeasible, the ring is left untouched and
    /// [`Error::InfeasibleDistribution`] is returned.
    pub fn add(&self, member: M) -> Result<()> {
        let mut guard = self.acquire_write_lock()?;
        if guard.ring.contains(member.name()) {
            event!(Level::DEBUG, "member {} already present", member.name());
            return Ok(());
        }

        let name = member.name().to_string();
        let mut ring = guard.ring.clone();
        ring.add(member);
        let table = distribute(&ring, self.partition_count, self.load)?;
        guard.ring = ring;
        guard.table = table;
        event!(
            Level::INFO,
            "member {} added, ring has {} members",
            name,
            guard.ring.len()
        );

        Ok(())
    }

    /// Removes a member from the ring and redistributes all partitions.
    /// Removing an unknown member is a no-op. Removing the last member clears the partition table.
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut guard = self.acquire_write_lock()?;
        if !guard.ring.contains(name) {
            event!(Level::DEBUG, "member {} not present", name);
            return Ok(());
        }

        let mut ring = guard.ring.clone();
        ring.remove(name);
        // an empty ring can't host any partition, distribute() returns an empty table
        let table = distribute(&ring, self.partition_count, self.load)?;
        guard.ring = ring;
        guard.table = table;
        event!(
            Level::INFO,
            "member {} removed, ring has {} members",
            name,
            guard.ring.len()
        );

        Ok(())
    }
}

impl<M: Member> PartitioningScheme<M> for Consistent<M> {
    fn add_node(&mut self, member: M) -> Result<()> {
        self.add(member)
    }

    fn remove_node(&mut self, name: &str) -> Result<()> {
        self.remove(name)
    }

    fn key_owner(&self, key: &[u8]) -> Result<Option<M>> {
        self.locate_key(key)
    }

    fn preference_list(&self, key: &[u8], list_size: usize) -> Result<Vec<M>> {
        self.get_closest_n(key, list_size)
    }
}
