//! Anything that can own partitions.

/// A member of the ring is identified by a stable, unique name.
/// The name is used both to derive the member's virtual nodes and as the key of every
/// internal table, so it must not change while the member is part of the ring.
pub trait Member: Clone {
    fn name(&self) -> &str;
}

impl Member for String {
    fn name(&self) -> &str {
        self.as_str()
    }
}

impl Member for &str {
    fn name(&self) -> &str {
        self
    }
}
