//! Hash functions used to place virtual nodes, partitions and members on the ring.
use murmur3::murmur3_x64_128;

/// A deterministic 64 bit hash function.
///
/// The ring never interprets the bytes it hashes, so the only requirement is that the
/// same input always produces the same output for as long as a ring instance lives.
pub trait HashFunction: Send + Sync {
    fn sum64(&self, data: &[u8]) -> u64;
}

impl<F> HashFunction for F
where
    F: Fn(&[u8]) -> u64 + Send + Sync,
{
    fn sum64(&self, data: &[u8]) -> u64 {
        self(data)
    }
}

/// Default hash function: the low 64 bits of murmur3 x64_128 (seed 0).
#[derive(Clone, Copy, Debug, Default)]
pub struct Murmur3;

impl HashFunction for Murmur3 {
    fn sum64(&self, mut data: &[u8]) -> u64 {
        // reading from an in-memory slice can't fail
        murmur3_x64_128(&mut data, 0).unwrap_or_default() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::{HashFunction, Murmur3};

    fn constant(_: &[u8]) -> u64 {
        42
    }

    #[test]
    fn test_murmur3_is_deterministic() {
        let hasher = Murmur3;
        assert_eq!(hasher.sum64(b"node1"), hasher.sum64(b"node1"));
        assert_ne!(hasher.sum64(b"node1"), hasher.sum64(b"node2"));
    }

    #[test]
    fn test_fn_pointer_is_a_hash_function() {
        let hasher: &dyn HashFunction = &constant;
        assert_eq!(hasher.sum64(b"anything"), 42);
    }
}
