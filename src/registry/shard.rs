//! Deterministic key → shard mapping.
//!
//! A routing key is hashed with a 31-multiplier rolling hash and reduced
//! modulo the shard count. The mapping is a pure function of the key bytes:
//! the same key always lands on the same shard for the registry's lifetime,
//! which is what makes per-shard locking correct (same key ⇒ same lock).

/// Returns the shard index for `key` given `shards` total shards.
///
/// `shards` must be non-zero; the registry clamps its configuration before
/// constructing shards.
pub(crate) fn shard_index(key: &str, shards: usize) -> usize {
    debug_assert!(shards > 0);
    (hash(key.as_bytes()) % shards as u64) as usize
}

/// Non-cryptographic rolling hash over the key bytes (`h = 31·h ⊕ b`).
fn hash(bytes: &[u8]) -> u64 {
    let mut h: i64 = 0;
    for &b in bytes {
        h = h.wrapping_mul(31) ^ i64::from(b);
    }
    h.unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_key_same_shard() {
        for key in ["ping", "ping.urgent", "", "a", "task.removed"] {
            assert_eq!(shard_index(key, 32), shard_index(key, 32));
        }
    }

    #[test]
    fn test_index_in_range() {
        for shards in [1, 2, 7, 32] {
            for key in ["ping", "pong", "tick.fast", "x"] {
                assert!(shard_index(key, shards) < shards);
            }
        }
    }

    #[test]
    fn test_single_shard_maps_everything_to_zero() {
        assert_eq!(shard_index("anything", 1), 0);
        assert_eq!(shard_index("", 1), 0);
    }

    #[test]
    fn test_keys_spread_over_shards() {
        // Not a distribution guarantee, just a sanity check that the hash is
        // not constant over realistic keys.
        let indices: std::collections::HashSet<usize> = (0..64)
            .map(|i| shard_index(&format!("kind-{i}"), 32))
            .collect();
        assert!(indices.len() > 1);
    }
}
