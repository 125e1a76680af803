//! Stable, non-cryptographic name hashing.
//!
//! Asset identifiers are derived from file names with 64-bit FNV-1a, so the
//! value must not depend on the process, platform or hasher seed.

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// 64-bit FNV-1a hash of `bytes`.
pub const fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// 64-bit FNV-1a hash of a string's UTF-8 bytes.
pub const fn fnv1a_64_str(s: &str) -> u64 {
    fnv1a_64(s.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_offset_basis() {
        assert_eq!(fnv1a_64(&[]), FNV_OFFSET_BASIS);
    }

    #[test]
    fn test_known_vectors() {
        // Reference values from the FNV test suite.
        assert_eq!(fnv1a_64_str("a"), 0xaf63dc4c8601ec8c);
        assert_eq!(fnv1a_64_str("foobar"), 0x85944171f73967e8);
    }

    #[test]
    fn test_usable_in_const_context() {
        const TILE: u64 = fnv1a_64_str("tile_0000.png");
        assert_eq!(TILE, fnv1a_64_str("tile_0000.png"));
        assert_ne!(TILE, fnv1a_64_str("tile_0001.png"));
    }
}
