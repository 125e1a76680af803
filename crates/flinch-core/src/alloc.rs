//! Optimized collection types for Flinch.
//!
//! Every keyed registry in the workspace goes through these aliases so the
//! hasher can be swapped in one place.

// Re-export optimized hash collections
pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_ahash() {
        let mut map = HashMap::new();
        map.insert(7u64, "seven");
        assert_eq!(map.get(&7), Some(&"seven"));
        assert_eq!(map.get(&8), None);
    }

    #[test]
    fn test_hashset_ahash() {
        let mut set = HashSet::new();
        assert!(set.insert(42u64));
        assert!(!set.insert(42u64));
        assert!(set.contains(&42));
    }
}
