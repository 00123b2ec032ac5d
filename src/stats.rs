//! Structural statistics for a bucket subtree.
//!
//! A `Stats` value is owned by exactly one traversal frame while it grows and
//! is folded into its parent (or into a namespace / global total) once that
//! frame completes. Folding is associative and commutative on every counter,
//! and a zero-valued `Stats` is its identity, so totals do not depend on the
//! order in which subtrees finish.

use serde::{Deserialize, Serialize};

/// Aggregate counters for a subtree or namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub name: String,
    pub max_depth: u64,
    pub buckets: u64,
    pub keys: u64,
    pub total_key_size: u64,
    pub total_value_size: u64,
}

impl Stats {
    /// Empty counters carrying a display label.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Empty counters for a subtree rooted at `depth`.
    pub fn at_depth(depth: u64) -> Self {
        Self {
            max_depth: depth,
            ..Self::default()
        }
    }

    /// Count one terminal entry.
    pub fn record_key(&mut self, key_len: usize, value_len: usize) {
        self.keys += 1;
        self.total_key_size += key_len as u64;
        self.total_value_size += value_len as u64;
    }

    /// Count one nested bucket. Its contents arrive separately via `absorb`.
    pub fn record_bucket(&mut self) {
        self.buckets += 1;
    }

    /// Fold `other` into `self`. `self` keeps its name.
    pub fn absorb(&mut self, other: &Stats) {
        self.max_depth = self.max_depth.max(other.max_depth);
        self.buckets += other.buckets;
        self.keys += other.keys;
        self.total_key_size += other.total_key_size;
        self.total_value_size += other.total_value_size;
    }

    /// Pure form of [`Stats::absorb`]: `self` is the accumulator and names
    /// the result.
    pub fn merge(mut self, other: &Stats) -> Stats {
        self.absorb(other);
        self
    }

    /// Total entries visited (`buckets + keys`).
    pub fn entries(&self) -> u64 {
        self.buckets + self.keys
    }

    /// Counter equality, ignoring the label.
    pub fn same_counts(&self, other: &Stats) -> bool {
        self.max_depth == other.max_depth
            && self.buckets == other.buckets
            && self.keys == other.keys
            && self.total_key_size == other.total_key_size
            && self.total_value_size == other.total_value_size
    }

    pub fn is_zero(&self) -> bool {
        self.same_counts(&Stats::default())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn sample(name: &str, depth: u64, buckets: u64, keys: u64, ks: u64, vs: u64) -> Stats {
        Stats {
            name: name.to_string(),
            max_depth: depth,
            buckets,
            keys,
            total_key_size: ks,
            total_value_size: vs,
        }
    }

    fn arb_stats() -> impl Strategy<Value = Stats> {
        (
            0u64..64,
            0u64..1 << 20,
            0u64..1 << 20,
            0u64..1 << 30,
            0u64..1 << 30,
        )
            .prop_map(|(d, b, k, ks, vs)| sample("s", d, b, k, ks, vs))
    }

    #[test]
    fn test_record_key_counts_sizes() {
        let mut s = Stats::at_depth(1);
        s.record_key(2, 3);
        s.record_key(4, 0);
        s.record_key(1, 5);
        assert_eq!(s.keys, 3);
        assert_eq!(s.total_key_size, 7);
        assert_eq!(s.total_value_size, 8);
        assert_eq!(s.buckets, 0);
        assert_eq!(s.max_depth, 1);
    }

    #[test]
    fn test_merge_keeps_accumulator_name() {
        let a = sample("global-stats", 1, 1, 2, 3, 4);
        let b = sample("other", 3, 1, 1, 1, 1);
        let m = a.merge(&b);
        assert_eq!(m.name, "global-stats");
        assert_eq!(m.max_depth, 3);
        assert_eq!(m.buckets, 2);
        assert_eq!(m.keys, 3);
        assert_eq!(m.total_key_size, 4);
        assert_eq!(m.total_value_size, 5);
    }

    #[test]
    fn test_zero_detection() {
        assert!(Stats::named("x").is_zero());
        assert!(!Stats::at_depth(1).is_zero());
    }

    #[test]
    fn test_json_field_names() {
        let s = sample("bucket", 2, 1, 1, 5, 10);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(
            json,
            r#"{"name":"bucket","max_depth":2,"buckets":1,"keys":1,"total_key_size":5,"total_value_size":10}"#
        );
    }

    proptest! {
        #[test]
        fn merge_with_zero_is_identity(a in arb_stats()) {
            let merged = a.clone().merge(&Stats::default());
            prop_assert_eq!(merged, a);
        }

        #[test]
        fn merge_is_commutative(a in arb_stats(), b in arb_stats()) {
            let ab = a.clone().merge(&b);
            let ba = b.clone().merge(&a);
            prop_assert!(ab.same_counts(&ba));
        }

        #[test]
        fn merge_is_associative(a in arb_stats(), b in arb_stats(), c in arb_stats()) {
            let left = a.clone().merge(&b).merge(&c);
            let right = a.clone().merge(&b.clone().merge(&c));
            prop_assert_eq!(left, right);
        }

        #[test]
        fn merge_order_does_not_change_totals(parts in prop::collection::vec(arb_stats(), 0..12)) {
            let forward = parts
                .iter()
                .fold(Stats::named("global"), |acc, s| acc.merge(s));
            let backward = parts
                .iter()
                .rev()
                .fold(Stats::named("global"), |acc, s| acc.merge(s));
            prop_assert_eq!(forward, backward);
        }
    }
}
