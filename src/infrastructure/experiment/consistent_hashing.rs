//! Consistent hashing for experiment variant assignment
//!
//! Ensures the same visitor always lands on the same variant for a given
//! experiment, even when nothing has been persisted yet.

use crate::domain::experiment::VariantTag;

/// Multiplier of the polynomial rolling hash
const HASH_MULTIPLIER: i32 = 31;

/// Consistent hasher for experiment assignments
#[derive(Debug, Clone, Copy)]
pub struct ConsistentHasher;

impl ConsistentHasher {
    /// Stable 32-bit polynomial rolling hash of a string
    ///
    /// Accumulates `hash * 31 + unit` over the UTF-16 code units of the input
    /// with signed 32-bit wraparound, so browser-side implementations of the
    /// same hash agree with this one.
    pub fn hash_string(input: &str) -> i32 {
        input.encode_utf16().fold(0i32, |hash, unit| {
            hash.wrapping_mul(HASH_MULTIPLIER)
                .wrapping_add(i32::from(unit))
        })
    }

    /// Key hashed for a visitor and experiment
    pub fn assignment_key(visitor_id: &str, experiment: &str) -> String {
        format!("{}-{}", visitor_id, experiment)
    }

    /// Deterministic bucket in `0..buckets` for a visitor and experiment
    ///
    /// # Panics
    /// Panics if `buckets` is zero.
    pub fn bucket(visitor_id: &str, experiment: &str, buckets: usize) -> usize {
        let hash = Self::hash_string(&Self::assignment_key(visitor_id, experiment));
        hash.unsigned_abs() as usize % buckets
    }

    /// Pick a variant for a visitor by hashing
    ///
    /// Returns `None` only for an empty variant list.
    pub fn select<'a>(
        visitor_id: &str,
        experiment: &str,
        variants: &'a [VariantTag],
    ) -> Option<&'a VariantTag> {
        if variants.is_empty() {
            return None;
        }

        variants.get(Self::bucket(visitor_id, experiment, variants.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ab() -> Vec<VariantTag> {
        vec![VariantTag::new("A").unwrap(), VariantTag::new("B").unwrap()]
    }

    #[test]
    fn test_known_hash_values() {
        assert_eq!(ConsistentHasher::hash_string(""), 0);
        assert_eq!(ConsistentHasher::hash_string("a"), 97);
        assert_eq!(ConsistentHasher::hash_string("ab"), 97 * 31 + 98);
        assert_eq!(ConsistentHasher::hash_string("hello"), 99162322);
    }

    #[test]
    fn test_hash_wraps_around() {
        // 31-fold accumulation overflows i32 well before 20 characters
        let hash = ConsistentHasher::hash_string("a-rather-long-visitor-identifier-post-layout");

        let mut expected: i64 = 0;
        for unit in "a-rather-long-visitor-identifier-post-layout".encode_utf16() {
            expected = (expected * 31 + i64::from(unit)) as i32 as i64;
        }

        assert_eq!(i64::from(hash), expected);
    }

    #[test]
    fn test_hash_uses_utf16_units() {
        // U+1F600 is one char but two UTF-16 code units
        let expected = 0xD83D_i32.wrapping_mul(31).wrapping_add(0xDE00);
        assert_eq!(ConsistentHasher::hash_string("\u{1F600}"), expected);
    }

    #[test]
    fn test_consistent_bucket_same_input() {
        let bucket1 = ConsistentHasher::bucket("visitor-1", "exp-1", 3);
        let bucket2 = ConsistentHasher::bucket("visitor-1", "exp-1", 3);
        assert_eq!(bucket1, bucket2, "Same inputs should produce same bucket");
        assert!(bucket1 < 3);
    }

    #[test]
    fn test_select_matches_independent_recomputation() {
        let variants = ab();

        for i in 0..200 {
            let visitor = format!("visitor-{}", i);
            let selected = ConsistentHasher::select(&visitor, "signup-cta", &variants).unwrap();

            let key = format!("{}-{}", visitor, "signup-cta");
            let mut hash: i32 = 0;
            for unit in key.encode_utf16() {
                hash = hash.wrapping_mul(31).wrapping_add(unit as i32);
            }
            let index = (i64::from(hash).abs() % 2) as usize;

            assert_eq!(selected, &variants[index]);
        }
    }

    #[test]
    fn test_select_empty_variants() {
        assert!(ConsistentHasher::select("visitor-1", "exp-1", &[]).is_none());
    }

    #[test]
    fn test_50_50_split() {
        let variants = ab();
        let mut a_count = 0;
        let mut b_count = 0;

        for i in 0..2000 {
            let visitor = format!("00000000-0000-4000-8000-{:012}", i * 7919);
            let selected = ConsistentHasher::select(&visitor, "ab-test", &variants).unwrap();

            if selected == "A" {
                a_count += 1;
            } else {
                b_count += 1;
            }
        }

        let diff = (a_count as i32 - b_count as i32).abs();
        assert!(
            diff < 300,
            "Split is too uneven: a={}, b={}",
            a_count,
            b_count
        );
    }

    #[test]
    fn test_determinism_across_calls() {
        let visitor = "9b2f4c1e-8d7a-4e0b-a1c3-5f6e7d8c9b0a";
        let experiment = "pricing-experiment-v2";

        let first = ConsistentHasher::bucket(visitor, experiment, 4);

        for _ in 0..100 {
            assert_eq!(
                ConsistentHasher::bucket(visitor, experiment, 4),
                first,
                "Bucket should be deterministic"
            );
        }
    }
}
