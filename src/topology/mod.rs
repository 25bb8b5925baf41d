//! Pair enumeration for the measurement schedule
//!
//! The pair sequence is a pure function of the group size, so every
//! participant derives the identical schedule without communication and
//! can resolve its role each round locally.

use crate::types::{Pair, PairScheme};

/// Select the scheme for a group size.
///
/// Exhaustive all-pairs comparison scales quadratically; above `cutoff`
/// participants the benchmark anchors every pair at rank 0 instead, which
/// still characterizes typical point-to-point behavior at linear cost.
pub fn scheme_for(group_size: usize, cutoff: usize) -> PairScheme {
    if group_size > cutoff {
        PairScheme::Star
    } else {
        PairScheme::FullMesh
    }
}

/// Produce the ordered sequence of pairs to measure.
///
/// Star: exactly `N − 1` pairs `(0, k)` for `k` in `1..N`. Full mesh: all
/// `C(N,2)` pairs `(i, j)` with `i < j`, ascending `i` then ascending `j`.
pub fn enumerate_pairs(group_size: usize, cutoff: usize) -> Vec<Pair> {
    match scheme_for(group_size, cutoff) {
        PairScheme::Star => (1..group_size).map(|k| Pair::new(0, k)).collect(),
        PairScheme::FullMesh => {
            let mut pairs = Vec::with_capacity(group_size * (group_size.saturating_sub(1)) / 2);
            for i in 0..group_size {
                for j in (i + 1)..group_size {
                    pairs.push(Pair::new(i, j));
                }
            }
            pairs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::DEFAULT_STAR_CUTOFF;
    use crate::types::Role;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_full_mesh_order_for_four() {
        let pairs = enumerate_pairs(4, DEFAULT_STAR_CUTOFF);
        let expected = vec![
            Pair::new(0, 1),
            Pair::new(0, 2),
            Pair::new(0, 3),
            Pair::new(1, 2),
            Pair::new(1, 3),
            Pair::new(2, 3),
        ];
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_star_for_forty() {
        let pairs = enumerate_pairs(40, DEFAULT_STAR_CUTOFF);
        assert_eq!(pairs.len(), 39);
        for (k, pair) in pairs.iter().enumerate() {
            assert_eq!(*pair, Pair::new(0, k + 1));
            assert_eq!(Role::resolve(0, *pair), Role::Initiator);
        }
    }

    #[test]
    fn test_cutoff_boundary() {
        // 32 participants still get the full mesh; 33 switch to the star
        assert_eq!(scheme_for(32, 32), PairScheme::FullMesh);
        assert_eq!(scheme_for(33, 32), PairScheme::Star);
        assert_eq!(enumerate_pairs(32, 32).len(), 32 * 31 / 2);
        assert_eq!(enumerate_pairs(33, 32).len(), 32);
    }

    #[test]
    fn test_two_participants() {
        let pairs = enumerate_pairs(2, DEFAULT_STAR_CUTOFF);
        assert_eq!(pairs, vec![Pair::new(0, 1)]);
    }

    proptest! {
        #[test]
        fn prop_pair_counts_and_validity(n in 2usize..80) {
            let pairs = enumerate_pairs(n, DEFAULT_STAR_CUTOFF);

            let expected = if n > DEFAULT_STAR_CUTOFF {
                n - 1
            } else {
                n * (n - 1) / 2
            };
            prop_assert_eq!(pairs.len(), expected);

            let unique: HashSet<Pair> = pairs.iter().copied().collect();
            prop_assert_eq!(unique.len(), pairs.len());

            for pair in &pairs {
                prop_assert!(pair.is_valid(n));
                prop_assert!(pair.ping < pair.pong);
            }
        }

        #[test]
        fn prop_exactly_one_initiator_and_responder(n in 2usize..40) {
            for pair in enumerate_pairs(n, DEFAULT_STAR_CUTOFF) {
                let mut initiators = 0;
                let mut responders = 0;
                let mut bystanders = 0;
                for rank in 0..n {
                    match Role::resolve(rank, pair) {
                        Role::Initiator => initiators += 1,
                        Role::Responder => responders += 1,
                        Role::Bystander => bystanders += 1,
                    }
                }
                prop_assert_eq!(initiators, 1);
                prop_assert_eq!(responders, 1);
                prop_assert_eq!(bystanders, n - 2);
            }
        }
    }
}
