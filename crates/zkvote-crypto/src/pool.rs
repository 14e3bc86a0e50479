//! # Privacy Pool Accumulator (Merkle Mountain Range)
//!
//! Each ballot's privacy pool is an append-only Merkle Mountain Range over
//! the digests of confirmed vote commitments. Appending a commitment moves
//! the root; nothing else does. An [`InclusionWitness`] proves that a given
//! commitment is a member of the pool at a given root without revealing any
//! other member.
//!
//! ## Algorithm
//!
//! Domain-separated SHA-256:
//! - Leaf: `SHA256(0x00 || commitment_digest)`.
//! - Node: `SHA256(0x01 || left || right)`.
//!
//! Peaks are perfect binary trees of strictly decreasing height, left to
//! right. The root bags them right to left:
//! `bag = peaks[n-1]; for p in peaks[..n-1].rev(): bag = node(p, bag)`.
//! The empty pool has the all-zero root.
//!
//! ## Security Invariant
//!
//! Verification recomputes the peak layout from the claimed pool size, so a
//! witness cannot relocate a leaf into a different peak or pad its path.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zkvote_core::{ContentDigest, Sha256Accumulator};

/// Merkle root of a ballot's privacy pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolRoot(pub ContentDigest);

impl PoolRoot {
    /// Root of a pool with no confirmed commitments.
    pub const EMPTY: PoolRoot = PoolRoot(ContentDigest::ZERO);

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl std::fmt::Display for PoolRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("leaf index {index} out of range for pool of size {size}")]
    LeafOutOfRange { index: u64, size: u64 },
}

/// Which side of the running hash a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// One level of a path from a leaf up to its peak.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub side: Side,
    pub sibling: ContentDigest,
}

/// Proof that a commitment is a leaf of a pool of `pool_size` leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionWitness {
    pub pool_size: u64,
    pub leaf_index: u64,
    pub peak_index: usize,
    pub path: Vec<PathStep>,
    /// Every peak of the pool, left to right.
    pub peaks: Vec<ContentDigest>,
}

fn leaf_hash(commitment: &ContentDigest) -> ContentDigest {
    let mut acc = Sha256Accumulator::new();
    acc.update(&[0x00]);
    acc.update(commitment.as_bytes());
    acc.finalize()
}

fn node_hash(left: &ContentDigest, right: &ContentDigest) -> ContentDigest {
    let mut acc = Sha256Accumulator::new();
    acc.update(&[0x01]);
    acc.update(left.as_bytes());
    acc.update(right.as_bytes());
    acc.finalize()
}

fn bag_peaks(peaks: &[ContentDigest]) -> PoolRoot {
    let Some((last, rest)) = peaks.split_last() else {
        return PoolRoot::EMPTY;
    };
    let bag = rest
        .iter()
        .rev()
        .fold(*last, |bag, peak| node_hash(peak, &bag));
    PoolRoot(bag)
}

/// Peak heights, left to right, for a pool of `size` leaves.
fn peak_plan(size: u64) -> Vec<u32> {
    let mut out = Vec::new();
    let mut n = size;
    while n > 0 {
        let h = u64::BITS - n.leading_zeros() - 1;
        out.push(h);
        n -= 1u64 << h;
    }
    out
}

/// `(peak_index, first_leaf_of_peak, peak_height)` for `leaf_index`.
fn locate(size: u64, leaf_index: u64) -> Option<(usize, u64, u32)> {
    if leaf_index >= size {
        return None;
    }
    let mut start = 0u64;
    for (i, h) in peak_plan(size).into_iter().enumerate() {
        let count = 1u64 << h;
        if leaf_index < start + count {
            return Some((i, start, h));
        }
        start += count;
    }
    None
}

/// Append-only accumulator of confirmed commitment digests.
#[derive(Debug, Clone, Default)]
pub struct PoolAccumulator {
    leaf_hashes: Vec<ContentDigest>,
    peaks: Vec<(u32, ContentDigest)>,
}

impl PoolAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u64 {
        self.leaf_hashes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.leaf_hashes.is_empty()
    }

    pub fn root(&self) -> PoolRoot {
        let peaks: Vec<ContentDigest> = self.peaks.iter().map(|(_, d)| *d).collect();
        bag_peaks(&peaks)
    }

    /// Append a commitment digest. Returns its leaf index.
    pub fn append(&mut self, commitment: &ContentDigest) -> u64 {
        let leaf = leaf_hash(commitment);
        let index = self.len();
        self.leaf_hashes.push(leaf);

        let mut height = 0u32;
        let mut cur = leaf;
        while let Some(&(top_height, left)) = self.peaks.last() {
            if top_height != height {
                break;
            }
            self.peaks.pop();
            cur = node_hash(&left, &cur);
            height += 1;
        }
        self.peaks.push((height, cur));
        index
    }

    /// Inclusion witness for `leaf_index` against the current root.
    pub fn witness(&self, leaf_index: u64) -> Result<InclusionWitness, PoolError> {
        let size = self.len();
        let (peak_index, start, height) =
            locate(size, leaf_index).ok_or(PoolError::LeafOutOfRange {
                index: leaf_index,
                size,
            })?;

        let first = start as usize;
        let mut level: Vec<ContentDigest> =
            self.leaf_hashes[first..first + (1usize << height)].to_vec();
        let mut pos = (leaf_index - start) as usize;
        let mut path = Vec::with_capacity(height as usize);

        while level.len() > 1 {
            let sibling_pos = pos ^ 1;
            let side = if sibling_pos < pos {
                Side::Left
            } else {
                Side::Right
            };
            path.push(PathStep {
                side,
                sibling: level[sibling_pos],
            });
            level = level
                .chunks(2)
                .map(|pair| node_hash(&pair[0], &pair[1]))
                .collect();
            pos /= 2;
        }

        Ok(InclusionWitness {
            pool_size: size,
            leaf_index,
            peak_index,
            path,
            peaks: self.peaks.iter().map(|(_, d)| *d).collect(),
        })
    }
}

/// Check that `commitment` is a member of the pool whose root is `root`.
///
/// Malformed witnesses return `false`.
pub fn verify_inclusion(
    commitment: &ContentDigest,
    witness: &InclusionWitness,
    root: &PoolRoot,
) -> bool {
    let Some((peak_index, start, height)) = locate(witness.pool_size, witness.leaf_index) else {
        return false;
    };
    if peak_index != witness.peak_index
        || witness.path.len() != height as usize
        || witness.peaks.len() != peak_plan(witness.pool_size).len()
    {
        return false;
    }

    let local = witness.leaf_index - start;
    let mut cur = leaf_hash(commitment);
    for (level, step) in witness.path.iter().enumerate() {
        let expected_side = if (local >> level) & 1 == 1 {
            Side::Left
        } else {
            Side::Right
        };
        if step.side != expected_side {
            return false;
        }
        cur = match step.side {
            Side::Left => node_hash(&step.sibling, &cur),
            Side::Right => node_hash(&cur, &step.sibling),
        };
    }

    cur == witness.peaks[peak_index] && bag_peaks(&witness.peaks) == *root
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use zkvote_core::sha256;

    fn commitments(n: usize) -> Vec<ContentDigest> {
        (0..n).map(|i| sha256(format!("c{i}").as_bytes())).collect()
    }

    fn pool_of(items: &[ContentDigest]) -> PoolAccumulator {
        let mut pool = PoolAccumulator::new();
        for c in items {
            pool.append(c);
        }
        pool
    }

    #[test]
    fn empty_pool_has_zero_root() {
        let pool = PoolAccumulator::new();
        assert!(pool.is_empty());
        assert_eq!(pool.root(), PoolRoot::EMPTY);
        assert_eq!(pool.root().to_hex(), "0".repeat(64));
    }

    #[test]
    fn single_leaf_root_is_leaf_hash() {
        let c = sha256(b"only");
        let pool = pool_of(&[c]);
        assert_eq!(pool.root(), PoolRoot(leaf_hash(&c)));
    }

    #[test]
    fn three_leaves_bag_two_peaks() {
        let cs = commitments(3);
        let pool = pool_of(&cs);
        let left = node_hash(&leaf_hash(&cs[0]), &leaf_hash(&cs[1]));
        let right = leaf_hash(&cs[2]);
        assert_eq!(pool.root(), PoolRoot(node_hash(&left, &right)));
    }

    #[test]
    fn root_changes_on_every_append() {
        let mut pool = PoolAccumulator::new();
        let mut seen = vec![pool.root()];
        for c in commitments(9) {
            pool.append(&c);
            let r = pool.root();
            assert!(!seen.contains(&r));
            seen.push(r);
        }
    }

    #[test]
    fn peak_plan_follows_binary_expansion() {
        assert_eq!(peak_plan(0), Vec::<u32>::new());
        assert_eq!(peak_plan(1), vec![0]);
        assert_eq!(peak_plan(7), vec![2, 1, 0]);
        assert_eq!(peak_plan(8), vec![3]);
        assert_eq!(peak_plan(11), vec![3, 1, 0]);
    }

    #[test]
    fn witness_out_of_range() {
        let pool = pool_of(&commitments(2));
        assert_eq!(
            pool.witness(2),
            Err(PoolError::LeafOutOfRange { index: 2, size: 2 })
        );
    }

    #[test]
    fn tampered_witness_fails() {
        let cs = commitments(6);
        let pool = pool_of(&cs);
        let root = pool.root();
        let w = pool.witness(4).unwrap();
        assert!(verify_inclusion(&cs[4], &w, &root));

        assert!(!verify_inclusion(&cs[3], &w, &root));
        assert!(!verify_inclusion(&cs[4], &w, &PoolRoot::EMPTY));

        let mut bad = w.clone();
        bad.path[0].sibling = sha256(b"forged");
        assert!(!verify_inclusion(&cs[4], &bad, &root));

        let mut bad = w.clone();
        bad.path[0].side = Side::Left;
        assert!(!verify_inclusion(&cs[4], &bad, &root));

        let mut bad = w.clone();
        bad.pool_size = 7;
        assert!(!verify_inclusion(&cs[4], &bad, &root));

        let mut bad = w;
        bad.peaks.pop();
        assert!(!verify_inclusion(&cs[4], &bad, &root));
    }

    #[test]
    fn old_witness_does_not_verify_against_new_root() {
        let cs = commitments(3);
        let mut pool = pool_of(&cs);
        let w = pool.witness(0).unwrap();
        pool.append(&sha256(b"later"));
        assert!(!verify_inclusion(&cs[0], &w, &pool.root()));
        assert!(verify_inclusion(&cs[0], &pool.witness(0).unwrap(), &pool.root()));
    }

    #[test]
    fn witness_serializes_sides_lowercase() {
        let pool = pool_of(&commitments(2));
        let json = serde_json::to_value(pool.witness(0).unwrap()).unwrap();
        assert_eq!(json["path"][0]["side"], "right");
    }

    proptest! {
        #[test]
        fn every_leaf_has_a_valid_witness(n in 1usize..40) {
            let cs = commitments(n);
            let pool = pool_of(&cs);
            let root = pool.root();
            for (i, c) in cs.iter().enumerate() {
                let w = pool.witness(i as u64).unwrap();
                prop_assert!(verify_inclusion(c, &w, &root));
            }
        }
    }
}
