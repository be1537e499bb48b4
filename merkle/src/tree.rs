//! Tree construction, root computation, and inclusion proofs.

use ballot_crypto::sha256_str;
use ballot_types::Hash256;
use serde::{Deserialize, Serialize};

use crate::MerkleError;

/// Which side of the current element a proof sibling sits on.
///
/// `Right` means the sibling was concatenated to the right of the current
/// hash when producing the parent (`hash(current ‖ sibling)`); `Left` means
/// the reverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// One step of an inclusion proof: a sibling hash and its side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub hash: Hash256,
    pub side: Side,
}

/// A binary hash tree over an ordered list of transaction hashes.
///
/// Leaf order matters — it defines proof indices. The tree is derived and
/// ephemeral: only the root is ever persisted (inside a block).
#[derive(Clone, Debug)]
pub struct MerkleTree {
    leaves: Vec<Hash256>,
    /// `levels[0]` is the leaf list; the last level holds the single root.
    levels: Vec<Vec<Hash256>>,
}

/// Hash a parent from two children by concatenating their hex renderings.
fn combine(left: &Hash256, right: &Hash256) -> Hash256 {
    let mut s = String::with_capacity(128);
    s.push_str(&left.to_hex());
    s.push_str(&right.to_hex());
    sha256_str(&s)
}

impl MerkleTree {
    /// Build a tree bottom-up. Fails only on an empty leaf list; callers
    /// that want the empty-tree convention use [`crate::merkle_root`].
    pub fn build(leaves: Vec<Hash256>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyInput);
        }

        let mut levels = vec![leaves.clone()];
        while levels.last().map(|level| level.len()).unwrap_or(0) > 1 {
            let current = levels.last().expect("levels is non-empty");
            let mut next = Vec::with_capacity(current.len().div_ceil(2));
            for i in (0..current.len()).step_by(2) {
                let left = &current[i];
                // Odd count: the last element pairs with itself.
                let right = current.get(i + 1).unwrap_or(left);
                next.push(combine(left, right));
            }
            levels.push(next);
        }

        Ok(Self { leaves, levels })
    }

    /// The root hash at the top of the level stack.
    pub fn root(&self) -> Hash256 {
        self.levels[self.levels.len() - 1][0]
    }

    /// Build an inclusion proof for `leaf`.
    ///
    /// Returns an empty proof when the leaf is not present — that is the
    /// non-membership signal, not an error. A single-leaf tree also yields
    /// an empty proof (the leaf is the root).
    pub fn proof_for(&self, leaf: &Hash256) -> Vec<ProofStep> {
        let Some(mut index) = self.leaves.iter().position(|l| l == leaf) else {
            return Vec::new();
        };

        let mut proof = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_index = index ^ 1;
            // Out of bounds only for the duplicated last element, which
            // pairs with itself.
            let sibling = level.get(sibling_index).unwrap_or(&level[index]);
            let side = if index % 2 == 0 { Side::Right } else { Side::Left };
            proof.push(ProofStep {
                hash: *sibling,
                side,
            });
            index /= 2;
        }
        proof
    }
}

/// Verify an inclusion proof by folding sibling hashes up to the root.
pub fn verify_proof(leaf: &Hash256, proof: &[ProofStep], root: &Hash256) -> bool {
    let mut current = *leaf;
    for step in proof {
        current = match step.side {
            Side::Right => combine(&current, &step.hash),
            Side::Left => combine(&step.hash, &current),
        };
    }
    current == *root
}
