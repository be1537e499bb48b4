//! Merkle tree commitment over an ordered list of transaction hashes.
//!
//! Construction is iterative with explicit level arrays: level 0 is the leaf
//! list, each higher level pairs `(2i, 2i+1)` and hashes the concatenation of
//! the two hex strings. An odd-length level duplicates its last element. The
//! level-by-level layout keeps the sibling-index arithmetic auditable and
//! avoids recursion depth concerns on large transaction counts.

pub mod error;
pub mod tree;

pub use error::MerkleError;
pub use tree::{verify_proof, MerkleTree, ProofStep, Side};

use ballot_crypto::sha256_str;
use ballot_types::Hash256;

/// Root reported for a block with no transactions at all.
///
/// An engine-level convention, not a property of any tree: `MerkleTree`
/// itself refuses empty input.
pub fn empty_tree_root() -> Hash256 {
    sha256_str("empty_tree")
}

/// Compute a Merkle root over `leaves`, mapping the empty list to the
/// [`empty_tree_root`] constant.
pub fn merkle_root(leaves: &[Hash256]) -> Hash256 {
    match MerkleTree::build(leaves.to_vec()) {
        Ok(tree) => tree.root(),
        Err(MerkleError::EmptyInput) => empty_tree_root(),
    }
}
