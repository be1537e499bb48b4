use proptest::prelude::*;

use ballot_crypto::sha256_hex;
use ballot_merkle::{merkle_root, verify_proof, MerkleTree};
use ballot_types::Hash256;

fn arb_leaves(max: usize) -> impl Strategy<Value = Vec<Hash256>> {
    prop::collection::vec(prop::array::uniform32(0u8..), 1..max)
        .prop_map(|v| v.into_iter().map(Hash256::new).collect())
}

proptest! {
    /// Every leaf's proof verifies against the tree root.
    #[test]
    fn proof_round_trip(leaves in arb_leaves(64)) {
        let tree = MerkleTree::build(leaves.clone()).unwrap();
        let root = tree.root();
        for leaf in &leaves {
            let proof = tree.proof_for(leaf);
            prop_assert!(verify_proof(leaf, &proof, &root));
        }
    }

    /// A hash that is not a leaf gets an empty proof.
    #[test]
    fn non_membership_gives_empty_proof(leaves in arb_leaves(32), probe in prop::array::uniform32(0u8..)) {
        let probe = Hash256::new(probe);
        prop_assume!(!leaves.contains(&probe));
        let tree = MerkleTree::build(leaves).unwrap();
        prop_assert!(tree.proof_for(&probe).is_empty());
    }

    /// The root is a pure function of the leaf list.
    #[test]
    fn root_is_deterministic(leaves in arb_leaves(32)) {
        let a = MerkleTree::build(leaves.clone()).unwrap().root();
        let b = MerkleTree::build(leaves.clone()).unwrap().root();
        prop_assert_eq!(a, b);
        prop_assert_eq!(a, merkle_root(&leaves));
    }

    /// Changing any single leaf changes the root.
    #[test]
    fn leaf_change_changes_root(leaves in arb_leaves(16), idx in any::<prop::sample::Index>()) {
        let original = MerkleTree::build(leaves.clone()).unwrap().root();
        let mut mutated = leaves.clone();
        let i = idx.index(mutated.len());
        let flipped = sha256_hex(mutated[i].as_bytes());
        prop_assume!(flipped != mutated[i]);
        mutated[i] = flipped;
        let changed = MerkleTree::build(mutated).unwrap().root();
        prop_assert_ne!(original, changed);
    }
}

#[test]
fn empty_list_maps_to_empty_tree_constant() {
    assert_eq!(merkle_root(&[]), ballot_merkle::empty_tree_root());
}
