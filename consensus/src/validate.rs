//! Validation of peer-supplied chains during conflict resolution.

use ballot_ledger::Block;
use ballot_work::meets_difficulty;

/// Whether a full chain received from a peer is acceptable for adoption.
///
/// Checks, per block: the stored hash equals the hash recomputed from the
/// block's own fields; `previous_hash` links to the predecessor; and — for
/// every block past genesis — the hash meets the ledger's difficulty.
///
/// Blocks past genesis must carry real work: a merely-longer chain of
/// honestly-hashed but unmined blocks is rejected. Genesis is exempt (it is
/// never mined) but must still be hash-valid and index 0.
pub fn validate_peer_chain(blocks: &[Block], difficulty: u8) -> bool {
    let Some(first) = blocks.first() else {
        return false;
    };
    if first.index != 0 || !first.previous_hash.is_zero() {
        tracing::debug!("peer chain rejected: malformed genesis");
        return false;
    }

    for (i, block) in blocks.iter().enumerate() {
        if block.index != i as u64 {
            tracing::debug!(index = block.index, position = i, "peer chain rejected: index gap");
            return false;
        }
        if !block.is_hash_valid() {
            tracing::debug!(index = block.index, "peer chain rejected: hash mismatch");
            return false;
        }
        if i > 0 {
            if block.previous_hash != blocks[i - 1].hash {
                tracing::debug!(index = block.index, "peer chain rejected: broken linkage");
                return false;
            }
            if !meets_difficulty(&block.hash, difficulty) {
                tracing::debug!(index = block.index, "peer chain rejected: insufficient work");
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_types::Hash256;
    use ballot_work::Miner;
    use serde_json::json;

    fn build_chain(len: usize, difficulty: u8) -> Vec<Block> {
        let mut blocks = vec![ballot_ledger::create_genesis_block("e1")];
        for i in 1..len {
            let mut block = Block::unmined(
                i as u64,
                blocks[i - 1].hash,
                json!({"n": i}),
            );
            block.mine(&Miner::default(), difficulty);
            blocks.push(block);
        }
        blocks
    }

    #[test]
    fn well_formed_chain_validates() {
        assert!(validate_peer_chain(&build_chain(4, 1), 1));
    }

    #[test]
    fn empty_chain_is_invalid() {
        assert!(!validate_peer_chain(&[], 1));
    }

    #[test]
    fn genesis_only_chain_validates() {
        assert!(validate_peer_chain(&build_chain(1, 1), 1));
    }

    #[test]
    fn tampered_payload_fails() {
        let mut blocks = build_chain(3, 1);
        blocks[1].payload = json!({"n": "tampered"});
        assert!(!validate_peer_chain(&blocks, 1));
    }

    #[test]
    fn broken_linkage_fails() {
        let mut blocks = build_chain(3, 1);
        blocks[2].previous_hash = Hash256::ZERO;
        // Re-mine so hash validity holds and only the linkage is broken.
        blocks[2].mine(&Miner::default(), 1);
        assert!(!validate_peer_chain(&blocks, 1));
    }

    #[test]
    fn sub_difficulty_chain_fails() {
        // Chain mined at difficulty 1 must not be adopted at difficulty 3,
        // however long it is.
        let blocks = build_chain(6, 1);
        assert!(!validate_peer_chain(&blocks, 3));
    }

    #[test]
    fn index_gap_fails() {
        let mut blocks = build_chain(3, 1);
        blocks[2].index = 5;
        blocks[2].mine(&Miner::default(), 1);
        assert!(!validate_peer_chain(&blocks, 1));
    }

    #[test]
    fn non_zero_genesis_fails() {
        let mut blocks = build_chain(2, 1);
        blocks.remove(0);
        assert!(!validate_peer_chain(&blocks, 1));
    }
}
