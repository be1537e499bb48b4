//! Genesis block creation — block 0 of each election's ledger.

use ballot_types::Hash256;
use rand::RngCore;
use serde_json::json;

use crate::Block;

/// Create the genesis block for an election.
///
/// Genesis is not mined: its hash is the canonical hash of its fields at
/// `nonce = 0` (hash validity holds; the difficulty condition applies only
/// to blocks with `index > 0`). `previous_hash` is the all-zero sentinel.
/// A random salt in the payload makes each election's genesis hash unique
/// even for identical ids created in the same second.
pub fn create_genesis_block(election_id: &str) -> Block {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut block = Block::unmined(
        0,
        Hash256::ZERO,
        json!({
            "type": "genesis",
            "election_id": election_id,
            "salt": hex::encode(salt),
        }),
    );
    block.hash = block.calculate_hash();
    block
}
