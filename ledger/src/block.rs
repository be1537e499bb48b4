//! The block record: canonicalization, hash computation, proof generation.

use ballot_crypto::canonical_hash;
use ballot_merkle::{merkle_root, MerkleTree, ProofStep};
use ballot_types::{Hash256, Timestamp};
use ballot_work::{Miner, MiningOutcome};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::LedgerError;

/// One immutable entry in a ledger.
///
/// The wire form is a flat JSON object with exactly these field names;
/// hashes are lowercase 64-char hex, the timestamp is RFC 3339, and
/// `merkle_root` serializes as `""` when no transactions are embedded.
/// Any deviation breaks cross-node hash agreement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: Timestamp,
    /// Caller-supplied structured data — opaque to the core.
    pub payload: Value,
    pub previous_hash: Hash256,
    pub nonce: u64,
    pub hash: Hash256,
    /// Absent both as `None` and as the wire form `""`; a peer that omits
    /// the key entirely is treated the same way.
    #[serde(default, with = "merkle_root_serde")]
    pub merkle_root: Option<Hash256>,
}

impl Block {
    /// Construct an unmined block: `nonce = 0`, zero hash, no Merkle root.
    pub fn unmined(index: u64, previous_hash: Hash256, payload: Value) -> Self {
        Self {
            index,
            timestamp: Timestamp::now(),
            payload,
            previous_hash,
            nonce: 0,
            hash: Hash256::ZERO,
            merkle_root: None,
        }
    }

    /// The canonical hash of this block's fields with the stored nonce.
    ///
    /// Pure and deterministic: any node recomputing this over the same
    /// fields gets the same value.
    pub fn calculate_hash(&self) -> Hash256 {
        self.hash_with_nonce(self.nonce)
    }

    /// The canonical hash with a candidate nonce — the mining search space.
    pub fn hash_with_nonce(&self, nonce: u64) -> Hash256 {
        let preimage = json!({
            "index": self.index,
            "timestamp": self.timestamp.to_rfc3339(),
            "payload": self.payload,
            "previous_hash": self.previous_hash.to_hex(),
            "nonce": nonce,
            "merkle_root": self.merkle_root.map(|h| h.to_hex()).unwrap_or_default(),
        });
        canonical_hash(&preimage)
    }

    /// Whether the stored hash matches the recomputed one.
    pub fn is_hash_valid(&self) -> bool {
        self.hash == self.calculate_hash()
    }

    /// Transaction hashes embedded in the payload (`payload.transactions[].hash`).
    pub fn transaction_hashes(&self) -> Vec<Hash256> {
        let Some(transactions) = self.payload.get("transactions").and_then(Value::as_array)
        else {
            return Vec::new();
        };
        transactions
            .iter()
            .filter_map(|tx| tx.get("hash").and_then(Value::as_str))
            .filter_map(|s| s.parse().ok())
            .collect()
    }

    /// Mine this block in place: fix the Merkle root once, then search for
    /// a nonce meeting `difficulty`. The only mutation path a block has.
    pub fn mine(&mut self, miner: &Miner, difficulty: u8) -> MiningOutcome {
        let tx_hashes = self.transaction_hashes();
        if !tx_hashes.is_empty() {
            self.merkle_root = Some(merkle_root(&tx_hashes));
        }

        let outcome = miner.mine_with(difficulty, |nonce| self.hash_with_nonce(nonce));
        self.nonce = outcome.nonce;
        self.hash = outcome.hash;
        outcome
    }

    /// Inclusion proof for one transaction hash of this block.
    ///
    /// Empty when the block has no transactions, no Merkle root, or the
    /// target is not among the embedded hashes.
    pub fn generate_merkle_proof(&self, target: &Hash256) -> Vec<ProofStep> {
        if self.merkle_root.is_none() {
            return Vec::new();
        }
        let tx_hashes = self.transaction_hashes();
        if tx_hashes.is_empty() {
            return Vec::new();
        }
        match MerkleTree::build(tx_hashes) {
            Ok(tree) => tree.proof_for(target),
            Err(_) => Vec::new(),
        }
    }

    /// Serialize for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        serde_json::to_vec(self).map_err(|e| LedgerError::Encoding(e.to_string()))
    }

    /// Deserialize from storage bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        serde_json::from_slice(bytes).map_err(|e| LedgerError::Encoding(e.to_string()))
    }
}

/// `merkle_root` travels as `""` when absent — the wire contract predates
/// optional fields and every peer expects the key to be present.
mod merkle_root_serde {
    use ballot_types::Hash256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Hash256>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(h) => serializer.serialize_str(&h.to_hex()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Hash256>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(None);
        }
        s.parse().map(Some).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_merkle::verify_proof;

    fn vote_payload(tx_hashes: &[Hash256]) -> Value {
        let txs: Vec<Value> = tx_hashes
            .iter()
            .map(|h| json!({"hash": h.to_hex()}))
            .collect();
        json!({"transaction_type": "vote", "transactions": txs})
    }

    fn tx(n: u8) -> Hash256 {
        let mut bytes = [0u8; 32];
        bytes[0] = n;
        Hash256::new(bytes)
    }

    #[test]
    fn calculate_hash_is_deterministic() {
        let block = Block::unmined(3, Hash256::ZERO, json!({"k": "v"}));
        assert_eq!(block.calculate_hash(), block.calculate_hash());
    }

    #[test]
    fn hash_depends_on_every_field() {
        let base = Block::unmined(3, Hash256::ZERO, json!({"k": "v"}));
        let h = base.calculate_hash();

        let mut changed = base.clone();
        changed.index = 4;
        assert_ne!(changed.calculate_hash(), h);

        let mut changed = base.clone();
        changed.payload = json!({"k": "w"});
        assert_ne!(changed.calculate_hash(), h);

        let mut changed = base.clone();
        changed.previous_hash = tx(1);
        assert_ne!(changed.calculate_hash(), h);

        let mut changed = base.clone();
        changed.merkle_root = Some(tx(2));
        assert_ne!(changed.calculate_hash(), h);

        assert_ne!(base.hash_with_nonce(1), h);
    }

    #[test]
    fn mining_sets_valid_hash() {
        let mut block = Block::unmined(1, tx(9), json!({"v": 1}));
        let outcome = block.mine(&Miner::default(), 2);
        assert!(block.is_hash_valid());
        assert!(block.hash.to_hex().starts_with("00"));
        assert_eq!(block.nonce, outcome.nonce);
    }

    #[test]
    fn mining_fixes_merkle_root_from_transactions() {
        let hashes = vec![tx(1), tx(2), tx(3)];
        let mut block = Block::unmined(1, Hash256::ZERO, vote_payload(&hashes));
        block.mine(&Miner::default(), 1);
        assert_eq!(block.merkle_root, Some(ballot_merkle::merkle_root(&hashes)));
    }

    #[test]
    fn tamper_breaks_hash_validity() {
        let mut block = Block::unmined(1, Hash256::ZERO, json!({"candidate": "A"}));
        block.mine(&Miner::default(), 1);
        assert!(block.is_hash_valid());

        block.payload = json!({"candidate": "B"});
        assert!(!block.is_hash_valid());
    }

    #[test]
    fn merkle_proof_round_trip() {
        let hashes = vec![tx(1), tx(2), tx(3), tx(4), tx(5)];
        let mut block = Block::unmined(1, Hash256::ZERO, vote_payload(&hashes));
        block.mine(&Miner::default(), 1);

        let root = block.merkle_root.unwrap();
        for h in &hashes {
            let proof = block.generate_merkle_proof(h);
            assert!(verify_proof(h, &proof, &root));
        }
    }

    #[test]
    fn proof_is_empty_without_transactions() {
        let mut block = Block::unmined(1, Hash256::ZERO, json!({"plain": true}));
        block.mine(&Miner::default(), 1);
        assert_eq!(block.merkle_root, None);
        assert!(block.generate_merkle_proof(&tx(1)).is_empty());
    }

    #[test]
    fn wire_serialization_round_trips() {
        let hashes = vec![tx(1)];
        let mut block = Block::unmined(2, tx(7), vote_payload(&hashes));
        block.mine(&Miner::default(), 1);

        let bytes = block.to_bytes().unwrap();
        let back = Block::from_bytes(&bytes).unwrap();
        assert_eq!(back, block);
        assert!(back.is_hash_valid());
    }

    #[test]
    fn absent_merkle_root_serializes_as_empty_string() {
        let block = Block::unmined(0, Hash256::ZERO, json!({}));
        let v: Value = serde_json::to_value(&block).unwrap();
        assert_eq!(v["merkle_root"], json!(""));
        assert_eq!(v["previous_hash"], json!("0".repeat(64)));

        let back: Block = serde_json::from_value(v).unwrap();
        assert_eq!(back.merkle_root, None);
    }

    #[test]
    fn malformed_transaction_entries_are_skipped() {
        let payload = json!({"transactions": [
            {"hash": tx(1).to_hex()},
            {"hash": "not-hex"},
            {"no_hash": true},
            42,
        ]});
        let block = Block::unmined(0, Hash256::ZERO, payload);
        assert_eq!(block.transaction_hashes(), vec![tx(1)]);
    }
}
