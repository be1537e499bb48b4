//! JSON wire format for node-to-node communication.
//!
//! Served by this node's HTTP surface and consumed by [`crate::PeerClient`].
//! Field names, lowercase-hex hashes, and RFC 3339 timestamps must match on
//! both sides — the block hash is recomputed from these exact values.

use ballot_ledger::Block;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A block in flight between peers: the flat block object plus the ledger
/// it belongs to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IncomingBlock {
    pub ledger_id: String,
    #[serde(flatten)]
    pub block: Block,
}

/// Summary header served with a full chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainSummary {
    pub id: String,
    pub name: String,
    pub difficulty: u8,
    pub total_blocks: u64,
}

/// Full chain response — `GET /chain/{ledger_id}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainResponse {
    pub ledger: ChainSummary,
    pub blocks: Vec<Block>,
}

/// Why a received block was not committed.
///
/// These are expected outcomes, not errors: the HTTP layer maps them to 4xx
/// responses and the sender moves on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Same `(hash, index)` already present — a repeat delivery, not a fault.
    AlreadyExists,
    /// No local block at `index - 1`, or its hash differs from the incoming
    /// `previous_hash`.
    PreviousBlockMismatch,
    /// Recomputed hash and stored hash disagree, or the hash misses the
    /// ledger's difficulty target.
    InvalidProofOfWork,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::AlreadyExists => "block already exists",
            Self::PreviousBlockMismatch => "previous block not found or hash mismatch",
            Self::InvalidProofOfWork => "invalid proof of work",
        };
        f.write_str(msg)
    }
}

/// Outcome of validating and (maybe) committing a received block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockReception {
    Accepted,
    Rejected(RejectReason),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_types::Hash256;
    use serde_json::json;

    #[test]
    fn incoming_block_flattens_block_fields() {
        let block = Block::unmined(1, Hash256::ZERO, json!({"v": 1}));
        let incoming = IncomingBlock {
            ledger_id: "election-e1".into(),
            block,
        };
        let v = serde_json::to_value(&incoming).unwrap();
        assert_eq!(v["ledger_id"], "election-e1");
        assert_eq!(v["index"], 1);
        assert!(v["previous_hash"].is_string());
        assert!(v.get("block").is_none(), "wire block must be flat");

        let back: IncomingBlock = serde_json::from_value(v).unwrap();
        assert_eq!(back.block.index, 1);
    }

    #[test]
    fn reject_reason_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&RejectReason::PreviousBlockMismatch).unwrap(),
            "\"previous_block_mismatch\""
        );
    }
}
