//! Vote casting and verification on top of the chain.
//!
//! The all-or-nothing contract lives here: a vote either produces both a
//! mined block and a receipt, or neither. The receipt is written only after
//! the block persists, and a receipt failure rolls the block back — no
//! orphaned receipts referencing a block that does not exist.

use std::sync::Arc;

use ballot_crypto::sha256_str;
use ballot_store::{ReceiptStore, Store, VoteReceipt};
use ballot_types::{ActorType, Hash256, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{Block, LedgerError, LedgerService};

/// A ballot as submitted by the vote-casting collaborator. The voter is
/// already reduced to a one-way hash by the time it reaches the core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BallotPaper {
    pub constituency_id: String,
    /// Candidate identifier, or the literal `"NOTA"`.
    pub candidate_id: String,
    pub voter_hash: Hash256,
}

/// Everything produced by a successful vote.
#[derive(Clone, Debug, Serialize)]
pub struct VoteRecord {
    pub block: Block,
    pub receipt: VoteReceipt,
}

/// Outcome of a vote verification query. A miss is a structured verdict,
/// not an error — the caller shows the reason to the voter.
#[derive(Clone, Debug, Serialize)]
pub struct VoteVerification {
    pub verified: bool,
    pub reason: String,
}

impl VoteVerification {
    fn no(reason: &str) -> Self {
        Self {
            verified: false,
            reason: reason.to_string(),
        }
    }
}

/// Casts votes into chains and answers receipt queries.
pub struct VotingService {
    ledgers: Arc<LedgerService>,
    store: Arc<dyn Store>,
}

impl VotingService {
    pub fn new(ledgers: Arc<LedgerService>, store: Arc<dyn Store>) -> Self {
        Self { ledgers, store }
    }

    /// Record a vote: one mined block plus one receipt, atomically.
    ///
    /// Double votes are rejected before mining — the receipt uniqueness
    /// check is cheap, the nonce search is not.
    pub fn cast_vote(
        &self,
        ledger_id: &str,
        ballot: &BallotPaper,
    ) -> Result<VoteRecord, LedgerError> {
        let chain = self.ledgers.chain(ledger_id)?;
        let info = chain.info();
        if !info.is_active {
            return Err(LedgerError::LedgerInactive(info.ledger_id));
        }
        if self.store.voter_has_voted(ledger_id, &ballot.voter_hash)? {
            return Err(LedgerError::AlreadyVoted);
        }

        let timestamp = Timestamp::now();
        let transaction_hash = sha256_str(&format!(
            "{}:{}:{}",
            ballot.voter_hash.to_hex(),
            timestamp.to_rfc3339(),
            ballot.candidate_id,
        ));
        let payload = json!({
            "transaction_type": "vote",
            "election_id": info.election_id,
            "constituency_id": ballot.constituency_id,
            "candidate_id": ballot.candidate_id,
            "voter_hash": ballot.voter_hash.to_hex(),
            "timestamp": timestamp.to_rfc3339(),
            "transactions": [{"hash": transaction_hash.to_hex()}],
        });

        // Only the first 8 hex chars reach the audit log.
        let voter_hex = ballot.voter_hash.to_hex();
        let block = chain.append_block(payload, ActorType::Voter, &voter_hex[..8])?;

        let receipt = VoteReceipt {
            receipt_hash: block.hash,
            ledger_id: ledger_id.to_string(),
            voter_hash: ballot.voter_hash,
            block_hash: block.hash,
            block_index: block.index,
            constituency_code: ballot.constituency_id.clone(),
            confirmed: true,
            timestamp,
        };
        if let Err(e) = self.store.save_receipt(&receipt) {
            tracing::error!(error = %e, "receipt write failed, rolling back block");
            if let Err(rollback) = chain.rollback_block(&block) {
                tracing::error!(error = %rollback, "rollback after receipt failure also failed");
            }
            return Err(e.into());
        }

        Ok(VoteRecord { block, receipt })
    }

    /// Check that a receipt belongs to `voter_hash` and its block is intact
    /// and part of the chain.
    pub fn verify_vote(
        &self,
        receipt_hash: &Hash256,
        voter_hash: &Hash256,
    ) -> Result<VoteVerification, LedgerError> {
        let receipt = match self.store.find_receipt(receipt_hash) {
            Ok(r) => r,
            Err(ballot_store::StoreError::NotFound(_)) => {
                return Ok(VoteVerification::no("receipt not found"));
            }
            Err(e) => return Err(e.into()),
        };

        if receipt.voter_hash != *voter_hash {
            return Ok(VoteVerification::no("vote not found for this voter"));
        }

        let chain = self.ledgers.chain(&receipt.ledger_id)?;
        let blocks = chain.load_blocks()?;
        let Some(block) = blocks.iter().find(|b| b.hash == receipt.block_hash) else {
            return Ok(VoteVerification::no("block is not part of the chain"));
        };
        if !block.is_hash_valid() {
            return Ok(VoteVerification::no("block hash is invalid"));
        }

        Ok(VoteVerification {
            verified: true,
            reason: "vote verified".to_string(),
        })
    }
}
