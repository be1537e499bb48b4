//! Vote receipt storage trait.

use crate::StoreError;
use ballot_types::{Hash256, Timestamp};
use serde::{Deserialize, Serialize};

/// The record a voter gets back after a successful vote — enough to later
/// prove the vote landed in the chain without revealing who cast it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteReceipt {
    /// Equal to the hash of the block that carries the vote.
    pub receipt_hash: Hash256,
    pub ledger_id: String,
    pub voter_hash: Hash256,
    pub block_hash: Hash256,
    pub block_index: u64,
    pub constituency_code: String,
    pub confirmed: bool,
    pub timestamp: Timestamp,
}

/// Storage for vote receipts.
///
/// One receipt per voter per ledger — [`save_receipt`](Self::save_receipt)
/// enforces the uniqueness that backs double-vote rejection.
pub trait ReceiptStore {
    /// Persist a receipt. Fails with [`StoreError::Duplicate`] if the voter
    /// already has a receipt in this ledger or the receipt hash is taken.
    fn save_receipt(&self, receipt: &VoteReceipt) -> Result<(), StoreError>;

    fn find_receipt(&self, receipt_hash: &Hash256) -> Result<VoteReceipt, StoreError>;

    fn voter_has_voted(&self, ledger_id: &str, voter_hash: &Hash256) -> Result<bool, StoreError>;

    /// Remove a receipt — only used to roll back a failed vote submission.
    fn delete_receipt(&self, receipt_hash: &Hash256) -> Result<(), StoreError>;
}
