//! Ledger-state storage trait.

use crate::StoreError;
use ballot_types::Hash256;
use serde::{Deserialize, Serialize};

/// Persistent state of one election-scoped ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub ledger_id: String,
    pub name: String,
    pub election_id: String,
    pub genesis_hash: Hash256,
    pub latest_hash: Hash256,
    pub difficulty: u8,
    /// Count of all blocks, genesis included.
    pub total_blocks: u64,
    pub is_active: bool,
}

/// Storage for ledger metadata.
pub trait LedgerStore {
    /// Insert or update a ledger record.
    fn save_ledger(&self, record: &LedgerRecord) -> Result<(), StoreError>;

    /// Fetch a ledger record by id.
    fn get_ledger(&self, ledger_id: &str) -> Result<LedgerRecord, StoreError>;

    /// All ledgers currently marked active, sorted by id.
    fn list_active(&self) -> Result<Vec<LedgerRecord>, StoreError>;
}
