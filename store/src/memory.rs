//! In-memory storage backend.
//!
//! Reference implementation of every store trait, backed by `RwLock`ed maps.
//! Used by tests and by nodes running without external persistence. Atomicity
//! of the "replace all blocks + update counters" sequence is provided by the
//! chain's append lock, not by this backend.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use ballot_types::Hash256;

use crate::audit::{AuditEntry, AuditStore};
use crate::block::BlockStore;
use crate::ledger::{LedgerRecord, LedgerStore};
use crate::receipt::{ReceiptStore, VoteReceipt};
use crate::StoreError;

#[derive(Clone)]
struct StoredBlock {
    hash: Hash256,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct Inner {
    /// ledger_id → index → block. BTreeMap keeps index order for free.
    blocks: HashMap<String, BTreeMap<u64, StoredBlock>>,
    ledgers: HashMap<String, LedgerRecord>,
    audit: Vec<AuditEntry>,
    receipts: HashMap<Hash256, VoteReceipt>,
    voted: HashSet<(String, Hash256)>,
}

/// Thread-safe in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl BlockStore for MemoryStore {
    fn save_block(
        &self,
        ledger_id: &str,
        index: u64,
        hash: &Hash256,
        block_bytes: &[u8],
    ) -> Result<(), StoreError> {
        let mut inner = self.write();
        let chain = inner.blocks.entry(ledger_id.to_string()).or_default();
        if chain.contains_key(&index) {
            return Err(StoreError::Duplicate(format!("{ledger_id}#{index}")));
        }
        chain.insert(
            index,
            StoredBlock {
                hash: *hash,
                bytes: block_bytes.to_vec(),
            },
        );
        Ok(())
    }

    fn load_blocks(&self, ledger_id: &str) -> Result<Vec<Vec<u8>>, StoreError> {
        let inner = self.read();
        Ok(inner
            .blocks
            .get(ledger_id)
            .map(|chain| chain.values().map(|b| b.bytes.clone()).collect())
            .unwrap_or_default())
    }

    fn block_exists(
        &self,
        ledger_id: &str,
        hash: &Hash256,
        index: u64,
    ) -> Result<bool, StoreError> {
        let inner = self.read();
        Ok(inner
            .blocks
            .get(ledger_id)
            .and_then(|chain| chain.get(&index))
            .map(|b| b.hash == *hash)
            .unwrap_or(false))
    }

    fn delete_block(&self, ledger_id: &str, hash: &Hash256) -> Result<(), StoreError> {
        let mut inner = self.write();
        let chain = inner
            .blocks
            .get_mut(ledger_id)
            .ok_or_else(|| StoreError::NotFound(ledger_id.to_string()))?;
        let index = chain
            .iter()
            .find(|(_, b)| b.hash == *hash)
            .map(|(i, _)| *i)
            .ok_or_else(|| StoreError::NotFound(hash.to_hex()))?;
        chain.remove(&index);
        Ok(())
    }

    fn delete_blocks(&self, ledger_id: &str) -> Result<u64, StoreError> {
        let mut inner = self.write();
        let removed = inner
            .blocks
            .remove(ledger_id)
            .map(|chain| chain.len() as u64)
            .unwrap_or(0);
        Ok(removed)
    }

    fn block_count(&self, ledger_id: &str) -> Result<u64, StoreError> {
        let inner = self.read();
        Ok(inner
            .blocks
            .get(ledger_id)
            .map(|chain| chain.len() as u64)
            .unwrap_or(0))
    }
}

impl LedgerStore for MemoryStore {
    fn save_ledger(&self, record: &LedgerRecord) -> Result<(), StoreError> {
        let mut inner = self.write();
        inner
            .ledgers
            .insert(record.ledger_id.clone(), record.clone());
        Ok(())
    }

    fn get_ledger(&self, ledger_id: &str) -> Result<LedgerRecord, StoreError> {
        let inner = self.read();
        inner
            .ledgers
            .get(ledger_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(ledger_id.to_string()))
    }

    fn list_active(&self) -> Result<Vec<LedgerRecord>, StoreError> {
        let inner = self.read();
        let mut active: Vec<LedgerRecord> = inner
            .ledgers
            .values()
            .filter(|l| l.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.ledger_id.cmp(&b.ledger_id));
        Ok(active)
    }
}

impl AuditStore for MemoryStore {
    fn record_audit(&self, entry: AuditEntry) -> Result<(), StoreError> {
        self.write().audit.push(entry);
        Ok(())
    }

    fn audit_entries(&self, ledger_id: &str) -> Result<Vec<AuditEntry>, StoreError> {
        let inner = self.read();
        Ok(inner
            .audit
            .iter()
            .filter(|e| e.ledger_id == ledger_id)
            .cloned()
            .collect())
    }
}

impl ReceiptStore for MemoryStore {
    fn save_receipt(&self, receipt: &VoteReceipt) -> Result<(), StoreError> {
        let mut inner = self.write();
        let voted_key = (receipt.ledger_id.clone(), receipt.voter_hash);
        if inner.voted.contains(&voted_key) {
            return Err(StoreError::Duplicate(format!(
                "voter already has a receipt in {}",
                receipt.ledger_id
            )));
        }
        if inner.receipts.contains_key(&receipt.receipt_hash) {
            return Err(StoreError::Duplicate(receipt.receipt_hash.to_hex()));
        }
        inner.receipts.insert(receipt.receipt_hash, receipt.clone());
        inner.voted.insert(voted_key);
        Ok(())
    }

    fn find_receipt(&self, receipt_hash: &Hash256) -> Result<VoteReceipt, StoreError> {
        let inner = self.read();
        inner
            .receipts
            .get(receipt_hash)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(receipt_hash.to_hex()))
    }

    fn voter_has_voted(&self, ledger_id: &str, voter_hash: &Hash256) -> Result<bool, StoreError> {
        let inner = self.read();
        Ok(inner
            .voted
            .contains(&(ledger_id.to_string(), *voter_hash)))
    }

    fn delete_receipt(&self, receipt_hash: &Hash256) -> Result<(), StoreError> {
        let mut inner = self.write();
        let receipt = inner
            .receipts
            .remove(receipt_hash)
            .ok_or_else(|| StoreError::NotFound(receipt_hash.to_hex()))?;
        inner
            .voted
            .remove(&(receipt.ledger_id.clone(), receipt.voter_hash));
        Ok(())
    }
}
