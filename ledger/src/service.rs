//! Ledger registry — one chain per election.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use ballot_store::{
    AuditAction, AuditEntry, AuditStore, BlockStore, LedgerRecord, LedgerStore, Store, StoreError,
};
use ballot_types::{ActorType, ProtocolParams};
use ballot_work::Miner;
use serde_json::json;

use crate::{create_genesis_block, BlockBroadcaster, Chain, LedgerError};

/// Creates and hands out [`Chain`] instances.
///
/// Chains are cached so every caller shares the same append lock; a ledger
/// that exists only in the store (after a restart) is rehydrated on first
/// access.
pub struct LedgerService {
    store: Arc<dyn Store>,
    miner: Miner,
    chains: RwLock<HashMap<String, Arc<Chain>>>,
    broadcaster: RwLock<Option<Arc<dyn BlockBroadcaster>>>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn Store>, params: &ProtocolParams) -> Self {
        Self {
            store,
            miner: Miner::new(params.max_mine_attempts, params.min_difficulty),
            chains: RwLock::new(HashMap::new()),
            broadcaster: RwLock::new(None),
        }
    }

    /// Register the consensus engine for outbound broadcasts. Existing and
    /// future chains both pick it up.
    pub fn set_broadcaster(&self, broadcaster: Arc<dyn BlockBroadcaster>) {
        *self.broadcaster.write().unwrap_or_else(|e| e.into_inner()) =
            Some(broadcaster.clone());
        let chains = self.chains.read().unwrap_or_else(|e| e.into_inner());
        for chain in chains.values() {
            chain.set_broadcaster(broadcaster.clone());
        }
    }

    /// Create a new ledger for an election: genesis block plus state record.
    pub fn create_for_election(
        &self,
        election_id: &str,
        name: &str,
        difficulty: u8,
    ) -> Result<Arc<Chain>, LedgerError> {
        let ledger_id = format!("election-{election_id}");
        if self.store.get_ledger(&ledger_id).is_ok() {
            return Err(LedgerError::DuplicateLedger(ledger_id));
        }

        let started = Instant::now();
        let genesis = create_genesis_block(election_id);
        self.store
            .save_block(&ledger_id, 0, &genesis.hash, &genesis.to_bytes()?)?;

        let record = LedgerRecord {
            ledger_id: ledger_id.clone(),
            name: name.to_string(),
            election_id: election_id.to_string(),
            genesis_hash: genesis.hash,
            latest_hash: genesis.hash,
            difficulty,
            total_blocks: 1,
            is_active: true,
        };
        self.store.save_ledger(&record)?;

        if let Err(e) = self.store.record_audit(AuditEntry::success(
            AuditAction::CreateBlock,
            &ledger_id,
            ActorType::System,
            "system",
            json!({"block_type": "genesis", "election_id": election_id}),
            started.elapsed(),
        )) {
            tracing::error!(error = %e, "failed to audit genesis creation");
        }

        Ok(self.cache_chain(record))
    }

    /// Look up a chain, rehydrating from the store when necessary.
    pub fn chain(&self, ledger_id: &str) -> Result<Arc<Chain>, LedgerError> {
        {
            let chains = self.chains.read().unwrap_or_else(|e| e.into_inner());
            if let Some(chain) = chains.get(ledger_id) {
                return Ok(chain.clone());
            }
        }

        match self.store.get_ledger(ledger_id) {
            Ok(record) => Ok(self.cache_chain(record)),
            Err(StoreError::NotFound(_)) => {
                Err(LedgerError::LedgerNotFound(ledger_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All active ledgers, sorted by id.
    pub fn list_active(&self) -> Result<Vec<LedgerRecord>, LedgerError> {
        Ok(self.store.list_active()?)
    }

    /// Validate a ledger's whole chain, writing a `VALIDATE_CHAIN` audit row.
    pub fn validate_chain(&self, ledger_id: &str) -> Result<bool, LedgerError> {
        let chain = self.chain(ledger_id)?;
        let started = Instant::now();
        let valid = chain.is_chain_valid()?;

        let entry = if valid {
            AuditEntry::success(
                AuditAction::ValidateChain,
                ledger_id,
                ActorType::System,
                "system",
                json!({"is_valid": true}),
                started.elapsed(),
            )
        } else {
            AuditEntry::failure(
                AuditAction::ValidateChain,
                ledger_id,
                ActorType::System,
                "system",
                "chain integrity check failed",
            )
        };
        if let Err(e) = self.store.record_audit(entry) {
            tracing::error!(error = %e, "failed to audit chain validation");
        }
        Ok(valid)
    }

    fn cache_chain(&self, record: LedgerRecord) -> Arc<Chain> {
        let chain = Arc::new(Chain::new(
            self.store.clone(),
            self.miner,
            record.clone(),
        ));
        if let Some(b) = self
            .broadcaster
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
        {
            chain.set_broadcaster(b);
        }
        let mut chains = self.chains.write().unwrap_or_else(|e| e.into_inner());
        chains
            .entry(record.ledger_id)
            .or_insert(chain)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_store::{AuditStore, MemoryStore};

    fn service() -> LedgerService {
        let store = Arc::new(MemoryStore::new());
        LedgerService::new(store, &ProtocolParams::dev_defaults())
    }

    #[test]
    fn create_for_election_builds_genesis() {
        let svc = service();
        let chain = svc.create_for_election("e1", "Election 1", 2).unwrap();

        let info = chain.info();
        assert_eq!(info.ledger_id, "election-e1");
        assert_eq!(info.total_blocks, 1);
        assert_eq!(info.genesis_hash, info.latest_hash);
        assert!(info.is_active);

        let blocks = chain.load_blocks().unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].index, 0);
        assert!(blocks[0].is_hash_valid());
    }

    #[test]
    fn duplicate_election_is_rejected() {
        let svc = service();
        svc.create_for_election("e1", "Election 1", 2).unwrap();
        let err = svc.create_for_election("e1", "Election 1 again", 2).unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateLedger(_)));
    }

    #[test]
    fn chain_lookup_is_cached() {
        let svc = service();
        svc.create_for_election("e1", "Election 1", 2).unwrap();
        let a = svc.chain("election-e1").unwrap();
        let b = svc.chain("election-e1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unknown_ledger_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.chain("election-missing").unwrap_err(),
            LedgerError::LedgerNotFound(_)
        ));
    }

    #[test]
    fn rehydrates_from_store_after_restart() {
        let store = Arc::new(MemoryStore::new());
        let params = ProtocolParams::dev_defaults();
        {
            let svc = LedgerService::new(store.clone(), &params);
            svc.create_for_election("e1", "Election 1", 2).unwrap();
        }
        let svc = LedgerService::new(store, &params);
        let chain = svc.chain("election-e1").unwrap();
        assert_eq!(chain.info().total_blocks, 1);
    }

    #[test]
    fn validate_chain_audits_outcome() {
        let store = Arc::new(MemoryStore::new());
        let svc = LedgerService::new(store.clone(), &ProtocolParams::dev_defaults());
        svc.create_for_election("e1", "Election 1", 2).unwrap();

        assert!(svc.validate_chain("election-e1").unwrap());
        let entries = store.audit_entries("election-e1").unwrap();
        assert!(entries
            .iter()
            .any(|e| e.action == AuditAction::ValidateChain && e.success));
    }

    #[test]
    fn list_active_reports_created_ledgers() {
        let svc = service();
        svc.create_for_election("b", "B", 2).unwrap();
        svc.create_for_election("a", "A", 2).unwrap();
        let active = svc.list_active().unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].ledger_id, "election-a");
    }
}
