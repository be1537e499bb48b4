//! Per-election chain: the append path, external block adoption, chain
//! validity, and wholesale replacement.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Instant;

use ballot_store::{
    AuditAction, AuditEntry, AuditStore, BlockStore, LedgerRecord, LedgerStore, Store,
};
use ballot_types::ActorType;
use ballot_work::Miner;
use serde_json::{json, Value};

use crate::{Block, BlockBroadcaster, LedgerError};

/// One election-scoped ledger.
///
/// All shared mutable state (`latest_hash`, `total_blocks`, the block set)
/// changes only while the append lock is held. Mining happens under the
/// lock too — serialized mining throughput is the accepted simplification,
/// bounded by keeping difficulty low enough for sub-second searches.
pub struct Chain {
    store: Arc<dyn Store>,
    miner: Miner,
    info: RwLock<LedgerRecord>,
    append_lock: Mutex<()>,
    broadcaster: RwLock<Option<Arc<dyn BlockBroadcaster>>>,
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("miner", &self.miner)
            .field("info", &self.read_info())
            .finish_non_exhaustive()
    }
}

impl Chain {
    pub fn new(store: Arc<dyn Store>, miner: Miner, info: LedgerRecord) -> Self {
        Self {
            store,
            miner,
            info: RwLock::new(info),
            append_lock: Mutex::new(()),
            broadcaster: RwLock::new(None),
        }
    }

    /// Snapshot of the ledger's current state.
    pub fn info(&self) -> LedgerRecord {
        self.read_info()
    }

    pub fn set_broadcaster(&self, broadcaster: Arc<dyn BlockBroadcaster>) {
        *self.write_broadcaster() = Some(broadcaster);
    }

    fn read_info(&self) -> LedgerRecord {
        self.info.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn write_info(&self, record: LedgerRecord) {
        *self.info.write().unwrap_or_else(|e| e.into_inner()) = record;
    }

    fn write_broadcaster(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, Option<Arc<dyn BlockBroadcaster>>> {
        self.broadcaster.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_append(&self) -> MutexGuard<'_, ()> {
        self.append_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a new block carrying `payload`.
    ///
    /// Fails with [`LedgerError::PermissionDenied`] for `ActorType::Admin`
    /// before touching anything — direct administrative writes are never
    /// allowed. The sequence read-tail → mine → persist → update-tail runs
    /// under the append lock; the broadcast afterwards is best-effort and
    /// happens outside it.
    pub fn append_block(
        &self,
        payload: Value,
        actor: ActorType,
        actor_id: &str,
    ) -> Result<Block, LedgerError> {
        if actor == ActorType::Admin {
            return Err(LedgerError::PermissionDenied);
        }

        let block = {
            let _guard = self.lock_append();
            let started = Instant::now();

            let mut info = self.read_info();
            if !info.is_active {
                return Err(LedgerError::LedgerInactive(info.ledger_id));
            }

            // Indices are 0-based and contiguous, so the count is the next index.
            let mut block = Block::unmined(info.total_blocks, info.latest_hash, payload);
            let outcome = block.mine(&self.miner, info.difficulty);

            self.store
                .save_block(&info.ledger_id, block.index, &block.hash, &block.to_bytes()?)?;

            info.latest_hash = block.hash;
            info.total_blocks += 1;
            if let Err(e) = self.store.save_ledger(&info) {
                // Undo the block write so no half-applied append survives.
                let _ = self.store.delete_block(&info.ledger_id, &block.hash);
                return Err(e.into());
            }
            self.write_info(info.clone());

            let mut details = json!({
                "block_index": block.index,
                "mining_attempts": outcome.attempts,
            });
            if outcome.valve_engaged(info.difficulty) {
                details["effective_difficulty"] = json!(outcome.effective_difficulty);
            }
            self.audit(AuditEntry::success(
                AuditAction::AddBlock,
                &info.ledger_id,
                actor,
                actor_id,
                details,
                started.elapsed(),
            ));

            block
        };

        self.broadcast(&block);
        Ok(block)
    }

    /// Adopt an externally validated block (the persistence half of peer
    /// block reception — the consensus engine validates before calling).
    ///
    /// `total_blocks` advances with `max`, tolerating out-of-order arrival.
    pub fn adopt_block(&self, block: &Block, node_id: &str) -> Result<(), LedgerError> {
        let _guard = self.lock_append();
        let started = Instant::now();

        let mut info = self.read_info();
        self.store
            .save_block(&info.ledger_id, block.index, &block.hash, &block.to_bytes()?)?;

        info.latest_hash = block.hash;
        info.total_blocks = info.total_blocks.max(block.index + 1);
        self.store.save_ledger(&info)?;
        self.write_info(info.clone());

        self.audit(AuditEntry::success(
            AuditAction::ReceiveBlock,
            &info.ledger_id,
            ActorType::Node,
            node_id,
            json!({"source": "p2p_network", "block_index": block.index}),
            started.elapsed(),
        ));
        Ok(())
    }

    /// Replace the entire block set with `blocks`, atomically with the
    /// counter updates. Used only when conflict resolution adopts a longer
    /// valid peer chain.
    pub fn replace_with(&self, blocks: &[Block], node_id: &str) -> Result<(), LedgerError> {
        let Some(last) = blocks.last() else {
            return Err(LedgerError::InvalidBlock {
                reason: "replacement chain is empty".into(),
            });
        };

        let _guard = self.lock_append();
        let started = Instant::now();

        let mut info = self.read_info();
        self.store.delete_blocks(&info.ledger_id)?;
        for block in blocks {
            self.store
                .save_block(&info.ledger_id, block.index, &block.hash, &block.to_bytes()?)?;
        }

        info.genesis_hash = blocks[0].hash;
        info.latest_hash = last.hash;
        info.total_blocks = blocks.len() as u64;
        self.store.save_ledger(&info)?;
        self.write_info(info.clone());

        self.audit(AuditEntry::success(
            AuditAction::ResolveConflicts,
            &info.ledger_id,
            ActorType::Node,
            node_id,
            json!({"replaced_blocks": blocks.len()}),
            started.elapsed(),
        ));
        Ok(())
    }

    /// Undo a freshly appended block (vote-submission rollback path).
    pub fn rollback_block(&self, block: &Block) -> Result<(), LedgerError> {
        let _guard = self.lock_append();

        let mut info = self.read_info();
        if info.latest_hash != block.hash {
            return Err(LedgerError::InvalidBlock {
                reason: "only the tail block can be rolled back".into(),
            });
        }
        self.store.delete_block(&info.ledger_id, &block.hash)?;
        info.latest_hash = block.previous_hash;
        info.total_blocks = info.total_blocks.saturating_sub(1);
        self.store.save_ledger(&info)?;
        self.write_info(info);
        Ok(())
    }

    /// All blocks in index order.
    pub fn load_blocks(&self) -> Result<Vec<Block>, LedgerError> {
        let info = self.read_info();
        let raw = self.store.load_blocks(&info.ledger_id)?;
        raw.iter().map(|bytes| Block::from_bytes(bytes)).collect()
    }

    /// Validate the whole chain: every block's stored hash must match its
    /// recomputed hash, and every `previous_hash` must link to its
    /// predecessor. Empty and single-genesis chains are valid.
    pub fn is_chain_valid(&self) -> Result<bool, LedgerError> {
        let blocks = self.load_blocks()?;
        for (i, block) in blocks.iter().enumerate() {
            if !block.is_hash_valid() {
                tracing::warn!(
                    ledger = %self.read_info().ledger_id,
                    index = block.index,
                    "block hash does not match its contents"
                );
                return Ok(false);
            }
            if i > 0 && block.previous_hash != blocks[i - 1].hash {
                tracing::warn!(
                    ledger = %self.read_info().ledger_id,
                    index = block.index,
                    "previous-hash linkage broken"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn broadcast(&self, block: &Block) {
        let broadcaster = self
            .broadcaster
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(b) = broadcaster {
            b.broadcast_block(&self.read_info().ledger_id, block);
        }
    }

    fn audit(&self, entry: AuditEntry) {
        if let Err(e) = self.store.record_audit(entry) {
            tracing::error!(error = %e, "failed to write audit entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_store::{AuditStore, BlockStore, LedgerStore, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn new_chain(difficulty: u8) -> (Arc<MemoryStore>, Chain) {
        let store = Arc::new(MemoryStore::new());
        let genesis = crate::create_genesis_block("e1");
        store
            .save_block("l1", 0, &genesis.hash, &genesis.to_bytes().unwrap())
            .unwrap();
        let info = LedgerRecord {
            ledger_id: "l1".into(),
            name: "Election 1".into(),
            election_id: "e1".into(),
            genesis_hash: genesis.hash,
            latest_hash: genesis.hash,
            difficulty,
            total_blocks: 1,
            is_active: true,
        };
        store.save_ledger(&info).unwrap();
        let chain = Chain::new(store.clone(), Miner::default(), info);
        (store, chain)
    }

    #[test]
    fn admin_append_is_denied_without_mutation() {
        let (_, chain) = new_chain(1);
        let before = chain.info().total_blocks;
        let err = chain
            .append_block(json!({"x": 1}), ActorType::Admin, "admin-1")
            .unwrap_err();
        assert!(matches!(err, LedgerError::PermissionDenied));
        assert_eq!(chain.info().total_blocks, before);
    }

    #[test]
    fn inactive_ledger_rejects_appends() {
        let (store, chain) = new_chain(1);
        let mut info = chain.info();
        info.is_active = false;
        store.save_ledger(&info).unwrap();
        chain.write_info(info);

        let err = chain
            .append_block(json!({"x": 1}), ActorType::Voter, "v")
            .unwrap_err();
        assert!(matches!(err, LedgerError::LedgerInactive(_)));
    }

    #[test]
    fn append_links_to_genesis_and_updates_state() {
        let (_, chain) = new_chain(2);
        let genesis_hash = chain.info().genesis_hash;

        let block = chain
            .append_block(json!({"candidate": "A"}), ActorType::Voter, "v1")
            .unwrap();

        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, genesis_hash);
        assert!(block.hash.to_hex().starts_with("00"));

        let info = chain.info();
        assert_eq!(info.total_blocks, 2);
        assert_eq!(info.latest_hash, block.hash);
        assert!(chain.is_chain_valid().unwrap());
    }

    #[test]
    fn append_writes_audit_entry() {
        let (store, chain) = new_chain(1);
        chain
            .append_block(json!({"v": 1}), ActorType::Voter, "abcd1234")
            .unwrap();
        let entries = store.audit_entries("l1").unwrap();
        let add = entries
            .iter()
            .find(|e| e.action == AuditAction::AddBlock)
            .unwrap();
        assert!(add.success);
        assert_eq!(add.actor_id, "abcd1234");
    }

    #[test]
    fn concurrent_appends_never_share_an_index() {
        let (_, chain) = new_chain(1);
        let chain = Arc::new(chain);
        let indices = Arc::new(AtomicUsize::new(0));

        std::thread::scope(|s| {
            for t in 0..4 {
                let chain = chain.clone();
                let indices = indices.clone();
                s.spawn(move || {
                    for i in 0..3 {
                        chain
                            .append_block(json!({"t": t, "i": i}), ActorType::Voter, "v")
                            .unwrap();
                        indices.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });

        assert_eq!(indices.load(Ordering::Relaxed), 12);
        let blocks = chain.load_blocks().unwrap();
        assert_eq!(blocks.len(), 13);
        let mut seen: Vec<u64> = blocks.iter().map(|b| b.index).collect();
        seen.dedup();
        assert_eq!(seen.len(), 13, "duplicate index assigned");
        assert!(chain.is_chain_valid().unwrap());
    }

    #[test]
    fn tampered_block_invalidates_chain() {
        let (store, chain) = new_chain(1);
        chain
            .append_block(json!({"candidate": "A"}), ActorType::Voter, "v")
            .unwrap();

        // Mutate the stored payload without remining.
        let blocks = chain.load_blocks().unwrap();
        let mut tampered = blocks[1].clone();
        tampered.payload = json!({"candidate": "B"});
        store.delete_blocks("l1").unwrap();
        for b in [&blocks[0], &tampered] {
            store
                .save_block("l1", b.index, &b.hash, &b.to_bytes().unwrap())
                .unwrap();
        }

        assert!(!tampered.is_hash_valid());
        assert!(!chain.is_chain_valid().unwrap());
    }

    #[test]
    fn replace_with_swaps_whole_chain() {
        let (_, chain) = new_chain(1);
        chain
            .append_block(json!({"v": 1}), ActorType::Voter, "v")
            .unwrap();

        // Build a longer chain out-of-band.
        let (_, other) = new_chain(1);
        for i in 0..3 {
            other
                .append_block(json!({"other": i}), ActorType::Voter, "v")
                .unwrap();
        }
        let longer = other.load_blocks().unwrap();

        chain.replace_with(&longer, "node-2").unwrap();
        let info = chain.info();
        assert_eq!(info.total_blocks, 4);
        assert_eq!(info.latest_hash, longer[3].hash);
        assert_eq!(info.genesis_hash, longer[0].hash);
        assert!(chain.is_chain_valid().unwrap());
    }

    #[test]
    fn rollback_restores_previous_tail() {
        let (store, chain) = new_chain(1);
        let before = chain.info();
        let block = chain
            .append_block(json!({"v": 1}), ActorType::Voter, "v")
            .unwrap();

        chain.rollback_block(&block).unwrap();
        let info = chain.info();
        assert_eq!(info.total_blocks, before.total_blocks);
        assert_eq!(info.latest_hash, before.latest_hash);
        assert_eq!(store.block_count("l1").unwrap(), 1);
    }

    #[test]
    fn rollback_rejects_non_tail_blocks() {
        let (_, chain) = new_chain(1);
        let first = chain
            .append_block(json!({"v": 1}), ActorType::Voter, "v")
            .unwrap();
        chain
            .append_block(json!({"v": 2}), ActorType::Voter, "v")
            .unwrap();
        assert!(chain.rollback_block(&first).is_err());
    }

    #[test]
    fn broadcaster_receives_appended_blocks() {
        struct Recorder(AtomicUsize);
        impl BlockBroadcaster for Recorder {
            fn broadcast_block(&self, _ledger_id: &str, _block: &Block) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let (_, chain) = new_chain(1);
        let recorder = Arc::new(Recorder(AtomicUsize::new(0)));
        chain.set_broadcaster(recorder.clone());
        chain
            .append_block(json!({"v": 1}), ActorType::Voter, "v")
            .unwrap();
        assert_eq!(recorder.0.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn adopt_block_tolerates_out_of_order_totals() {
        let (_, chain) = new_chain(1);
        let genesis_hash = chain.info().latest_hash;

        let mut remote = Block::unmined(1, genesis_hash, json!({"r": 1}));
        remote.mine(&Miner::default(), 1);
        chain.adopt_block(&remote, "node-2").unwrap();

        let info = chain.info();
        assert_eq!(info.total_blocks, 2);
        assert_eq!(info.latest_hash, remote.hash);
        assert!(chain.is_chain_valid().unwrap());
    }
}
