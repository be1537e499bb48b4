//! The consensus engine: peer registry, block gossip, reception validation,
//! longest-valid-chain resolution, and the background loops.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ballot_ledger::{Block, BlockBroadcaster, LedgerService};
use ballot_store::{BlockStore, Store};
use ballot_types::{ActorType, ProtocolParams};
use ballot_utils::StatsCounter;
use ballot_work::validate_proof;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};

use crate::wire::{BlockReception, IncomingBlock, RejectReason};
use crate::{validate_peer_chain, ConsensusError, PeerClient, PeerRegistry};

/// Outbound queue depth. Bursts beyond this drop with a logged warning —
/// broadcast is advisory and the sync loop repairs any gaps.
const OUTBOUND_QUEUE: usize = 256;

/// Static configuration of one node's consensus engine.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub node_id: String,
    /// Base URL peers use to reach this node.
    pub node_url: String,
    pub seed_peers: Vec<String>,
    /// Whether this node runs the periodic miner loop.
    pub is_miner: bool,
    pub params: ProtocolParams,
}

/// One node's view of the network.
///
/// Constructed once at process startup with injected configuration and
/// collaborators, then shared by reference. No process-global instance
/// exists.
pub struct ConsensusEngine {
    config: EngineConfig,
    peers: PeerRegistry,
    ledgers: Arc<LedgerService>,
    store: Arc<dyn Store>,
    client: Arc<dyn PeerClient>,
    running: AtomicBool,
    stats: StatsCounter,
    outbound_tx: mpsc::Sender<IncomingBlock>,
    /// Receiver parked here until `start` moves it into the fan-out task.
    outbound_rx: Mutex<Option<mpsc::Receiver<IncomingBlock>>>,
    pending: Mutex<VecDeque<(String, Value)>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ConsensusEngine {
    pub fn new(
        config: EngineConfig,
        ledgers: Arc<LedgerService>,
        store: Arc<dyn Store>,
        client: Arc<dyn PeerClient>,
    ) -> Arc<Self> {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE);
        let (shutdown_tx, _) = broadcast::channel(1);
        let peers = PeerRegistry::new(&config.node_url, &config.seed_peers);

        Arc::new(Self {
            config,
            peers,
            ledgers,
            store,
            client,
            running: AtomicBool::new(false),
            stats: StatsCounter::for_engine(),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            pending: Mutex::new(VecDeque::new()),
            shutdown_tx,
        })
    }

    pub fn node_id(&self) -> &str {
        &self.config.node_id
    }

    pub fn node_url(&self) -> &str {
        &self.config.node_url
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    pub fn stats(&self) -> &StatsCounter {
        &self.stats
    }

    /// Register a peer URL; idempotent, returns whether it was new.
    pub fn register_node(&self, url: &str) -> bool {
        let added = self.peers.register(url);
        if added {
            tracing::info!(peer = url, "registered peer");
        }
        added
    }

    // ── Block reception ────────────────────────────────────────────────

    /// Validate and commit a block offered by a peer.
    ///
    /// Validation order is a protocol contract — duplicate, linkage, proof
    /// of work — and nothing is persisted until all three pass. Duplicates
    /// are a no-op rejection, not an error.
    pub fn receive_block(
        &self,
        incoming: &IncomingBlock,
    ) -> Result<BlockReception, ConsensusError> {
        let chain = self.ledgers.chain(&incoming.ledger_id)?;
        let block = &incoming.block;
        let ledger_id = &incoming.ledger_id;

        if self
            .store
            .block_exists(ledger_id, &block.hash, block.index)?
        {
            self.stats.increment("blocks_rejected");
            return Ok(BlockReception::Rejected(RejectReason::AlreadyExists));
        }

        let has_previous = block.index > 0
            && self
                .store
                .block_exists(ledger_id, &block.previous_hash, block.index - 1)?;
        if !has_previous {
            self.stats.increment("blocks_rejected");
            return Ok(BlockReception::Rejected(RejectReason::PreviousBlockMismatch));
        }

        let difficulty = chain.info().difficulty;
        if !validate_proof(&block.calculate_hash(), &block.hash, difficulty) {
            self.stats.increment("blocks_rejected");
            return Ok(BlockReception::Rejected(RejectReason::InvalidProofOfWork));
        }

        chain.adopt_block(block, &self.config.node_id)?;
        self.stats.increment("blocks_received");
        tracing::info!(ledger = %ledger_id, index = block.index, "accepted peer block");
        Ok(BlockReception::Accepted)
    }

    // ── Conflict resolution ────────────────────────────────────────────

    /// Longest-valid-chain resolution across all active ledgers.
    ///
    /// For each ledger, every peer's copy is fetched; among chains strictly
    /// longer than the best seen so far, the first fully valid one wins
    /// (peers iterate in sorted registry order, so equal-length ties break
    /// deterministically). Per-peer failures are logged and skipped. Never
    /// returns an error — total failure just reports "nothing replaced".
    pub async fn resolve_conflicts(&self) -> bool {
        self.stats.increment("sync_rounds");

        let ledgers = match self.ledgers.list_active() {
            Ok(list) => list,
            Err(e) => {
                tracing::error!(error = %e, "conflict resolution could not list ledgers");
                return false;
            }
        };
        let peers = self.peers.list();
        let mut replaced_any = false;

        for ledger in ledgers {
            let mut best: Option<Vec<Block>> = None;
            let mut best_len = ledger.total_blocks;

            for peer in &peers {
                let response = match self.client.fetch_chain(peer, &ledger.ledger_id).await {
                    Ok(r) => r,
                    Err(e) => {
                        self.stats.increment("peer_errors");
                        tracing::warn!(peer = %peer, error = %e, "peer unreachable during sync");
                        continue;
                    }
                };

                let len = response.blocks.len() as u64;
                if len <= best_len {
                    continue;
                }
                if !validate_peer_chain(&response.blocks, ledger.difficulty) {
                    tracing::warn!(
                        peer = %peer,
                        ledger = %ledger.ledger_id,
                        length = len,
                        "peer offered a longer but invalid chain"
                    );
                    continue;
                }
                best_len = len;
                best = Some(response.blocks);
            }

            let Some(blocks) = best else { continue };
            match self.ledgers.chain(&ledger.ledger_id) {
                Ok(chain) => match chain.replace_with(&blocks, &self.config.node_id) {
                    Ok(()) => {
                        replaced_any = true;
                        self.stats.increment("chains_replaced");
                        tracing::info!(
                            ledger = %ledger.ledger_id,
                            new_length = best_len,
                            "adopted longer peer chain"
                        );
                    }
                    Err(e) => {
                        tracing::error!(ledger = %ledger.ledger_id, error = %e, "chain replacement failed");
                    }
                },
                Err(e) => {
                    tracing::error!(ledger = %ledger.ledger_id, error = %e, "chain lookup failed during sync");
                }
            }
        }

        replaced_any
    }

    // ── Pending payloads (miner loop) ──────────────────────────────────

    /// Queue a payload for the periodic miner loop to commit as a system
    /// block. Bounded; callers see `QueueFull` instead of silent loss.
    pub fn enqueue_payload(&self, ledger_id: &str, payload: Value) -> Result<(), ConsensusError> {
        let mut pending = self.lock_pending();
        if pending.len() >= self.config.params.pending_queue_limit {
            return Err(ConsensusError::QueueFull);
        }
        pending.push_back((ledger_id.to_string(), payload));
        Ok(())
    }

    pub fn pending_len(&self) -> usize {
        self.lock_pending().len()
    }

    async fn drain_pending(&self) {
        loop {
            let item = self.lock_pending().pop_front();
            let Some((ledger_id, payload)) = item else { break };

            let chain = match self.ledgers.chain(&ledger_id) {
                Ok(chain) => chain,
                Err(e) => {
                    tracing::warn!(ledger = %ledger_id, error = %e, "dropping pending payload");
                    continue;
                }
            };

            let node_id = self.config.node_id.clone();
            let joined = tokio::task::spawn_blocking(move || {
                chain.append_block(payload, ActorType::System, &node_id)
            })
            .await;

            match joined {
                Ok(Ok(block)) => {
                    self.stats.increment("blocks_appended");
                    tracing::info!(ledger = %ledger_id, index = block.index, "mined pending payload");
                }
                Ok(Err(e)) => {
                    tracing::error!(ledger = %ledger_id, error = %e, "pending payload append failed");
                }
                Err(e) => {
                    tracing::error!(error = %e, "miner task panicked");
                }
            }
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────────

    /// Start the background tasks: broadcast fan-out, periodic sync, and
    /// (for miner nodes) the pending-payload miner. Idempotent.
    pub fn start(self: Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(rx) = self.lock_outbound_rx().take() {
            Self::spawn_fanout(self.clone(), rx);
        }
        Self::spawn_sync_loop(self.clone());
        if self.config.is_miner {
            Self::spawn_miner_loop(self.clone());
        }

        tracing::info!(
            node_id = %self.config.node_id,
            node_url = %self.config.node_url,
            peers = self.peers.count(),
            miner = self.config.is_miner,
            "consensus engine started"
        );
    }

    /// Signal every background loop to stop at its next iteration boundary.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown_tx.send(());
        tracing::info!(node_id = %self.config.node_id, "consensus engine stopped");
    }

    fn spawn_fanout(engine: Arc<Self>, mut rx: mpsc::Receiver<IncomingBlock>) {
        let mut shutdown = engine.shutdown_tx.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    item = rx.recv() => match item {
                        Some(block) => engine.fan_out(block).await,
                        None => break,
                    },
                    _ = shutdown.recv() => break,
                }
            }
        });
    }

    fn spawn_sync_loop(engine: Arc<Self>) {
        let mut shutdown = engine.shutdown_tx.subscribe();
        let period = Duration::from_secs(engine.config.params.sync_interval_secs.max(1));
        tokio::spawn(async move {
            // The first tick fires immediately — an initial sync on startup.
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        engine.resolve_conflicts().await;
                    }
                    _ = shutdown.recv() => break,
                }
            }
        });
    }

    fn spawn_miner_loop(engine: Arc<Self>) {
        let mut shutdown = engine.shutdown_tx.subscribe();
        let period = Duration::from_secs(engine.config.params.mining_interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        engine.drain_pending().await;
                    }
                    _ = shutdown.recv() => break,
                }
            }
        });
    }

    /// Send one block to every known peer, sequentially, swallowing
    /// per-peer failures.
    async fn fan_out(&self, item: IncomingBlock) {
        for peer in self.peers.list() {
            match self.client.send_block(&peer, &item).await {
                Ok(()) => {
                    self.stats.increment("broadcasts_sent");
                    tracing::debug!(peer = %peer, index = item.block.index, "block broadcast");
                }
                Err(e) => {
                    self.stats.increment("broadcasts_failed");
                    tracing::warn!(peer = %peer, error = %e, "block broadcast failed");
                }
            }
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, VecDeque<(String, Value)>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_outbound_rx(
        &self,
    ) -> std::sync::MutexGuard<'_, Option<mpsc::Receiver<IncomingBlock>>> {
        self.outbound_rx.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl BlockBroadcaster for ConsensusEngine {
    /// Queue a freshly appended block for fan-out. Non-blocking: a full or
    /// closed queue drops the broadcast (the sync loop converges later).
    fn broadcast_block(&self, ledger_id: &str, block: &Block) {
        let item = IncomingBlock {
            ledger_id: ledger_id.to_string(),
            block: block.clone(),
        };
        if self.outbound_tx.try_send(item).is_err() {
            self.stats.increment("broadcasts_failed");
            tracing::warn!(ledger = %ledger_id, "outbound broadcast queue full, dropping block");
        }
    }
}
