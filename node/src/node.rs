//! Node orchestration: construct every subsystem, serve, shut down cleanly.

use std::sync::Arc;

use ballot_consensus::{ConsensusEngine, EngineConfig, HttpPeerClient};
use ballot_ledger::{Chain, LedgerService, VotingService};
use ballot_rpc::AppState;
use ballot_store::{MemoryStore, Store};
use tokio::task::JoinHandle;

use crate::{NodeConfig, NodeError, ShutdownController};

/// A running (or startable) ballot node.
pub struct BallotNode {
    config: NodeConfig,
    store: Arc<dyn Store>,
    ledgers: Arc<LedgerService>,
    voting: Arc<VotingService>,
    engine: Arc<ConsensusEngine>,
    shutdown: ShutdownController,
    server: Option<JoinHandle<Result<(), ballot_rpc::RpcError>>>,
}

impl BallotNode {
    /// Build a node from configuration. Nothing is spawned yet.
    ///
    /// Storage is the in-memory reference backend; a persistent deployment
    /// swaps in its own [`Store`] via [`BallotNode::with_store`].
    pub fn new(config: NodeConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Build a node on top of an externally provided store.
    pub fn with_store(config: NodeConfig, store: Arc<dyn Store>) -> Self {
        let ledgers = Arc::new(LedgerService::new(store.clone(), &config.params));
        let voting = Arc::new(VotingService::new(ledgers.clone(), store.clone()));

        let engine = ConsensusEngine::new(
            EngineConfig {
                node_id: config.node_id.clone(),
                node_url: config.advertised_url(),
                seed_peers: config.bootstrap_peers.clone(),
                is_miner: config.is_miner,
                params: config.params.clone(),
            },
            ledgers.clone(),
            store.clone(),
            Arc::new(HttpPeerClient::new(config.params.peer_timeout_secs)),
        );
        ledgers.set_broadcaster(engine.clone());

        Self {
            config,
            store,
            ledgers,
            voting,
            engine,
            shutdown: ShutdownController::new(),
            server: None,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<ConsensusEngine> {
        &self.engine
    }

    pub fn ledgers(&self) -> &Arc<LedgerService> {
        &self.ledgers
    }

    pub fn voting(&self) -> &Arc<VotingService> {
        &self.voting
    }

    /// Convenience for provisioning: create an election-scoped ledger.
    pub fn create_election(&self, election_id: &str, name: &str) -> Result<Arc<Chain>, NodeError> {
        Ok(self
            .ledgers
            .create_for_election(election_id, name, self.config.params.difficulty)?)
    }

    /// Bind the HTTP listener and start the engine's background loops.
    pub async fn start(&mut self) -> Result<(), NodeError> {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr()).await?;
        let local_addr = listener.local_addr()?;

        self.engine.clone().start();

        let state = AppState {
            engine: self.engine.clone(),
            ledgers: self.ledgers.clone(),
            voting: self.voting.clone(),
            store: self.store.clone(),
        };
        let mut shutdown_rx = self.shutdown.subscribe();
        self.server = Some(tokio::spawn(ballot_rpc::serve(listener, state, async move {
            let _ = shutdown_rx.recv().await;
        })));

        tracing::info!(
            node_id = %self.config.node_id,
            addr = %local_addr,
            url = %self.config.advertised_url(),
            miner = self.config.is_miner,
            "ballot node listening"
        );
        Ok(())
    }

    /// Run until an OS signal arrives, then stop.
    pub async fn run_until_signal(&mut self) -> Result<(), NodeError> {
        self.start().await?;
        self.shutdown.wait_for_signal().await;
        self.stop().await
    }

    /// Stop the engine loops and the HTTP server, waiting for the server to
    /// drain in-flight requests.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        self.engine.stop();
        self.shutdown.shutdown();

        if let Some(server) = self.server.take() {
            match server.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(NodeError::Rpc(e.to_string())),
                Err(e) => return Err(NodeError::Rpc(format!("server task failed: {e}"))),
            }
        }
        tracing::info!(node_id = %self.config.node_id, "ballot node stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_ledger::BallotPaper;
    use ballot_types::{Hash256, ProtocolParams};

    fn test_config() -> NodeConfig {
        NodeConfig {
            port: 0, // ephemeral
            params: ProtocolParams {
                difficulty: 1,
                ..ProtocolParams::dev_defaults()
            },
            ..NodeConfig::default()
        }
    }

    #[tokio::test]
    async fn node_starts_and_stops_cleanly() {
        let mut node = BallotNode::new(test_config());
        node.start().await.unwrap();
        assert!(node.engine().is_running());
        node.stop().await.unwrap();
        assert!(!node.engine().is_running());
    }

    #[tokio::test]
    async fn election_provisioning_and_voting_work_in_process() {
        let node = BallotNode::new(test_config());
        node.create_election("e1", "Election 1").unwrap();

        let record = node
            .voting()
            .cast_vote(
                "election-e1",
                &BallotPaper {
                    constituency_id: "KA-01".into(),
                    candidate_id: "NOTA".into(),
                    voter_hash: Hash256::new([1u8; 32]),
                },
            )
            .unwrap();
        assert_eq!(record.block.index, 1);

        let chain = node.ledgers().chain("election-e1").unwrap();
        assert!(chain.is_chain_valid().unwrap());
    }

    #[test]
    fn duplicate_election_is_rejected() {
        let node = BallotNode::new(test_config());
        node.create_election("e1", "Election 1").unwrap();
        assert!(node.create_election("e1", "Election 1").is_err());
    }
}
