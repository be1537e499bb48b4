//! Peer HTTP client abstraction.
//!
//! Consensus logic talks to peers through [`PeerClient`] so tests can swap
//! in an in-process fake; [`HttpPeerClient`] is the production `reqwest`
//! implementation with the protocol's bounded timeout.

use async_trait::async_trait;
use std::time::Duration;

use crate::wire::{ChainResponse, IncomingBlock};
use crate::ConsensusError;

/// Outbound calls the consensus engine makes to a peer.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// `GET {peer}/chain/{ledger_id}` — the peer's full copy of a ledger.
    async fn fetch_chain(
        &self,
        peer_url: &str,
        ledger_id: &str,
    ) -> Result<ChainResponse, ConsensusError>;

    /// `POST {peer}/receive_block` — offer a block to a peer. A 4xx from
    /// the peer (rejection) is not a transport failure and returns `Ok`.
    async fn send_block(
        &self,
        peer_url: &str,
        block: &IncomingBlock,
    ) -> Result<(), ConsensusError>;
}

/// `reqwest`-backed peer client. Every call is bounded by the protocol's
/// peer timeout so no background loop can hang on a dead peer.
pub struct HttpPeerClient {
    http: reqwest::Client,
}

impl HttpPeerClient {
    pub fn new(timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self { http }
    }

    fn network_err(peer: &str, e: impl std::fmt::Display) -> ConsensusError {
        ConsensusError::Network {
            peer: peer.to_string(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn fetch_chain(
        &self,
        peer_url: &str,
        ledger_id: &str,
    ) -> Result<ChainResponse, ConsensusError> {
        let url = format!("{peer_url}/chain/{ledger_id}");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::network_err(peer_url, e))?;

        if !response.status().is_success() {
            return Err(Self::network_err(
                peer_url,
                format!("chain fetch returned {}", response.status()),
            ));
        }
        response
            .json::<ChainResponse>()
            .await
            .map_err(|e| Self::network_err(peer_url, e))
    }

    async fn send_block(
        &self,
        peer_url: &str,
        block: &IncomingBlock,
    ) -> Result<(), ConsensusError> {
        let url = format!("{peer_url}/receive_block");
        let response = self
            .http
            .post(&url)
            .json(block)
            .send()
            .await
            .map_err(|e| Self::network_err(peer_url, e))?;

        if response.status().is_client_error() {
            // The peer saw and rejected the block — delivery succeeded.
            tracing::debug!(peer = peer_url, status = %response.status(), "peer rejected block");
            return Ok(());
        }
        if !response.status().is_success() {
            return Err(Self::network_err(
                peer_url,
                format!("receive_block returned {}", response.status()),
            ));
        }
        Ok(())
    }
}
