//! Router assembly and the serving loop.

use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use ballot_consensus::ConsensusEngine;
use ballot_ledger::{LedgerService, VotingService};
use ballot_store::Store;

use crate::handlers;
use crate::RpcError;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConsensusEngine>,
    pub ledgers: Arc<LedgerService>,
    pub voting: Arc<VotingService>,
    pub store: Arc<dyn Store>,
}

/// Build the full router: the peer wire surface plus the voting endpoints.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/network/nodes", get(handlers::list_nodes))
        .route("/network/nodes/register", post(handlers::register_node))
        .route("/network/consensus", get(handlers::run_consensus))
        .route("/network/status", get(handlers::node_status))
        .route("/chain/:ledger_id", get(handlers::get_chain))
        .route("/receive_block", post(handlers::receive_block))
        .route("/vote", post(handlers::cast_vote))
        .route("/vote/verify", get(handlers::verify_vote))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve the router until `shutdown` resolves.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), RpcError> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RpcError::Server(e.to_string()))
}
