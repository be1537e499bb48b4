//! Request handlers and their wire types.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use ballot_consensus::{BlockReception, ChainResponse, ChainSummary, IncomingBlock};
use ballot_ledger::{BallotPaper, VoteVerification};
use ballot_store::{AuditStore, AuditSummary};
use ballot_types::Hash256;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::server::AppState;
use crate::RpcError;

// ── Network ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct NodeListResponse {
    pub node_id: String,
    pub node_url: String,
    pub known_nodes: Vec<String>,
    pub total_nodes: usize,
}

/// GET /network/nodes
pub async fn list_nodes(State(state): State<AppState>) -> Json<NodeListResponse> {
    let known_nodes = state.engine.peers().list();
    Json(NodeListResponse {
        node_id: state.engine.node_id().to_string(),
        node_url: state.engine.node_url().to_string(),
        total_nodes: known_nodes.len(),
        known_nodes,
    })
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub node_url: String,
}

/// POST /network/nodes/register
pub async fn register_node(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Json<Value> {
    let added = state.engine.register_node(&request.node_url);
    let message = if added {
        format!("node registered: {}", request.node_url)
    } else {
        format!("node already registered: {}", request.node_url)
    };
    Json(json!({
        "message": message,
        "total_nodes": state.engine.peers().count(),
    }))
}

/// GET /network/consensus — trigger one conflict-resolution round.
pub async fn run_consensus(State(state): State<AppState>) -> Json<Value> {
    let replaced = state.engine.resolve_conflicts().await;
    if replaced {
        Json(json!({
            "status": "chain_replaced",
            "message": "local chain was replaced by a longer valid peer chain",
        }))
    } else {
        Json(json!({
            "status": "chain_kept",
            "message": "local chain is authoritative",
        }))
    }
}

#[derive(Serialize)]
pub struct LedgerStatus {
    pub ledger_id: String,
    pub name: String,
    pub total_blocks: u64,
    pub latest_hash: Hash256,
    pub difficulty: u8,
    pub is_active: bool,
    pub audit: AuditSummary,
}

#[derive(Serialize)]
pub struct NodeStatusResponse {
    pub node_id: String,
    pub node_url: String,
    pub is_running: bool,
    pub known_nodes: usize,
    pub stats: std::collections::BTreeMap<&'static str, u64>,
    pub ledgers: Vec<LedgerStatus>,
}

/// GET /network/status
pub async fn node_status(
    State(state): State<AppState>,
) -> Result<Json<NodeStatusResponse>, RpcError> {
    let mut ledgers = Vec::new();
    for record in state.ledgers.list_active()? {
        let audit = state
            .store
            .audit_summary(&record.ledger_id)
            .unwrap_or_default();
        ledgers.push(LedgerStatus {
            ledger_id: record.ledger_id,
            name: record.name,
            total_blocks: record.total_blocks,
            latest_hash: record.latest_hash,
            difficulty: record.difficulty,
            is_active: record.is_active,
            audit,
        });
    }

    Ok(Json(NodeStatusResponse {
        node_id: state.engine.node_id().to_string(),
        node_url: state.engine.node_url().to_string(),
        is_running: state.engine.is_running(),
        known_nodes: state.engine.peers().count(),
        stats: state.engine.stats().snapshot(),
        ledgers,
    }))
}

// ── Chain ────────────────────────────────────────────────────────────────

/// GET /chain/{ledger_id}
pub async fn get_chain(
    State(state): State<AppState>,
    Path(ledger_id): Path<String>,
) -> Result<Json<ChainResponse>, RpcError> {
    let chain = state.ledgers.chain(&ledger_id)?;
    let info = chain.info();
    let blocks = chain.load_blocks()?;
    Ok(Json(ChainResponse {
        ledger: ChainSummary {
            id: info.ledger_id,
            name: info.name,
            difficulty: info.difficulty,
            total_blocks: info.total_blocks,
        },
        blocks,
    }))
}

/// POST /receive_block — peer block ingestion.
///
/// Rejections are expected outcomes: 400 with a structured reason, so the
/// sending peer can tell "you are behind" from "your block is bad".
pub async fn receive_block(
    State(state): State<AppState>,
    Json(incoming): Json<IncomingBlock>,
) -> Result<(StatusCode, Json<Value>), RpcError> {
    match state.engine.receive_block(&incoming)? {
        BlockReception::Accepted => Ok((
            StatusCode::OK,
            Json(json!({"status": "block_accepted", "message": "block added"})),
        )),
        BlockReception::Rejected(reason) => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "status": "block_rejected",
                "reason": reason,
                "message": reason.to_string(),
            })),
        )),
    }
}

// ── Voting ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VoteRequest {
    pub ledger_id: String,
    pub constituency_id: String,
    pub candidate_id: String,
    pub voter_hash: Hash256,
}

/// POST /vote — synchronous inline mining, so the CPU-bound search runs on
/// the blocking pool instead of stalling the async executor.
pub async fn cast_vote(
    State(state): State<AppState>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<Value>, RpcError> {
    let voting = state.voting.clone();
    let ballot = BallotPaper {
        constituency_id: request.constituency_id,
        candidate_id: request.candidate_id,
        voter_hash: request.voter_hash,
    };
    let record = tokio::task::spawn_blocking(move || {
        voting.cast_vote(&request.ledger_id, &ballot)
    })
    .await
    .map_err(|e| RpcError::Server(format!("vote task failed: {e}")))??;

    Ok(Json(json!({
        "status": "vote_recorded",
        "receipt": record.receipt,
        "block_index": record.block.index,
        "block_hash": record.block.hash,
    })))
}

#[derive(Deserialize)]
pub struct VerifyVoteQuery {
    pub receipt_hash: Hash256,
    pub voter_hash: Hash256,
}

/// GET /vote/verify
pub async fn verify_vote(
    State(state): State<AppState>,
    Query(query): Query<VerifyVoteQuery>,
) -> Result<Json<VoteVerification>, RpcError> {
    let verdict = state
        .voting
        .verify_vote(&query.receipt_hash, &query.voter_hash)?;
    Ok(Json(verdict))
}

// ── Health ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// GET /health
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}
