//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ballot_consensus::ConsensusError;
use ballot_ledger::LedgerError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Ledger(e) => ledger_status(e),
            Self::Consensus(ConsensusError::Ledger(e)) => ledger_status(e),
            Self::Consensus(_) => StatusCode::BAD_GATEWAY,
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn ledger_status(e: &LedgerError) -> StatusCode {
    match e {
        LedgerError::PermissionDenied => StatusCode::FORBIDDEN,
        LedgerError::LedgerInactive(_) => StatusCode::FORBIDDEN,
        LedgerError::LedgerNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::AlreadyVoted => StatusCode::CONFLICT,
        LedgerError::DuplicateLedger(_) => StatusCode::CONFLICT,
        LedgerError::InvalidBlock { .. } => StatusCode::BAD_REQUEST,
        LedgerError::Storage(_) | LedgerError::Encoding(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}
