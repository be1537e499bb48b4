//! Append-only audit log of ledger-affecting operations.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::StoreError;
use ballot_types::{ActorType, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The operations the ledger records for external reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CreateBlock,
    AddBlock,
    ReceiveBlock,
    ValidateChain,
    ResolveConflicts,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateBlock => "CREATE_BLOCK",
            Self::AddBlock => "ADD_BLOCK",
            Self::ReceiveBlock => "RECEIVE_BLOCK",
            Self::ValidateChain => "VALIDATE_CHAIN",
            Self::ResolveConflicts => "RESOLVE_CONFLICTS",
        }
    }
}

/// One immutable audit row.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub ledger_id: String,
    pub actor_type: ActorType,
    /// Truncated or derived identifier — never a raw voter identity.
    pub actor_id: String,
    pub details: Value,
    pub success: bool,
    #[serde(default)]
    pub error_message: String,
    /// Wall-clock duration of the operation, in seconds.
    pub execution_time_secs: f64,
    pub timestamp: Timestamp,
}

impl AuditEntry {
    /// Convenience constructor for a successful operation.
    pub fn success(
        action: AuditAction,
        ledger_id: &str,
        actor_type: ActorType,
        actor_id: &str,
        details: Value,
        execution_time: Duration,
    ) -> Self {
        Self {
            action,
            ledger_id: ledger_id.to_string(),
            actor_type,
            actor_id: actor_id.to_string(),
            details,
            success: true,
            error_message: String::new(),
            execution_time_secs: execution_time.as_secs_f64(),
            timestamp: Timestamp::now(),
        }
    }

    /// Convenience constructor for a failed operation.
    pub fn failure(
        action: AuditAction,
        ledger_id: &str,
        actor_type: ActorType,
        actor_id: &str,
        error_message: &str,
    ) -> Self {
        Self {
            action,
            ledger_id: ledger_id.to_string(),
            actor_type,
            actor_id: actor_id.to_string(),
            details: Value::Null,
            success: false,
            error_message: error_message.to_string(),
            execution_time_secs: 0.0,
            timestamp: Timestamp::now(),
        }
    }
}

/// Count rollup over a ledger's audit trail.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AuditSummary {
    pub total_operations: u64,
    pub successful_operations: u64,
    pub failed_operations: u64,
    pub operations_by_action: BTreeMap<String, u64>,
}

/// Append-only audit sink. Entries are immutable once written.
pub trait AuditStore {
    fn record_audit(&self, entry: AuditEntry) -> Result<(), StoreError>;

    /// All entries for a ledger, oldest first.
    fn audit_entries(&self, ledger_id: &str) -> Result<Vec<AuditEntry>, StoreError>;

    /// Aggregate counts for a ledger's audit trail.
    fn audit_summary(&self, ledger_id: &str) -> Result<AuditSummary, StoreError> {
        let mut summary = AuditSummary::default();
        for entry in self.audit_entries(ledger_id)? {
            summary.total_operations += 1;
            if entry.success {
                summary.successful_operations += 1;
            } else {
                summary.failed_operations += 1;
            }
            *summary
                .operations_by_action
                .entry(entry.action.as_str().to_string())
                .or_insert(0) += 1;
        }
        Ok(summary)
    }
}
