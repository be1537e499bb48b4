use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Policy invariant, not a transient condition: a privileged actor can
    /// never inject ledger entries directly.
    #[error("admin actors are not allowed to append blocks directly")]
    PermissionDenied,

    #[error("ledger {0} is not active")]
    LedgerInactive(String),

    #[error("ledger not found: {0}")]
    LedgerNotFound(String),

    #[error("ledger already exists: {0}")]
    DuplicateLedger(String),

    #[error("voter has already cast a vote in this ledger")]
    AlreadyVoted,

    #[error("invalid block: {reason}")]
    InvalidBlock { reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] ballot_store::StoreError),

    #[error("block encoding error: {0}")]
    Encoding(String),
}
