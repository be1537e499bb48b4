use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("ledger error: {0}")]
    Ledger(#[from] ballot_ledger::LedgerError),

    #[error("storage error: {0}")]
    Store(#[from] ballot_store::StoreError),

    #[error("network error contacting {peer}: {reason}")]
    Network { peer: String, reason: String },

    #[error("pending queue is full")]
    QueueFull,
}
