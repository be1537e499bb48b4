use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("ledger error: {0}")]
    Ledger(#[from] ballot_ledger::LedgerError),

    #[error("consensus error: {0}")]
    Consensus(#[from] ballot_consensus::ConsensusError),

    #[error("store error: {0}")]
    Store(#[from] ballot_store::StoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("RPC server error: {0}")]
    Rpc(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
