//! Append-only vote ledger.
//!
//! One [`Chain`] exists per election. Every mutation goes through the
//! chain's append lock: no two concurrent appends can observe the same tail,
//! and chain replacement during conflict resolution is atomic with the
//! counter updates. Blocks are immutable once persisted — the only sanctioned
//! repair for a corrupt chain is wholesale replacement by a longer valid one.

pub mod block;
pub mod broadcast;
pub mod chain;
pub mod error;
pub mod genesis;
pub mod service;
pub mod voting;

pub use block::Block;
pub use broadcast::BlockBroadcaster;
pub use chain::Chain;
pub use error::LedgerError;
pub use genesis::create_genesis_block;
pub use service::LedgerService;
pub use voting::{BallotPaper, VoteRecord, VoteVerification, VotingService};
