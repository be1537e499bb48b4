//! Abstract storage traits for the ballot ledger.
//!
//! The core never talks to a database directly — it consumes these traits.
//! Blocks are stored as serialized bytes keyed by `(ledger_id, index)`; the
//! ledger crate owns the block structure and its encoding. An in-memory
//! backend ships here so a node can run standalone and tests stay hermetic.

pub mod audit;
pub mod block;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod receipt;

pub use audit::{AuditAction, AuditEntry, AuditStore, AuditSummary};
pub use block::BlockStore;
pub use error::StoreError;
pub use ledger::{LedgerRecord, LedgerStore};
pub use memory::MemoryStore;
pub use receipt::{ReceiptStore, VoteReceipt};

/// The full storage surface a node needs, as one object-safe bound.
pub trait Store: BlockStore + LedgerStore + AuditStore + ReceiptStore + Send + Sync {}

impl<T> Store for T where T: BlockStore + LedgerStore + AuditStore + ReceiptStore + Send + Sync {}
