//! The full ballot node.
//!
//! Wires the store, ledger service, voting service, consensus engine, and
//! HTTP surface into one process. The engine is an explicit value built here
//! at startup from injected configuration — nothing in the workspace holds a
//! process-global node.

pub mod config;
pub mod error;
pub mod node;
pub mod shutdown;

pub use config::NodeConfig;
pub use error::NodeError;
pub use node::BallotNode;
pub use shutdown::ShutdownController;
