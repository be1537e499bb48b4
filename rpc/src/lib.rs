//! JSON-over-HTTP surface of a ballot node.
//!
//! Serves two audiences with one router: peer nodes (chain fetch, block
//! gossip, consensus trigger) and the vote-casting collaborator (vote
//! submission, receipt verification). Validation rejections map to 4xx with
//! structured bodies; transport-level problems never mask them.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::RpcError;
pub use server::{router, serve, AppState};
