//! Multi-node consensus for the ballot ledger.
//!
//! Eventually-consistent, longest-valid-chain design:
//! - Freshly mined blocks flood to every known peer (best-effort, bounded
//!   timeout, per-peer failures logged and swallowed).
//! - Received blocks are validated before any side effect: duplicate check,
//!   previous-hash linkage, proof of work — in that order.
//! - A periodic sync loop pulls every peer's copy of every active ledger and
//!   adopts the single longest chain that passes full validation, replacing
//!   the local block set wholesale.
//!
//! ## Module overview
//!
//! - [`engine`] — [`ConsensusEngine`]: peer registry, reception, resolution,
//!   background loops.
//! - [`peers`] — add-only, deterministic peer registry.
//! - [`client`] — [`PeerClient`] abstraction over peer HTTP calls, plus the
//!   `reqwest` implementation.
//! - [`validate`] — validation of peer-supplied chains.
//! - [`wire`] — the JSON wire format shared by client and server sides.

pub mod client;
pub mod engine;
pub mod error;
pub mod peers;
pub mod validate;
pub mod wire;

pub use client::{HttpPeerClient, PeerClient};
pub use engine::{ConsensusEngine, EngineConfig};
pub use error::ConsensusError;
pub use peers::PeerRegistry;
pub use validate::validate_peer_chain;
pub use wire::{BlockReception, ChainResponse, ChainSummary, IncomingBlock, RejectReason};
