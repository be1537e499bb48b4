//! Fundamental types for the ballot ledger.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: hashes, timestamps, actor identities, and protocol parameters.

pub mod actor;
pub mod hash;
pub mod params;
pub mod time;

pub use actor::ActorType;
pub use hash::{Hash256, HashParseError};
pub use params::ProtocolParams;
pub use time::Timestamp;
