//! Hashing primitives for the ballot ledger.
//!
//! Everything here is deterministic by contract: the canonical JSON encoding
//! and the hex rendering are protocol invariants shared by every node.

pub mod hash;
pub mod voter;

pub use hash::{canonical_hash, canonical_json, sha256_hex, sha256_str};
pub use voter::{derive_voter_hash, VoterHash};
