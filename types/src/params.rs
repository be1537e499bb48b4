//! Protocol parameters shared by every node in a network.
//!
//! Difficulty and the timing intervals must agree across peers: a block mined
//! at a lower difficulty than a peer expects is rejected on reception.

use serde::{Deserialize, Serialize};

/// Tunable protocol parameters.
///
/// Deserialization falls back to the mainnet defaults field-by-field, so a
/// config file can override just one knob.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    /// Required number of leading `'0'` hex digits in a valid block hash.
    pub difficulty: u8,

    /// Floor the mining safety valve may lower difficulty to.
    pub min_difficulty: u8,

    /// Nonce attempts before the safety valve reduces difficulty by one.
    pub max_mine_attempts: u64,

    /// Seconds between background conflict-resolution rounds.
    pub sync_interval_secs: u64,

    /// Seconds between miner-loop wakeups (miner nodes only).
    pub mining_interval_secs: u64,

    /// Timeout for every peer-to-peer HTTP call, in seconds.
    pub peer_timeout_secs: u64,

    /// Upper bound on queued pending payloads for the miner loop.
    pub pending_queue_limit: usize,
}

impl ProtocolParams {
    /// Production defaults. Difficulty 4 keeps inline mining sub-second on
    /// commodity hardware while still making tampering expensive.
    pub fn mainnet_defaults() -> Self {
        Self {
            difficulty: 4,
            min_difficulty: 1,
            max_mine_attempts: 10_000_000,
            sync_interval_secs: 30,
            mining_interval_secs: 10,
            peer_timeout_secs: 5,
            pending_queue_limit: 1024,
        }
    }

    /// Development defaults — low difficulty for fast local iteration.
    pub fn dev_defaults() -> Self {
        Self {
            difficulty: 2,
            sync_interval_secs: 5,
            mining_interval_secs: 2,
            ..Self::mainnet_defaults()
        }
    }
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self::mainnet_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_difficulty_is_four() {
        let params = ProtocolParams::mainnet_defaults();
        assert_eq!(params.difficulty, 4);
        assert_eq!(params.min_difficulty, 1);
        assert_eq!(params.peer_timeout_secs, 5);
    }

    #[test]
    fn dev_defaults_lower_difficulty() {
        let params = ProtocolParams::dev_defaults();
        assert!(params.difficulty < ProtocolParams::mainnet_defaults().difficulty);
        assert_eq!(params.max_mine_attempts, 10_000_000);
    }
}
