//! Nonce search with a difficulty safety valve.

use std::time::{Duration, Instant};

use ballot_types::Hash256;

use crate::validator::meets_difficulty;

/// Result of a successful nonce search.
#[derive(Clone, Debug)]
pub struct MiningOutcome {
    pub nonce: u64,
    pub hash: Hash256,
    /// Difficulty the hash actually satisfies. Lower than the requested
    /// difficulty only when the safety valve engaged.
    pub effective_difficulty: u8,
    /// Total hash evaluations across all valve rounds.
    pub attempts: u64,
    pub elapsed: Duration,
}

impl MiningOutcome {
    pub fn valve_engaged(&self, requested: u8) -> bool {
        self.effective_difficulty < requested
    }
}

/// Single-threaded CPU miner.
///
/// The search increments the nonce monotonically from zero. If no valid
/// nonce is found within `max_attempts`, the difficulty is lowered by one
/// (never below `floor`) and the nonce resets. The valve is a liveness
/// guard against miscalibrated difficulty — the outcome records the
/// effective difficulty so callers can see it engaged.
#[derive(Clone, Copy, Debug)]
pub struct Miner {
    max_attempts: u64,
    floor: u8,
}

impl Miner {
    pub fn new(max_attempts: u64, floor: u8) -> Self {
        Self {
            max_attempts,
            floor: floor.max(1),
        }
    }

    /// Search for a nonce such that `hash_for(nonce)` meets `difficulty`.
    ///
    /// `hash_for` must be a pure function of the nonce — the caller fixes
    /// every other hash input (including the Merkle root) before the search
    /// begins.
    pub fn mine_with<F>(&self, difficulty: u8, hash_for: F) -> MiningOutcome
    where
        F: Fn(u64) -> Hash256,
    {
        let started = Instant::now();
        let mut effective = difficulty.max(self.floor);
        let mut nonce = 0u64;
        let mut round_attempts = 0u64;
        let mut total_attempts = 0u64;

        loop {
            let hash = hash_for(nonce);
            round_attempts += 1;
            total_attempts += 1;

            if meets_difficulty(&hash, effective) {
                let elapsed = started.elapsed();
                tracing::info!(
                    nonce,
                    hash = %hash,
                    attempts = total_attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "block mined"
                );
                return MiningOutcome {
                    nonce,
                    hash,
                    effective_difficulty: effective,
                    attempts: total_attempts,
                    elapsed,
                };
            }

            if round_attempts >= self.max_attempts && effective > self.floor {
                effective -= 1;
                nonce = 0;
                round_attempts = 0;
                tracing::warn!(
                    new_difficulty = effective,
                    attempts = total_attempts,
                    "mining exceeded attempt bound, lowering difficulty"
                );
                continue;
            }

            nonce = nonce.wrapping_add(1);
        }
    }
}

impl Default for Miner {
    fn default() -> Self {
        Self::new(10_000_000, 1)
    }
}
