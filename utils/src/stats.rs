//! Node statistics counters.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter names used by the consensus engine. Registered up front so a
/// typo'd name shows up as a permanently-zero counter in `/network/status`
/// instead of a silent drop.
pub const ENGINE_COUNTERS: &[&str] = &[
    "blocks_appended",
    "blocks_received",
    "blocks_rejected",
    "broadcasts_sent",
    "broadcasts_failed",
    "chains_replaced",
    "sync_rounds",
    "peer_errors",
];

/// A fixed-name, thread-safe counter set.
///
/// Names are registered at construction; incrementing an unregistered name
/// is a silent no-op (reads return zero). Snapshots come out name-sorted.
pub struct StatsCounter {
    counters: BTreeMap<&'static str, AtomicU64>,
}

impl StatsCounter {
    pub fn new(names: &[&'static str]) -> Self {
        Self {
            counters: names.iter().map(|&n| (n, AtomicU64::new(0))).collect(),
        }
    }

    /// The standard engine counter set.
    pub fn for_engine() -> Self {
        Self::new(ENGINE_COUNTERS)
    }

    pub fn increment(&self, name: &str) {
        self.add(name, 1);
    }

    pub fn add(&self, name: &str, value: u64) {
        if let Some(counter) = self.counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
        }
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Name-sorted snapshot of all counters.
    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        self.counters
            .iter()
            .map(|(&k, v)| (k, v.load(Ordering::Relaxed)))
            .collect()
    }
}
