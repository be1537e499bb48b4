//! Known-peer registry.
//!
//! Add-only and idempotent: peers are never removed (an unreachable peer
//! costs one logged timeout per sync round). The sorted set gives every
//! iteration a deterministic order, which makes conflict-resolution
//! tie-breaking reproducible across restarts.

use std::collections::BTreeSet;
use std::sync::RwLock;

/// Set of peer base URLs, excluding this node's own URL.
pub struct PeerRegistry {
    self_url: String,
    peers: RwLock<BTreeSet<String>>,
}

impl PeerRegistry {
    pub fn new(self_url: &str, seeds: &[String]) -> Self {
        let registry = Self {
            self_url: normalize(self_url),
            peers: RwLock::new(BTreeSet::new()),
        };
        for seed in seeds {
            registry.register(seed);
        }
        registry
    }

    /// Add a peer URL. Returns whether it was newly added; registering this
    /// node's own URL or an existing peer is a no-op.
    pub fn register(&self, url: &str) -> bool {
        let url = normalize(url);
        if url.is_empty() || url == self.self_url {
            return false;
        }
        self.write().insert(url)
    }

    /// All peers in sorted order.
    pub fn list(&self) -> Vec<String> {
        self.read().iter().cloned().collect()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.read().contains(&normalize(url))
    }

    pub fn count(&self) -> usize {
        self.read().len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeSet<String>> {
        self.peers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeSet<String>> {
        self.peers.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Trailing slashes would make `http://a:1/` and `http://a:1` distinct peers.
fn normalize(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let registry = PeerRegistry::new("http://self:7180", &[]);
        assert!(registry.register("http://peer-a:7180"));
        assert!(!registry.register("http://peer-a:7180"));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn self_url_is_never_registered() {
        let registry = PeerRegistry::new("http://self:7180", &[]);
        assert!(!registry.register("http://self:7180"));
        assert!(!registry.register("http://self:7180/"));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn seeds_are_registered_at_construction() {
        let registry = PeerRegistry::new(
            "http://self:7180",
            &["http://b:1".into(), "http://a:1".into(), "http://self:7180".into()],
        );
        assert_eq!(registry.list(), vec!["http://a:1", "http://b:1"]);
    }

    #[test]
    fn listing_is_sorted() {
        let registry = PeerRegistry::new("http://self:7180", &[]);
        registry.register("http://z:1");
        registry.register("http://a:1");
        registry.register("http://m:1");
        assert_eq!(registry.list(), vec!["http://a:1", "http://m:1", "http://z:1"]);
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let registry = PeerRegistry::new("http://self:7180", &[]);
        assert!(registry.register("http://peer:1/"));
        assert!(!registry.register("http://peer:1"));
        assert!(registry.contains("http://peer:1/"));
    }
}
