//! Node configuration with TOML file support.

use ballot_types::ProtocolParams;
use serde::{Deserialize, Serialize};

use crate::NodeError;

/// Configuration for a ballot node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Unset fields fall back to the
/// serde defaults below; CLI flags override file values in the daemon.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Stable identifier of this node in audit entries and peer logs.
    #[serde(default = "default_node_id")]
    pub node_id: String,

    /// Address to bind the HTTP listener to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Port for the HTTP wire surface (peers and voting collaborator).
    #[serde(default = "default_port")]
    pub port: u16,

    /// URL peers should use to reach this node. Defaults to
    /// `http://{listen_addr}:{port}` when unset.
    #[serde(default)]
    pub node_url: Option<String>,

    /// Peer URLs to register at startup.
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,

    /// Whether this node runs the periodic miner loop.
    #[serde(default)]
    pub is_miner: bool,

    /// Protocol parameters (difficulty, intervals, timeouts).
    #[serde(default)]
    pub params: ProtocolParams,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_node_id() -> String {
    "node-1".to_string()
}

fn default_listen_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7180
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// The URL peers use to reach this node.
    pub fn advertised_url(&self) -> String {
        match &self.node_url {
            Some(url) => url.clone(),
            None => format!("http://{}:{}", self.listen_addr, self.port),
        }
    }

    /// The socket address to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.port)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            listen_addr: default_listen_addr(),
            port: default_port(),
            node_url: None,
            bootstrap_peers: Vec::new(),
            is_miner: false,
            params: ProtocolParams::default(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.port, 7180);
        assert_eq!(config.node_id, "node-1");
        assert_eq!(config.params.difficulty, 4);
        assert!(!config.is_miner);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            node_id = "node-7"
            port = 9000
            is_miner = true
            bootstrap_peers = ["http://peer-a:7180"]

            [params]
            difficulty = 2
            sync_interval_secs = 10
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.node_id, "node-7");
        assert_eq!(config.port, 9000);
        assert!(config.is_miner);
        assert_eq!(config.bootstrap_peers.len(), 1);
        assert_eq!(config.params.difficulty, 2);
        assert_eq!(config.params.sync_interval_secs, 10);
        // Untouched params keep their defaults.
        assert_eq!(config.params.peer_timeout_secs, 5);
    }

    #[test]
    fn advertised_url_prefers_explicit_value() {
        let mut config = NodeConfig::default();
        assert_eq!(config.advertised_url(), "http://127.0.0.1:7180");
        config.node_url = Some("http://public.example:80".into());
        assert_eq!(config.advertised_url(), "http://public.example:80");
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/ballot.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
