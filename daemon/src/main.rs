//! Ballot daemon — entry point for running a ballot node.

use ballot_node::{BallotNode, NodeConfig};
use ballot_utils::LogFormat;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ballot-daemon", about = "Tamper-evident vote ledger node")]
struct Cli {
    /// Stable node identifier used in audit entries and peer logs.
    #[arg(long, env = "BALLOT_NODE_ID")]
    node_id: Option<String>,

    /// Address to bind the HTTP listener to.
    #[arg(long, env = "BALLOT_LISTEN_ADDR")]
    listen_addr: Option<String>,

    /// Port for the HTTP wire surface.
    #[arg(long, env = "BALLOT_PORT")]
    port: Option<u16>,

    /// Public URL peers should use to reach this node (defaults to the
    /// bind address).
    #[arg(long, env = "BALLOT_NODE_URL")]
    node_url: Option<String>,

    /// Peer URLs to register at startup (comma-separated).
    #[arg(long, env = "BALLOT_PEERS", value_delimiter = ',')]
    peers: Vec<String>,

    /// Run the periodic miner loop on this node.
    #[arg(long, env = "BALLOT_IS_MINER")]
    miner: bool,

    /// Proof-of-work difficulty (leading zero hex digits).
    #[arg(long, env = "BALLOT_DIFFICULTY")]
    difficulty: Option<u8>,

    /// Elections to provision at startup, as "id:name" pairs
    /// (comma-separated). Election administration proper lives outside
    /// this daemon.
    #[arg(long, env = "BALLOT_ELECTIONS", value_delimiter = ',')]
    elections: Vec<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "BALLOT_LOG_LEVEL")]
    log_level: String,

    /// Log format: "human" or "json".
    #[arg(long, default_value = "human", env = "BALLOT_LOG_FORMAT")]
    log_format: String,

    /// Path to a TOML configuration file. File settings are the base; CLI
    /// flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start the node.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the node until SIGINT/SIGTERM.
    Run,
}

fn merge_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = path.display().to_string();
            let config = NodeConfig::from_toml_file(&path)?;
            tracing::info!("loaded config from {path}");
            config
        }
        None => NodeConfig::default(),
    };

    if let Some(node_id) = &cli.node_id {
        config.node_id = node_id.clone();
    }
    if let Some(listen_addr) = &cli.listen_addr {
        config.listen_addr = listen_addr.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.node_url.is_some() {
        config.node_url = cli.node_url.clone();
    }
    if !cli.peers.is_empty() {
        config.bootstrap_peers = cli.peers.clone();
    }
    if cli.miner {
        config.is_miner = true;
    }
    if let Some(difficulty) = cli.difficulty {
        config.params.difficulty = difficulty;
    }
    config.log_level = cli.log_level.clone();
    config.log_format = cli.log_format.clone();
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    ballot_utils::init_tracing_with(LogFormat::from_config(&cli.log_format), &cli.log_level);

    let config = merge_config(&cli)?;

    match cli.command {
        Command::Node { action } => match action {
            NodeAction::Run => {
                let mut node = BallotNode::new(config);

                for entry in &cli.elections {
                    let (id, name) = match entry.split_once(':') {
                        Some((id, name)) => (id, name),
                        None => (entry.as_str(), entry.as_str()),
                    };
                    node.create_election(id, name)?;
                    tracing::info!(election = id, "provisioned election ledger");
                }

                node.run_until_signal().await?;
                tracing::info!("ballot daemon exited cleanly");
            }
        },
    }

    Ok(())
}
