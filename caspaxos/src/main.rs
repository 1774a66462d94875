use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use caspaxos::config::{Config, DEFAULT_LOG_LEVEL, DEFAULT_REQUEST_TIMEOUT_MS};
use caspaxos::network::tcp::{self, TcpClient};
use caspaxos::node::Node;
use clap::{Parser, Subcommand};
use log::info;
use tokio::net::TcpListener;

#[derive(Parser)]
#[clap(about = "Single-register CASPaxos node and client")]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run an acceptor and proposer for one cluster member
    Node {
        /// path to config file
        #[clap(long, default_value = "config.yaml")]
        config: String,
    },
    /// Ask a node to compare-and-swap the register
    Propose {
        /// address of any cluster node
        #[clap(long)]
        target: String,

        /// state the register is expected to be at; omit for an empty register
        #[clap(long)]
        expected: Option<u64>,

        /// new payload
        #[clap(long)]
        payload: String,

        /// milliseconds to wait for the node's reply
        #[clap(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_MS * 10)]
        timeout_ms: u64,
    },
}

fn init_logger(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Node { config } => {
            let config = Config::load(&config)
                .with_context(|| format!("failed to load config from {}", config))?;
            init_logger(&config.log_level);
            info!(
                "Node {} @{} with acceptors {:?}",
                config.node_id, config.listen, config.acceptors
            );

            let listener = TcpListener::bind(&config.listen)
                .await
                .with_context(|| format!("failed to bind {}", config.listen))?;
            let node = Arc::new(Node::<String>::from_config(&config));
            tcp::serve(listener, node, config.request_timeout).await?;
        }
        Command::Propose {
            target,
            expected,
            payload,
            timeout_ms,
        } => {
            init_logger(DEFAULT_LOG_LEVEL);
            let client = TcpClient::new(target, Duration::from_millis(timeout_ms));
            let reply = client.propose(expected, payload).await?;
            match reply.state {
                Some(state) => println!("{} {}", reply.ok, state),
                None => println!("{} -", reply.ok),
            }
        }
    }
    Ok(())
}
