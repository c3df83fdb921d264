//! Main entry point for the fuego-console binary

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fuego_console::{
    ConsoleResult, HttpRpcGateway, LogAggregator, ProcessSupervisor, Shell, StarkProofTool,
    NODE_RPC_PORT, WALLET_RPC_PORT,
};

/// Operator console for the Fuego node and wallet daemons
#[derive(Parser)]
#[command(name = "fuego-console")]
#[command(about = "Supervises the Fuego daemons and drives staking and burn-to-mint workflows")]
pub struct Args {
    /// Node daemon RPC port
    #[arg(long, default_value_t = NODE_RPC_PORT)]
    pub node_rpc_port: u16,

    /// Wallet daemon RPC port
    #[arg(long, default_value_t = WALLET_RPC_PORT)]
    pub wallet_rpc_port: u16,

    /// Directory holding the daemon binaries (defaults to build/src, then PATH)
    #[arg(long)]
    pub bin_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[tokio::main]
async fn main() -> ConsoleResult<()> {
    let args = Args::parse();

    // The shell owns stdout; tracing goes to stderr so the menu stays readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "fuego_console={},reqwest=warn",
            args.log_level
        )))
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let logs = LogAggregator::new();
    logs.append("CONSOLE", "🔥 Fuego Console ready").await;

    let gateway = Arc::new(HttpRpcGateway::new());
    let supervisor = Arc::new(
        ProcessSupervisor::new(Arc::clone(&gateway), logs.clone())
            .with_ports(args.node_rpc_port, args.wallet_rpc_port)
            .with_bin_dir(args.bin_dir.clone()),
    );
    let prover = Arc::new(StarkProofTool::new().with_bin_dir(args.bin_dir));

    let shell = Shell::new(supervisor, gateway, prover, logs)
        .with_ports(args.node_rpc_port, args.wallet_rpc_port);
    shell.run().await
}
