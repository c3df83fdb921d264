//! Line-oriented operator shell
//!
//! Thin layer over the supervisor, gateway and workflows: renders the menu,
//! reads selections and parameters from stdin, and forwards them. All real
//! behavior lives below this module.

use std::io::{self, Write};
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::watch;

use crate::core::{xfg_to_atomic, LogAggregator, TelemetrySnapshot};
use crate::error::ConsoleResult;
use crate::services::supervisor::{ProcessKind, ProcessSupervisor, NODE_RPC_PORT, WALLET_RPC_PORT};
use crate::traits::{ProofGenerator, RpcGateway};
use crate::workflows::{BurnAmount, BurnToMint, StakeRegistration};

const TAG: &str = "CONSOLE";

type InputLines = Lines<BufReader<Stdin>>;

pub struct Shell<G: RpcGateway + 'static, P: ProofGenerator + 'static> {
    supervisor: Arc<ProcessSupervisor<G>>,
    gateway: Arc<G>,
    prover: Arc<P>,
    logs: LogAggregator,
    /// Held for the whole session so the poller's updates are observable.
    telemetry: watch::Receiver<TelemetrySnapshot>,
    node_port: u16,
    wallet_port: u16,
}

impl<G: RpcGateway + 'static, P: ProofGenerator + 'static> Shell<G, P> {
    pub fn new(
        supervisor: Arc<ProcessSupervisor<G>>,
        gateway: Arc<G>,
        prover: Arc<P>,
        logs: LogAggregator,
    ) -> Self {
        let telemetry = supervisor.telemetry();
        Self {
            supervisor,
            gateway,
            prover,
            logs,
            telemetry,
            node_port: NODE_RPC_PORT,
            wallet_port: WALLET_RPC_PORT,
        }
    }

    /// Configure the daemon RPC ports (fluent API)
    pub fn with_ports(mut self, node_port: u16, wallet_port: u16) -> Self {
        self.node_port = node_port;
        self.wallet_port = wallet_port;
        self
    }

    /// Run the menu loop until quit, Ctrl+C or end of input, then stop any
    /// daemons we started.
    pub async fn run(&self) -> ConsoleResult<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            self.render().await;
            print!("> ");
            io::stdout().flush()?;

            let selection = tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                line = lines.next_line() => match line? {
                    Some(line) => line,
                    None => break,
                },
            };

            if !self.dispatch(selection.trim(), &mut lines).await? {
                break;
            }
        }

        self.supervisor.stop_all().await;
        Ok(())
    }

    async fn render(&self) {
        println!();
        println!("🔥 Fuego Console");
        println!("  [1] Start node          [2] Stop node          [3] Node status");
        println!("  [4] Start wallet RPC    [5] Stop wallet RPC");
        println!("  [6] Create wallet       [7] Get balance        [8] Send transaction");
        println!("  [9] Stake status       [10] Elder inbox");
        println!(" [11] Register Elderfier stake");
        println!(" [12] Burn2Mint (XFG → HEAT)");
        println!(" [13] Show logs           [0] Quit");

        if self.supervisor.is_running(ProcessKind::Node).await {
            let telemetry = self.telemetry.borrow().clone();
            println!(
                "Node: running | Height: {} | Peers: {}",
                telemetry.height, telemetry.peer_count
            );
        } else {
            println!("Node: stopped");
        }
        if self.supervisor.is_running(ProcessKind::Wallet).await {
            println!("Wallet RPC: running");
        } else {
            println!("Wallet RPC: stopped");
        }
    }

    /// Handle one selection. Returns `false` when the operator quits.
    async fn dispatch(&self, selection: &str, lines: &mut InputLines) -> ConsoleResult<bool> {
        match selection {
            "1" => {
                let _ = self.supervisor.start(ProcessKind::Node).await;
            }
            "2" => {
                self.supervisor.stop(ProcessKind::Node).await;
            }
            "3" => self.node_status().await,
            "4" => {
                let _ = self.supervisor.start(ProcessKind::Wallet).await;
            }
            "5" => {
                self.supervisor.stop(ProcessKind::Wallet).await;
            }
            "6" => {
                self.wallet_op("Create wallet", "create_address", json!({})).await;
            }
            "7" => {
                self.wallet_op("Balance", "get_balance", json!({})).await;
            }
            "8" => self.send_transaction(lines).await?,
            "9" => {
                self.wallet_op("Stake status", "get_stake_status", json!({})).await;
            }
            "10" => {
                self.wallet_op("Elder inbox", "get_elder_inbox", json!({})).await;
            }
            "11" => self.stake_workflow(lines).await?,
            "12" => self.burn_workflow(lines).await?,
            "13" => self.show_logs(lines).await?,
            "0" | "q" | "quit" => return Ok(false),
            "" => {}
            other => {
                println!("Unknown selection: {other}");
            }
        }
        Ok(true)
    }

    async fn node_status(&self) {
        match self.gateway.node_status(self.node_port).await {
            Ok(snapshot) => {
                self.logs
                    .append(
                        TAG,
                        &format!("Height: {}, Peers: {}", snapshot.height, snapshot.peer_count),
                    )
                    .await;
            }
            Err(e) => {
                self.logs
                    .append(TAG, &format!("Failed to query node: {e}"))
                    .await;
            }
        }
    }

    /// One-shot wallet call with the outcome appended to the log.
    async fn wallet_op(&self, label: &str, method: &str, params: Value) {
        match self.gateway.call_wallet(self.wallet_port, method, params).await {
            Ok(result) => {
                self.logs.append(TAG, &format!("{label}: {result}")).await;
            }
            Err(e) => {
                self.logs.append(TAG, &format!("{label} failed: {e}")).await;
            }
        }
    }

    async fn send_transaction(&self, lines: &mut InputLines) -> ConsoleResult<()> {
        let Some(address) = prompt(lines, "Recipient address: ").await? else {
            return Ok(());
        };
        let Some(raw_amount) = prompt(lines, "Amount XFG: ").await? else {
            return Ok(());
        };
        let amount: f64 = match raw_amount.trim().parse() {
            Ok(amount) if amount > 0.0 => amount,
            _ => {
                self.logs
                    .append(TAG, &format!("Invalid amount: {}", raw_amount.trim()))
                    .await;
                return Ok(());
            }
        };

        self.logs
            .append(TAG, &format!("Sending {amount} XFG to {}...", address.trim()))
            .await;
        let params = json!({
            "transfers": [{"address": address.trim(), "amount": xfg_to_atomic(amount)}]
        });
        self.wallet_op("Tx sent", "send_transaction", params).await;
        Ok(())
    }

    async fn stake_workflow(&self, lines: &mut InputLines) -> ConsoleResult<()> {
        let Some(raw_amount) = prompt(lines, "Stake amount (XFG): ").await? else {
            return Ok(());
        };
        let amount: f64 = match raw_amount.trim().parse() {
            Ok(amount) => amount,
            Err(_) => {
                self.logs
                    .append(TAG, &format!("Invalid amount: {}", raw_amount.trim()))
                    .await;
                return Ok(());
            }
        };
        let Some(elder_id) = prompt(lines, "Elderfier ID (8 chars): ").await? else {
            return Ok(());
        };

        let workflow = StakeRegistration::new(Arc::clone(&self.gateway), self.logs.clone())
            .with_wallet_port(self.wallet_port);
        let report = workflow.run(amount, elder_id.trim()).await;
        self.logs
            .append(TAG, &format!("Workflow {}: {}", report.name(), report.outcome()))
            .await;
        Ok(())
    }

    async fn burn_workflow(&self, lines: &mut InputLines) -> ConsoleResult<()> {
        println!("Burn options:");
        println!("  1) Small burn: 0.8 XFG (minimum)");
        println!("  2) Large burn: 800 XFG");
        let Some(choice) = prompt(lines, "Choose (1 or 2): ").await? else {
            return Ok(());
        };
        let amount = if choice.trim() == "2" {
            BurnAmount::Large
        } else {
            BurnAmount::Minimum
        };

        let workflow = BurnToMint::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.prover),
            self.logs.clone(),
        )
        .with_wallet_port(self.wallet_port);
        let report = workflow.run(amount).await;
        self.logs
            .append(TAG, &format!("Workflow {}: {}", report.name(), report.outcome()))
            .await;
        Ok(())
    }

    async fn show_logs(&self, lines: &mut InputLines) -> ConsoleResult<()> {
        for entry in self.logs.snapshot().await {
            println!("{}", entry.display());
        }
        prompt(lines, "\nPress Enter to continue...").await?;
        Ok(())
    }
}

async fn prompt(lines: &mut InputLines, label: &str) -> ConsoleResult<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    Ok(lines.next_line().await?)
}
