//! Burn-to-mint workflow (XFG → HEAT)
//!
//! Burns a preset amount on the Fuego chain, waits out a confirmation
//! window, collects an Elderfier consensus proof from the wallet service and
//! feeds all of it to the external STARK prover. The prover being absent is
//! not fatal: the workflow prints the manual invocation and completes with a
//! caveat.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::core::{xfg_to_atomic, LogAggregator};
use crate::services::supervisor::WALLET_RPC_PORT;
use crate::traits::{ProofGenerator, RpcGateway};
use crate::workflows::{field_as_string, WorkflowReport};

/// Smallest burn the bridge accepts, in XFG.
pub const MIN_BURN_XFG: f64 = 0.8;

/// The large burn preset, in XFG.
pub const LARGE_BURN_XFG: f64 = 800.0;

/// Confirmation ticks waited after the burn deposit.
pub const CONFIRMATION_TICKS: u32 = 10;

const TAG: &str = "BURN";

/// The two offered burn presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurnAmount {
    Minimum,
    Large,
}

impl BurnAmount {
    pub fn xfg(&self) -> f64 {
        match self {
            BurnAmount::Minimum => MIN_BURN_XFG,
            BurnAmount::Large => LARGE_BURN_XFG,
        }
    }

    fn describe(&self) -> String {
        match self {
            BurnAmount::Minimum => format!("Small burn ({MIN_BURN_XFG} XFG)"),
            BurnAmount::Large => format!("Large burn ({LARGE_BURN_XFG} XFG)"),
        }
    }
}

/// Burn-to-mint workflow.
pub struct BurnToMint<G, P> {
    gateway: Arc<G>,
    prover: Arc<P>,
    logs: LogAggregator,
    wallet_port: u16,
    confirmation_ticks: u32,
    tick_interval: Duration,
}

impl<G: RpcGateway, P: ProofGenerator> BurnToMint<G, P> {
    pub fn new(gateway: Arc<G>, prover: Arc<P>, logs: LogAggregator) -> Self {
        Self {
            gateway,
            prover,
            logs,
            wallet_port: WALLET_RPC_PORT,
            confirmation_ticks: CONFIRMATION_TICKS,
            tick_interval: Duration::from_secs(1),
        }
    }

    /// Configure the wallet RPC port (fluent API)
    pub fn with_wallet_port(mut self, port: u16) -> Self {
        self.wallet_port = port;
        self
    }

    /// Configure the confirmation wait (fluent API); tests shrink this.
    pub fn with_confirmation_timing(mut self, ticks: u32, interval: Duration) -> Self {
        self.confirmation_ticks = ticks;
        self.tick_interval = interval;
        self
    }

    /// Run the burn sequence. Aborts on deposit or consensus failure; the
    /// confirmation wait cannot fail.
    pub async fn run(&self, amount: BurnAmount) -> WorkflowReport {
        let mut report = WorkflowReport::new("burn-to-mint");
        let logs = &self.logs;

        let amount_xfg = amount.xfg();
        let amount_atomic = xfg_to_atomic(amount_xfg);
        logs.append(TAG, &format!("Selected: {}", amount.describe())).await;
        report.complete("select-amount", Some(format!("{amount_xfg} XFG")));

        logs.append(TAG, "Step 1/4: Creating burn deposit...").await;
        let deposit = match self
            .gateway
            .call_wallet(
                self.wallet_port,
                "create_burn_deposit",
                json!({"amount": amount_atomic}),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                logs.append(TAG, &format!("❌ Burn failed: {e}")).await;
                report.fail("burn-deposit", e.to_string());
                return report;
            }
        };
        let tx_hash = match field_as_string(&deposit, "tx_hash") {
            Some(hash) => hash,
            None => {
                logs.append(TAG, "❌ Burn response carried no tx_hash").await;
                report.fail("burn-deposit", "deposit response missing tx_hash");
                return report;
            }
        };
        logs.append(TAG, &format!("✅ Burn tx created: {tx_hash}")).await;
        report.complete("burn-deposit", Some(tx_hash.clone()));

        // A fixed delay as a confirmation proxy, not an actual check.
        logs.append(TAG, "Step 2/4: Waiting for confirmations...").await;
        for tick in 1..=self.confirmation_ticks {
            logs.append(
                TAG,
                &format!("  Confirmation {tick}/{}...", self.confirmation_ticks),
            )
            .await;
            tokio::time::sleep(self.tick_interval).await;
        }
        logs.append(TAG, "✅ Transaction confirmed").await;
        report.complete("confirmations", None);

        logs.append(TAG, "Step 3/4: Requesting Elderfier consensus...").await;
        let consensus = match self
            .gateway
            .call_wallet(
                self.wallet_port,
                "request_elderfier_consensus",
                json!({"tx_hash": tx_hash, "amount": amount_atomic}),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                logs.append(TAG, &format!("❌ Consensus request failed: {e}")).await;
                report.fail("consensus-proof", e.to_string());
                return report;
            }
        };
        let eldernode_proof = match field_as_string(&consensus, "eldernode_proof") {
            Some(proof) => proof,
            None => {
                logs.append(TAG, "❌ Consensus response carried no eldernode_proof")
                    .await;
                report.fail("consensus-proof", "response missing eldernode_proof");
                return report;
            }
        };
        logs.append(TAG, "✅ Elderfier consensus received").await;
        logs.append(TAG, &format!("  Proof: {}...", prefix(&eldernode_proof, 32)))
            .await;
        report.complete("consensus-proof", Some(eldernode_proof.clone()));

        logs.append(TAG, "Step 4/4: Generating XFG-STARK proof...").await;
        if self.prover.locate().is_none() {
            logs.append(TAG, "⚠️  xfg-stark CLI not found").await;
            logs.append(TAG, "  Manual steps:").await;
            logs.append(TAG, "    $ xfg-stark generate-proof \\").await;
            logs.append(TAG, &format!("        --tx-hash {tx_hash} \\")).await;
            logs.append(TAG, &format!("        --amount {amount_atomic} \\")).await;
            logs.append(TAG, &format!("        --eldernode-proof {eldernode_proof}"))
                .await;
            report.warn("stark-proof", "xfg-stark not installed; manual invocation printed");
        } else {
            logs.append(TAG, "  → Running: xfg-stark generate-proof").await;
            match self
                .prover
                .generate_proof(&tx_hash, amount_atomic, &eldernode_proof)
                .await
            {
                Ok(output) => {
                    logs.append(TAG, "✅ STARK proof generated successfully").await;
                    logs.append(TAG, &format!("  Output: {}...", prefix(&output, 100)))
                        .await;
                    report.complete("stark-proof", Some(output));

                    logs.append(TAG, "🎉 Burn2Mint preparation complete").await;
                    logs.append(TAG, "Next: call claimHEAT() on the L2 with the STARK proof and the Eldernode proof")
                        .await;
                }
                Err(e) => {
                    logs.append(TAG, "❌ STARK generation failed").await;
                    logs.append(TAG, &e.to_string()).await;
                    report.fail("stark-proof", e.to_string());
                    return report;
                }
            }
        }

        logs.append(TAG, "Burn2Mint flow complete").await;
        report
    }
}

/// First `n` characters, safe for short strings.
fn prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}
