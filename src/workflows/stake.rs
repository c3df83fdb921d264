//! Elderfier stake registration workflow
//!
//! Binds a stake deposit, an operator-chosen Elderfier ID and the wallet's
//! public address into an ENindex registration. The deposit is an on-chain
//! side effect: once submitted it is never rolled back, even when a later
//! step rejects the run.

use std::sync::Arc;

use serde_json::json;

use crate::core::{xfg_to_atomic, LogAggregator};
use crate::error::ConsoleError;
use crate::services::supervisor::WALLET_RPC_PORT;
use crate::traits::RpcGateway;
use crate::workflows::{field_as_string, WorkflowReport};

/// Minimum stake accepted by the network, in XFG.
pub const MIN_STAKE_XFG: f64 = 10_000.0;

/// Required Elderfier ID length, in characters.
pub const ELDER_ID_LEN: usize = 8;

const TAG: &str = "STAKE";

/// Elderfyre staking workflow.
pub struct StakeRegistration<G> {
    gateway: Arc<G>,
    logs: LogAggregator,
    wallet_port: u16,
}

impl<G: RpcGateway> StakeRegistration<G> {
    pub fn new(gateway: Arc<G>, logs: LogAggregator) -> Self {
        Self {
            gateway,
            logs,
            wallet_port: WALLET_RPC_PORT,
        }
    }

    /// Configure the wallet RPC port (fluent API)
    pub fn with_wallet_port(mut self, port: u16) -> Self {
        self.wallet_port = port;
        self
    }

    /// Run the staking sequence: validate the amount, submit the deposit,
    /// validate the Elderfier ID, fetch the wallet address, register to the
    /// ENindex. Registration failure is a caveat, not an abort.
    pub async fn run(&self, amount_xfg: f64, elder_id: &str) -> WorkflowReport {
        let mut report = WorkflowReport::new("elderfier-stake");
        let logs = &self.logs;

        logs.append(TAG, "Step 1: Create Elderfier stake deposit").await;
        if amount_xfg < MIN_STAKE_XFG {
            logs.append(TAG, &format!("❌ Minimum stake is {MIN_STAKE_XFG} XFG"))
                .await;
            let err = ConsoleError::validation(format!(
                "{amount_xfg} XFG is below the {MIN_STAKE_XFG} XFG floor"
            ));
            report.fail("validate-amount", err.to_string());
            return report;
        }
        report.complete("validate-amount", None);

        let amount_atomic = xfg_to_atomic(amount_xfg);
        logs.append(TAG, &format!("Creating stake deposit: {amount_xfg:.2} XFG..."))
            .await;

        let deposit = match self
            .gateway
            .call_wallet(
                self.wallet_port,
                "create_stake_deposit",
                json!({"amount": amount_atomic, "type": "elderfier_stake"}),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                logs.append(TAG, &format!("❌ Stake creation failed: {e}")).await;
                report.fail("stake-deposit", e.to_string());
                return report;
            }
        };

        let tx_hash = match field_as_string(&deposit, "tx_hash") {
            Some(hash) => hash,
            None => {
                logs.append(TAG, "❌ Stake response carried no tx_hash").await;
                report.fail("stake-deposit", "deposit response missing tx_hash");
                return report;
            }
        };
        logs.append(TAG, &format!("✅ Stake deposit created: {tx_hash}"))
            .await;
        report.complete("stake-deposit", Some(tx_hash.clone()));

        // The deposit above is already on chain; an invalid ID aborts the
        // registration but leaves the deposit standing.
        logs.append(TAG, "Step 2: Elderfier ID").await;
        if elder_id.chars().count() != ELDER_ID_LEN {
            logs.append(TAG, &format!("❌ ID must be exactly {ELDER_ID_LEN} characters"))
                .await;
            logs.append(
                TAG,
                &format!("Stake deposit {tx_hash} remains submitted; re-run registration with a valid ID"),
            )
            .await;
            let err = ConsoleError::validation(format!(
                "'{elder_id}' is not {ELDER_ID_LEN} characters"
            ));
            report.fail("elder-id", err.to_string());
            return report;
        }
        logs.append(TAG, &format!("✅ Elderfier ID: {elder_id}")).await;
        report.complete("elder-id", Some(elder_id.to_string()));

        logs.append(TAG, "Step 3: Register keys to ENindex").await;
        let address = match self
            .gateway
            .call_wallet(self.wallet_port, "getAddresses", json!({}))
            .await
        {
            // Wallets report {"addresses": [..]}; take the first, or fall
            // back to the raw body for builds that answer differently.
            Ok(response) => response
                .get("addresses")
                .and_then(|addresses| addresses.as_array().and_then(|a| a.first()))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| response.to_string()),
            Err(e) => {
                logs.append(TAG, &format!("❌ Failed to get wallet address: {e}"))
                    .await;
                report.fail("wallet-address", e.to_string());
                return report;
            }
        };
        logs.append(TAG, &format!("Public address: {address}")).await;
        report.complete("wallet-address", Some(address.clone()));

        logs.append(TAG, "Registering to ENindex...").await;
        match self
            .gateway
            .call_wallet(
                self.wallet_port,
                "register_to_enindex",
                json!({
                    "elder_id": elder_id,
                    "stake_tx_hash": tx_hash,
                    "address": address,
                    "stake_amount": amount_atomic,
                }),
            )
            .await
        {
            Ok(_) => {
                logs.append(TAG, "✅ Registered to ENindex").await;
                report.complete("enindex-registration", None);
            }
            Err(e) => {
                // Registration can be redone by hand; the stake stays valid.
                logs.append(TAG, &format!("⚠️  ENindex registration: {e}")).await;
                logs.append(TAG, "   (may need manual registration)").await;
                report.warn("enindex-registration", e.to_string());
            }
        }

        logs.append(TAG, "🎉 Elderfyre staking complete").await;
        logs.append(
            TAG,
            &format!("  stake {amount_xfg:.2} XFG | ID {elder_id} | tx {tx_hash}"),
        )
        .await;
        logs.append(TAG, "Elder Council access unlocks once the stake confirms")
            .await;

        report
    }
}
