//! Workflow tests against mocked gateway and proof-tool services
//!
//! These verify the ordering and partial-failure contracts of the staking
//! and burn-to-mint sequences: which RPC calls happen, how many times, and
//! what survives when a step rejects the run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use fuego_console::core::LogAggregator;
use fuego_console::error::ConsoleError;
use fuego_console::traits::{MockProofGenerator, MockRpcGateway};
use fuego_console::workflows::{BurnAmount, BurnToMint, StakeRegistration, WorkflowOutcome};

fn stake_workflow(gateway: MockRpcGateway) -> StakeRegistration<MockRpcGateway> {
    StakeRegistration::new(Arc::new(gateway), LogAggregator::new())
}

fn burn_workflow(
    gateway: MockRpcGateway,
    prover: MockProofGenerator,
) -> BurnToMint<MockRpcGateway, MockProofGenerator> {
    BurnToMint::new(Arc::new(gateway), Arc::new(prover), LogAggregator::new())
        .with_confirmation_timing(2, Duration::from_millis(1))
}

/// A stake below the floor is rejected before any RPC call is made.
#[tokio::test]
async fn stake_below_floor_makes_no_rpc_calls() {
    let mut gateway = MockRpcGateway::new();
    gateway.expect_call_wallet().times(0);

    let report = stake_workflow(gateway).run(9_999.99, "ELDER123").await;
    assert_eq!(report.outcome(), WorkflowOutcome::Aborted);
    assert!(report.failure().unwrap().contains("floor"));
}

/// A stake at the floor submits the deposit exactly once and runs the whole
/// registration sequence.
#[tokio::test]
async fn stake_at_floor_runs_the_full_sequence() {
    let mut gateway = MockRpcGateway::new();
    gateway
        .expect_call_wallet()
        .withf(|_, method, params| {
            method == "create_stake_deposit"
                && params["amount"] == 1_000_000_000_000u64
                && params["type"] == "elderfier_stake"
        })
        .times(1)
        .returning(|_, _, _| Ok(json!({"tx_hash": "stake-tx-1"})));
    gateway
        .expect_call_wallet()
        .withf(|_, method, _| method == "getAddresses")
        .times(1)
        .returning(|_, _, _| Ok(json!({"addresses": ["fire1operatoraddr"]})));
    gateway
        .expect_call_wallet()
        .withf(|_, method, params| {
            method == "register_to_enindex"
                && params["elder_id"] == "ELDER123"
                && params["stake_tx_hash"] == "stake-tx-1"
                && params["address"] == "fire1operatoraddr"
                && params["stake_amount"] == 1_000_000_000_000u64
        })
        .times(1)
        .returning(|_, _, _| Ok(json!({"registered": true})));

    let report = stake_workflow(gateway).run(10_000.0, "ELDER123").await;
    assert_eq!(report.outcome(), WorkflowOutcome::Completed);
    assert_eq!(report.artifact("stake-deposit"), Some("stake-tx-1"));
    assert_eq!(report.artifact("elder-id"), Some("ELDER123"));
}

/// An invalid Elderfier ID aborts the run, but only after the deposit was
/// submitted; the deposit artifact stays recorded.
#[tokio::test]
async fn bad_elder_id_aborts_but_keeps_the_deposit() {
    let mut gateway = MockRpcGateway::new();
    gateway
        .expect_call_wallet()
        .withf(|_, method, _| method == "create_stake_deposit")
        .times(1)
        .returning(|_, _, _| Ok(json!({"tx_hash": "stake-tx-2"})));

    let report = stake_workflow(gateway).run(12_000.0, "short").await;
    assert_eq!(report.outcome(), WorkflowOutcome::Aborted);
    assert!(report.failure().unwrap().contains("8 characters"));
    // The on-chain side effect is not rolled back.
    assert_eq!(report.artifact("stake-deposit"), Some("stake-tx-2"));
}

/// ENindex registration failure is a caveat, not an abort.
#[tokio::test]
async fn enindex_failure_still_completes_with_a_warning() {
    let mut gateway = MockRpcGateway::new();
    gateway
        .expect_call_wallet()
        .withf(|_, method, _| method == "create_stake_deposit")
        .times(1)
        .returning(|_, _, _| Ok(json!({"tx_hash": "stake-tx-3"})));
    gateway
        .expect_call_wallet()
        .withf(|_, method, _| method == "getAddresses")
        .times(1)
        .returning(|_, _, _| Ok(json!({"addresses": ["fire1operatoraddr"]})));
    gateway
        .expect_call_wallet()
        .withf(|_, method, _| method == "register_to_enindex")
        .times(1)
        .returning(|_, _, _| {
            Err(ConsoleError::network(
                "127.0.0.1:18082",
                "connection refused",
            ))
        });

    let report = stake_workflow(gateway).run(15_000.0, "ELDER999").await;
    assert_eq!(report.outcome(), WorkflowOutcome::CompletedWithWarnings);
    assert_eq!(report.artifact("stake-deposit"), Some("stake-tx-3"));
}

/// When the consensus request fails, the proof tool is never invoked and the
/// workflow reports failure.
#[tokio::test]
async fn burn_consensus_failure_never_reaches_the_proof_tool() {
    let mut gateway = MockRpcGateway::new();
    gateway
        .expect_call_wallet()
        .withf(|_, method, _| method == "create_burn_deposit")
        .times(1)
        .returning(|_, _, _| Ok(json!({"tx_hash": "burn-tx-1"})));
    gateway
        .expect_call_wallet()
        .withf(|_, method, _| method == "request_elderfier_consensus")
        .times(1)
        .returning(|_, _, _| {
            Err(ConsoleError::network(
                "127.0.0.1:18082",
                "consensus unavailable",
            ))
        });

    let mut prover = MockProofGenerator::new();
    prover.expect_locate().times(0);
    prover.expect_generate_proof().times(0);

    let report = burn_workflow(gateway, prover).run(BurnAmount::Minimum).await;
    assert_eq!(report.outcome(), WorkflowOutcome::Aborted);
    assert_eq!(report.artifact("burn-deposit"), Some("burn-tx-1"));
}

/// The happy path invokes the proof tool exactly once, fed from the burn
/// transaction, the atomic amount and the consensus proof.
#[tokio::test]
async fn burn_success_invokes_the_proof_tool_once() {
    let mut gateway = MockRpcGateway::new();
    gateway
        .expect_call_wallet()
        .withf(|_, method, params| {
            method == "create_burn_deposit" && params["amount"] == 80_000_000u64
        })
        .times(1)
        .returning(|_, _, _| Ok(json!({"tx_hash": "burn-tx-9"})));
    gateway
        .expect_call_wallet()
        .withf(|_, method, params| {
            method == "request_elderfier_consensus"
                && params["tx_hash"] == "burn-tx-9"
                && params["amount"] == 80_000_000u64
        })
        .times(1)
        .returning(|_, _, _| Ok(json!({"eldernode_proof": "elder-proof-blob"})));

    let mut prover = MockProofGenerator::new();
    prover
        .expect_locate()
        .returning(|| Some(PathBuf::from("xfg-stark")));
    prover
        .expect_generate_proof()
        .withf(|tx_hash, amount, proof| {
            tx_hash == "burn-tx-9" && *amount == 80_000_000 && proof == "elder-proof-blob"
        })
        .times(1)
        .returning(|_, _, _| Ok("stark proof bytes".to_string()));

    let report = burn_workflow(gateway, prover).run(BurnAmount::Minimum).await;
    assert_eq!(report.outcome(), WorkflowOutcome::Completed);
    assert_eq!(report.artifact("consensus-proof"), Some("elder-proof-blob"));
    assert_eq!(report.artifact("stark-proof"), Some("stark proof bytes"));
}

/// The large preset converts to atomic units exactly.
#[tokio::test]
async fn burn_large_preset_uses_the_exact_atomic_amount() {
    let mut gateway = MockRpcGateway::new();
    gateway
        .expect_call_wallet()
        .withf(|_, method, params| {
            method == "create_burn_deposit" && params["amount"] == 80_000_000_000u64
        })
        .times(1)
        .returning(|_, _, _| Ok(json!({"tx_hash": "burn-tx-2"})));
    gateway
        .expect_call_wallet()
        .withf(|_, method, _| method == "request_elderfier_consensus")
        .times(1)
        .returning(|_, _, _| Ok(json!({"eldernode_proof": "proof"})));

    let mut prover = MockProofGenerator::new();
    prover.expect_locate().returning(|| None);
    prover.expect_generate_proof().times(0);

    let report = burn_workflow(gateway, prover).run(BurnAmount::Large).await;
    // Prover missing: manual instructions, completed with a caveat.
    assert_eq!(report.outcome(), WorkflowOutcome::CompletedWithWarnings);
}

/// A failing proof tool aborts the workflow and surfaces its output.
#[tokio::test]
async fn burn_prover_failure_aborts_with_the_tool_output() {
    let mut gateway = MockRpcGateway::new();
    gateway
        .expect_call_wallet()
        .withf(|_, method, _| method == "create_burn_deposit")
        .times(1)
        .returning(|_, _, _| Ok(json!({"tx_hash": "burn-tx-3"})));
    gateway
        .expect_call_wallet()
        .withf(|_, method, _| method == "request_elderfier_consensus")
        .times(1)
        .returning(|_, _, _| Ok(json!({"eldernode_proof": "proof"})));

    let mut prover = MockProofGenerator::new();
    prover
        .expect_locate()
        .returning(|| Some(PathBuf::from("xfg-stark")));
    prover
        .expect_generate_proof()
        .times(1)
        .returning(|_, _, _| Err(ConsoleError::external_tool("xfg-stark", "prover exploded")));

    let report = burn_workflow(gateway, prover).run(BurnAmount::Minimum).await;
    assert_eq!(report.outcome(), WorkflowOutcome::Aborted);
    assert!(report.failure().unwrap().contains("prover exploded"));
}
