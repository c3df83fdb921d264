//! Operator console for the Fuego node and wallet daemons
//!
//! Supervises the two daemon processes, aggregates their output, talks to
//! them over JSON-RPC and drives the Elderfier staking and burn-to-mint
//! workflows. The terminal shell on top is deliberately thin; everything it
//! does goes through the supervisor, the gateway or a workflow.

pub mod core;
pub mod error;
pub mod services;
pub mod shell;
pub mod traits;
pub mod workflows;

// Re-export commonly used types
pub use crate::core::{LogAggregator, LogEntry, TelemetrySnapshot};
pub use error::{ConsoleError, ConsoleResult};
pub use services::{
    HttpRpcGateway, ProcessKind, ProcessSupervisor, StarkProofTool, NODE_RPC_PORT, WALLET_RPC_PORT,
};
pub use shell::Shell;
pub use traits::{ProofGenerator, RpcGateway};
pub use workflows::{BurnAmount, BurnToMint, StakeRegistration, WorkflowReport};
