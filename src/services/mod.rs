//! Service implementations
//!
//! Production implementations of the gateway and proof-tool traits, plus the
//! process supervisor and executable resolution. Everything that touches the
//! network, the filesystem or child processes lives here.

pub mod gateway;
pub mod locate;
pub mod proof_tool;
pub mod supervisor;

pub use gateway::HttpRpcGateway;
pub use proof_tool::{StarkProofTool, PROOF_TOOL};
pub use supervisor::{
    LaunchSpec, ProcessKind, ProcessSupervisor, StartOutcome, StopOutcome, NODE_RPC_PORT,
    WALLET_RPC_PORT,
};
