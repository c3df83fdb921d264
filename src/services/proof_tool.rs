//! External STARK proof tool invocation
//!
//! The `xfg-stark` CLI is an external collaborator; we resolve it like the
//! daemon binaries, run its `generate-proof` subcommand and hand the caller
//! the combined output verbatim. The invocation is bounded by a timeout so a
//! wedged prover cannot hang a workflow forever.

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::{ConsoleError, ConsoleResult};
use crate::services::locate::locate_executable;
use crate::traits::ProofGenerator;

/// Name of the proof tool binary.
pub const PROOF_TOOL: &str = "xfg-stark";

const DEFAULT_PROOF_TIMEOUT: Duration = Duration::from_secs(300);

/// Production prover invoking the `xfg-stark` CLI.
pub struct StarkProofTool {
    bin_dir: Option<PathBuf>,
    timeout: Duration,
}

impl StarkProofTool {
    pub fn new() -> Self {
        Self {
            bin_dir: None,
            timeout: DEFAULT_PROOF_TIMEOUT,
        }
    }

    /// Configure an explicit binary directory (fluent API)
    pub fn with_bin_dir(mut self, bin_dir: Option<PathBuf>) -> Self {
        self.bin_dir = bin_dir;
        self
    }

    /// Configure the invocation timeout (fluent API)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for StarkProofTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ProofGenerator for StarkProofTool {
    fn locate(&self) -> Option<PathBuf> {
        locate_executable(PROOF_TOOL, self.bin_dir.as_deref())
    }

    async fn generate_proof(
        &self,
        tx_hash: &str,
        amount_atomic: u64,
        eldernode_proof: &str,
    ) -> ConsoleResult<String> {
        let binary = self
            .locate()
            .ok_or_else(|| ConsoleError::external_tool(PROOF_TOOL, "executable not found"))?;

        debug!(binary = %binary.display(), tx_hash, "running generate-proof");

        let invocation = Command::new(&binary)
            .arg("generate-proof")
            .arg("--tx-hash")
            .arg(tx_hash)
            .arg("--amount")
            .arg(amount_atomic.to_string())
            .arg("--eldernode-proof")
            .arg(eldernode_proof)
            .output();

        let output = tokio::time::timeout(self.timeout, invocation)
            .await
            .map_err(|_| {
                ConsoleError::external_tool(
                    PROOF_TOOL,
                    format!("timed out after {}s", self.timeout.as_secs()),
                )
            })?
            .map_err(|e| ConsoleError::external_tool(PROOF_TOOL, e))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(combined)
        } else {
            Err(ConsoleError::external_tool(PROOF_TOOL, combined))
        }
    }
}
