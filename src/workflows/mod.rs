//! Multi-step workflow engine
//!
//! A workflow is a linear sequence of named steps. A failing step aborts the
//! remainder of the sequence; side effects of already-completed steps (for
//! example a submitted deposit) stay in place. Each run produces a
//! `WorkflowReport` recording every step and the artifacts it captured, so
//! the shell can show what happened and where a partial run stopped. Reports
//! live for the session only; an interrupted workflow is restarted from the
//! beginning.

pub mod burn;
pub mod stake;

pub use burn::{BurnAmount, BurnToMint, CONFIRMATION_TICKS, LARGE_BURN_XFG, MIN_BURN_XFG};
pub use stake::{StakeRegistration, ELDER_ID_LEN, MIN_STAKE_XFG};

use serde_json::Value;

/// Terminal status of a single workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    /// Completed, but with a caveat the operator should read.
    Warned,
    Failed,
}

/// One executed step, with whatever artifact it produced (transaction hash,
/// proof blob, address) for later steps and for the operator.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub name: &'static str,
    pub status: StepStatus,
    pub detail: Option<String>,
    pub artifact: Option<String>,
}

/// Overall outcome of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowOutcome {
    Completed,
    CompletedWithWarnings,
    Aborted,
}

impl std::fmt::Display for WorkflowOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            WorkflowOutcome::Completed => "completed",
            WorkflowOutcome::CompletedWithWarnings => "completed with warnings",
            WorkflowOutcome::Aborted => "aborted",
        };
        f.write_str(text)
    }
}

/// In-memory record of one workflow run.
#[derive(Debug, Clone)]
pub struct WorkflowReport {
    name: &'static str,
    steps: Vec<StepRecord>,
}

impl WorkflowReport {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Artifact recorded by the named step, if it completed and produced one.
    pub fn artifact(&self, step: &str) -> Option<&str> {
        self.steps
            .iter()
            .find(|s| s.name == step)
            .and_then(|s| s.artifact.as_deref())
    }

    pub fn outcome(&self) -> WorkflowOutcome {
        if self.steps.iter().any(|s| s.status == StepStatus::Failed) {
            WorkflowOutcome::Aborted
        } else if self.steps.iter().any(|s| s.status == StepStatus::Warned) {
            WorkflowOutcome::CompletedWithWarnings
        } else {
            WorkflowOutcome::Completed
        }
    }

    /// Reason the workflow aborted, if it did.
    pub fn failure(&self) -> Option<&str> {
        self.steps
            .iter()
            .find(|s| s.status == StepStatus::Failed)
            .and_then(|s| s.detail.as_deref())
    }

    pub(crate) fn complete(&mut self, name: &'static str, artifact: Option<String>) {
        self.steps.push(StepRecord {
            name,
            status: StepStatus::Completed,
            detail: None,
            artifact,
        });
    }

    pub(crate) fn warn(&mut self, name: &'static str, note: impl Into<String>) {
        self.steps.push(StepRecord {
            name,
            status: StepStatus::Warned,
            detail: Some(note.into()),
            artifact: None,
        });
    }

    pub(crate) fn fail(&mut self, name: &'static str, reason: impl Into<String>) {
        self.steps.push(StepRecord {
            name,
            status: StepStatus::Failed,
            detail: Some(reason.into()),
            artifact: None,
        });
    }
}

/// Pull a field out of an RPC response as display text. Strings come back
/// bare; anything else non-null is rendered as JSON.
pub(crate) fn field_as_string(value: &Value, key: &str) -> Option<String> {
    match value.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn outcome_reflects_the_worst_step() {
        let mut report = WorkflowReport::new("test");
        report.complete("one", None);
        assert_eq!(report.outcome(), WorkflowOutcome::Completed);

        report.warn("two", "caveat");
        assert_eq!(report.outcome(), WorkflowOutcome::CompletedWithWarnings);

        report.fail("three", "broke");
        assert_eq!(report.outcome(), WorkflowOutcome::Aborted);
        assert_eq!(report.failure(), Some("broke"));
    }

    #[test]
    fn artifacts_are_retrievable_by_step_name() {
        let mut report = WorkflowReport::new("test");
        report.complete("deposit", Some("txhash".to_string()));
        report.complete("confirm", None);

        assert_eq!(report.artifact("deposit"), Some("txhash"));
        assert_eq!(report.artifact("confirm"), None);
        assert_eq!(report.artifact("missing"), None);
    }

    #[test]
    fn field_extraction_handles_strings_and_values() {
        let body = json!({"tx_hash": "abc", "amount": 42, "nothing": null});
        assert_eq!(field_as_string(&body, "tx_hash"), Some("abc".to_string()));
        assert_eq!(field_as_string(&body, "amount"), Some("42".to_string()));
        assert_eq!(field_as_string(&body, "nothing"), None);
        assert_eq!(field_as_string(&body, "absent"), None);
    }
}
