//! Manual approval gate: an optional blocking yes/no decision point
//! invoked once per run before submission.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::JobTarget;

/// The gate's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Approve,
    Decline,
}

/// Blocking yes/no decision before a submission. Bypassed entirely when
/// the run is configured for automatic mode.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    /// Ask whether the given job's application may be submitted.
    async fn approve(&self, job: &JobTarget) -> Result<GateDecision>;
}

/// A gate that approves everything; used when no gate is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

#[async_trait]
impl ApprovalGate for AutoApprove {
    async fn approve(&self, _job: &JobTarget) -> Result<GateDecision> {
        Ok(GateDecision::Approve)
    }
}
