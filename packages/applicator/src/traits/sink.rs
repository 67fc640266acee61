//! Outcome sink: append-only persistence for terminal run records.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ApplicationOutcome;

/// Accepts exactly one [`ApplicationOutcome`] per run and writes it to
/// durable storage. The contract is append-only; implementations must
/// never drop a record silently.
#[async_trait]
pub trait OutcomeSink: Send + Sync {
    /// Append one outcome record.
    async fn record(&self, outcome: &ApplicationOutcome) -> Result<()>;
}
