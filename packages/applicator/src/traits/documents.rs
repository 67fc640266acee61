//! Document provider: resolved file paths for generated CV and cover
//! letter documents, keyed by job identity.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Documents, JobTarget};

/// Supplies the per-job generated documents in a primary and fallback
/// format. The generation itself is an external collaborator.
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    /// Documents generated for this job, or empty when none exist.
    async fn documents_for(&self, job: &JobTarget) -> Result<Documents>;
}
