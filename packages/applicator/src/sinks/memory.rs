//! In-memory outcome sink, for tests and batch callers that aggregate
//! their own reports.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::sink::OutcomeSink;
use crate::types::ApplicationOutcome;

/// Collects outcomes in memory. Cloning shares the underlying store.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<RwLock<Vec<ApplicationOutcome>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn outcomes(&self) -> Vec<ApplicationOutcome> {
        match self.records.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self.records.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OutcomeSink for MemorySink {
    async fn record(&self, outcome: &ApplicationOutcome) -> Result<()> {
        match self.records.write() {
            Ok(mut guard) => guard.push(outcome.clone()),
            Err(poisoned) => poisoned.into_inner().push(outcome.clone()),
        }
        Ok(())
    }
}
