//! Page-scoped types: snapshots going into analysis, results coming out
//! of filling. Both live for a single page-turn and are discarded when
//! the next page is captured or the run terminates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resolution::{Discrepancy, FieldResolution};

/// One screenshot plus the page's URL, captured at a point in time.
///
/// Snapshots have no identity beyond their capture instant; they are
/// input to analysis, never stored long-term.
#[derive(Debug, Clone)]
pub struct FormSnapshot {
    /// PNG-encoded full-page screenshot.
    pub image: Vec<u8>,

    /// The page URL at capture time.
    pub url: String,

    pub captured_at: DateTime<Utc>,
}

impl FormSnapshot {
    pub fn new(image: Vec<u8>, url: impl Into<String>) -> Self {
        Self {
            image,
            url: url.into(),
            captured_at: Utc::now(),
        }
    }
}

/// Outcome of processing one form page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageResult {
    /// Resolutions the driver applied and verified.
    pub applied: Vec<FieldResolution>,

    /// Resolutions that failed to apply or verify.
    pub failed: Vec<FieldResolution>,

    /// Non-fatal gaps recorded while resolving and filling.
    pub discrepancies: Vec<Discrepancy>,

    /// Whether a "next" control was found on the page.
    pub next_found: bool,

    /// Reference to the post-fill audit screenshot.
    pub screenshot: Option<String>,
}

impl PageResult {
    /// Number of resolutions the driver attempted (applied + failed).
    pub fn attempted(&self) -> usize {
        self.applied.len() + self.failed.len()
    }

    /// Fraction of attempted resolutions that failed, 0.0 when nothing
    /// was attempted.
    pub fn failure_rate(&self) -> f32 {
        let attempted = self.attempted();
        if attempted == 0 {
            0.0
        } else {
            self.failed.len() as f32 / attempted as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::field::{ExtractorSource, FieldKind, RecognizedField};
    use crate::types::resolution::{FieldAction, FieldResolution};

    fn resolution(label: &str) -> FieldResolution {
        FieldResolution::resolved(
            RecognizedField::new(FieldKind::Text, label, label, ExtractorSource::Ocr),
            FieldAction::FillText("x".into()),
        )
    }

    #[test]
    fn test_failure_rate() {
        let mut result = PageResult::default();
        assert_eq!(result.failure_rate(), 0.0);

        result.applied.push(resolution("a"));
        result.applied.push(resolution("b"));
        result.failed.push(resolution("c"));
        assert!((result.failure_rate() - 1.0 / 3.0).abs() < f32::EPSILON);
    }
}
