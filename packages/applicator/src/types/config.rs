//! Run and analyzer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Whether a run may perform the final destructive submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Full pipeline including `submit()`.
    Live,

    /// Every step up to but excluding `submit()`.
    DryRun,
}

impl RunMode {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun)
    }
}

/// Configuration for a run controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Ask the approval gate before submitting. When false the gate is
    /// bypassed entirely.
    pub manual_approval: bool,

    /// Loop guard: further "next" detections past this many pages fail
    /// the run instead of looping forever on a misidentified control.
    ///
    /// Default: 6.
    pub max_pages: usize,

    /// Rendering visibility. Does not change control flow, only how the
    /// caller constructs its page session; logged for observability.
    pub headless: bool,

    /// Bounded wait for manual CAPTCHA intervention before the single
    /// re-analysis attempt.
    ///
    /// Default: 30s.
    pub captcha_wait: Duration,

    /// Timeout applied to every external call (capture, OCR, vision,
    /// each live-page action). A timeout is that stage's failure, not a
    /// hang.
    ///
    /// Default: 30s.
    pub stage_timeout: Duration,

    /// Maximum tolerated fraction of fill failures on a page before the
    /// page is treated as failed.
    ///
    /// Default: 0.5.
    pub fill_failure_tolerance: f32,

    /// Directory where audit screenshots are referenced from.
    pub screenshots_dir: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            manual_approval: false,
            max_pages: 6,
            headless: true,
            captcha_wait: Duration::from_secs(30),
            stage_timeout: Duration::from_secs(30),
            fill_failure_tolerance: 0.5,
            screenshots_dir: "workspace/screenshots".to_string(),
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the manual approval gate.
    pub fn with_manual_approval(mut self, enabled: bool) -> Self {
        self.manual_approval = enabled;
        self
    }

    /// Set the page loop guard.
    pub fn with_max_pages(mut self, max: usize) -> Self {
        self.max_pages = max;
        self
    }

    /// Set rendering visibility.
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the CAPTCHA intervention window.
    pub fn with_captcha_wait(mut self, wait: Duration) -> Self {
        self.captcha_wait = wait;
        self
    }

    /// Set the per-stage timeout.
    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    /// Set the fill failure tolerance.
    pub fn with_fill_failure_tolerance(mut self, tolerance: f32) -> Self {
        self.fill_failure_tolerance = tolerance.clamp(0.0, 1.0);
        self
    }
}

/// Configuration for the hybrid analyzer's arbitration policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Minimum mean OCR field confidence for the OCR result set to be
    /// accepted without a vision pass.
    ///
    /// Default: 0.75.
    pub ocr_confidence_threshold: f32,

    /// OCR fields at or above this confidence are kept when merging
    /// with a vision result, provided the vision pass did not contradict
    /// them (same locator).
    ///
    /// Default: 0.9.
    pub merge_keep_threshold: f32,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            ocr_confidence_threshold: 0.75,
            merge_keep_threshold: 0.9,
        }
    }
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the OCR acceptance threshold.
    pub fn with_ocr_confidence_threshold(mut self, threshold: f32) -> Self {
        self.ocr_confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.max_pages, 6);
        assert!((config.fill_failure_tolerance - 0.5).abs() < f32::EPSILON);
        assert!(!config.manual_approval);
    }

    #[test]
    fn test_tolerance_is_clamped() {
        let config = RunConfig::new().with_fill_failure_tolerance(3.0);
        assert_eq!(config.fill_failure_tolerance, 1.0);
    }
}
