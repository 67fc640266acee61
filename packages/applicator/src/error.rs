//! Typed errors for the applicator library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Resolution gaps, fill mismatches and truncations are NOT errors: they
//! are [`crate::types::resolution::Discrepancy`] records carried in the
//! page result and surfaced in the outcome detail.

use thiserror::Error;

/// Errors that can occur while processing an application run.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// Both extraction paths failed or returned an error for a page.
    #[error("form analysis failed: {reason}")]
    Analysis { reason: String },

    /// OCR engine failed.
    #[error("OCR error: {0}")]
    Ocr(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Vision model unavailable or failed.
    #[error("vision model error: {0}")]
    Vision(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Live page action failed (capture, fill, click, upload).
    #[error("page error: {0}")]
    Page(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Next/submit control was expected but not actionable.
    #[error("navigation error: {reason}")]
    Navigation { reason: String },

    /// A CAPTCHA challenge is blocking the form.
    #[error("CAPTCHA detected")]
    CaptchaDetected,

    /// An external call exceeded the stage timeout.
    #[error("timeout during {stage}")]
    Timeout { stage: &'static str },

    /// The run was cancelled by the operator.
    #[error("run cancelled")]
    Cancelled,

    /// Model output could not be parsed.
    #[error("response parse error: {0}")]
    ResponseParse(#[from] serde_json::Error),

    /// Filesystem error (screenshots, document paths).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Outcome sink rejected the record.
    #[error("outcome sink error: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApplyError {
    /// Wrap an arbitrary error as a page-action failure.
    pub fn page<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Page(Box::new(err))
    }

    /// Wrap an arbitrary error as a vision failure.
    pub fn vision<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Vision(Box::new(err))
    }

    /// Wrap an arbitrary error as an OCR failure.
    pub fn ocr<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Ocr(Box::new(err))
    }
}

/// Result type for applicator operations.
pub type Result<T> = std::result::Result<T, ApplyError>;
