//! Vision model trait: slow, high-confidence semantic form inference.
//!
//! Implementations wrap an image-understanding model (LLaVA via Ollama,
//! a hosted multimodal API, ...) and handle the specifics of prompting
//! and response parsing. See [`crate::ai`] for the Ollama-backed one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::RecognizedField;

/// Parsed result of a vision form-analysis pass.
#[derive(Debug, Clone, Default)]
pub struct VisionAnalysis {
    pub fields: Vec<RecognizedField>,
}

/// Post-submit confirmation-page classification.
///
/// `Ambiguous` and `NotConfirmed` must not fail a run: the application
/// may genuinely have gone through even when the page is unreadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "verdict")]
pub enum ConfirmationVerdict {
    Confirmed {
        message: String,
        confirmation_number: Option<String>,
    },
    NotConfirmed {
        message: String,
    },
    Ambiguous,
}

impl ConfirmationVerdict {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// Vision model over form screenshots.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Infer the full form structure from a screenshot.
    async fn analyze_form(&self, image: &[u8]) -> Result<VisionAnalysis>;

    /// Whether a CAPTCHA challenge is visible.
    async fn detect_captcha(&self, image: &[u8]) -> Result<bool>;

    /// Classify a post-submit page as a confirmation or not.
    async fn classify_confirmation(&self, image: &[u8]) -> Result<ConfirmationVerdict>;
}
