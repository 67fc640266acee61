//! Hybrid analyzer: OCR first for speed, vision fallback for accuracy.
//!
//! The arbitration policy:
//! 1. Run the OCR path (hundreds of milliseconds).
//! 2. Accept its result when it found at least one actionable field,
//!    every field carries a non-empty label, and mean confidence clears
//!    the configured threshold.
//! 3. Otherwise run the vision path (seconds) and merge in any
//!    high-confidence OCR fields the vision pass did not contradict.
//!
//! CAPTCHA detection and confirmation classification always go to the
//! vision path; OCR cannot judge either reliably.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::{ApplyError, Result};
use crate::traits::ocr::OcrEngine;
use crate::traits::vision::{ConfirmationVerdict, VisionModel};
use crate::types::{AnalyzerConfig, FormSnapshot, RecognizedField};

use super::ocr::OcrFieldExtractor;

/// Deduplicate fields sharing a locator, preferring the higher-confidence
/// source. Order of first appearance is preserved.
pub fn dedup_by_locator(fields: Vec<RecognizedField>) -> Vec<RecognizedField> {
    let mut by_locator: HashMap<String, usize> = HashMap::new();
    let mut result: Vec<RecognizedField> = Vec::with_capacity(fields.len());

    for field in fields {
        match by_locator.get(&field.locator) {
            Some(&idx) => {
                if field.confidence > result[idx].confidence {
                    result[idx] = field;
                }
            }
            None => {
                by_locator.insert(field.locator.clone(), result.len());
                result.push(field);
            }
        }
    }
    result
}

/// Arbitrates between the OCR and vision extractors.
pub struct HybridAnalyzer<O: OcrEngine, V: VisionModel> {
    ocr: OcrFieldExtractor<O>,
    vision: V,
    config: AnalyzerConfig,
}

impl<O: OcrEngine, V: VisionModel> HybridAnalyzer<O, V> {
    pub fn new(ocr_engine: O, vision: V) -> Self {
        Self {
            ocr: OcrFieldExtractor::new(ocr_engine),
            vision,
            config: AnalyzerConfig::default(),
        }
    }

    pub fn with_config(ocr_engine: O, vision: V, config: AnalyzerConfig) -> Self {
        Self {
            ocr: OcrFieldExtractor::new(ocr_engine),
            vision,
            config,
        }
    }

    /// Analyze one snapshot into a deduplicated field set.
    ///
    /// Errors only when both paths fail; an empty-but-successful result
    /// set is forwarded so the controller can treat the page as a
    /// no-recognizable-fields page (some pages are confirmation screens).
    pub async fn analyze(&self, snapshot: &FormSnapshot) -> Result<Vec<RecognizedField>> {
        let ocr_fields = match self.ocr.extract(snapshot).await {
            Ok(fields) => fields,
            Err(e) => {
                warn!(error = %e, "OCR path failed, falling back to vision");
                vec![]
            }
        };

        if self.accept_ocr(&ocr_fields) {
            info!(fields = ocr_fields.len(), "OCR analysis accepted");
            return Ok(dedup_by_locator(ocr_fields));
        }

        debug!(
            ocr_fields = ocr_fields.len(),
            "OCR confidence low, invoking vision model"
        );

        let vision_fields = match self.vision.analyze_form(&snapshot.image).await {
            Ok(analysis) => analysis.fields,
            Err(e) if ocr_fields.is_empty() => {
                return Err(ApplyError::Analysis {
                    reason: format!("both extractors failed: {e}"),
                });
            }
            Err(e) => {
                // Vision broke but OCR produced something usable.
                warn!(error = %e, "vision path failed, keeping low-confidence OCR result");
                return Ok(dedup_by_locator(ocr_fields));
            }
        };

        // Vision result first so its fields win position; OCR fields the
        // vision pass did not contradict are merged in when confident.
        let mut merged = vision_fields;
        for field in ocr_fields {
            if field.confidence >= self.config.merge_keep_threshold
                && !merged.iter().any(|f| f.locator == field.locator)
            {
                merged.push(field);
            }
        }

        info!(fields = merged.len(), "vision analysis complete");
        Ok(dedup_by_locator(merged))
    }

    /// Whether the OCR result set is trustworthy on its own.
    fn accept_ocr(&self, fields: &[RecognizedField]) -> bool {
        let actionable = fields.iter().filter(|f| f.is_fillable()).count();
        if actionable == 0 {
            return false;
        }
        if fields.iter().any(|f| f.label.trim().is_empty()) {
            return false;
        }
        let mean = fields.iter().map(|f| f.confidence).sum::<f32>() / fields.len() as f32;
        mean >= self.config.ocr_confidence_threshold
    }

    /// CAPTCHA presence, via the vision path unconditionally.
    pub async fn detect_captcha(&self, snapshot: &FormSnapshot) -> Result<bool> {
        self.vision.detect_captcha(&snapshot.image).await
    }

    /// Post-submit confirmation classification, via the vision path.
    pub async fn classify_confirmation(
        &self,
        snapshot: &FormSnapshot,
    ) -> Result<ConfirmationVerdict> {
        self.vision.classify_confirmation(&snapshot.image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockOcr, MockVision};
    use crate::traits::ocr::TextBox;
    use crate::types::{ExtractorSource, FieldKind};

    fn field(locator: &str, confidence: f32, source: ExtractorSource) -> RecognizedField {
        RecognizedField::new(FieldKind::Text, locator, locator, source)
            .with_confidence(confidence)
    }

    #[test]
    fn test_dedup_prefers_higher_confidence() {
        let fields = vec![
            field("label=email", 0.6, ExtractorSource::Ocr),
            field("label=email", 0.9, ExtractorSource::Vision),
            field("label=name", 0.8, ExtractorSource::Ocr),
        ];
        let deduped = dedup_by_locator(fields);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].source, ExtractorSource::Vision);
        assert_eq!(deduped[0].confidence, 0.9);
    }

    #[tokio::test]
    async fn test_high_confidence_ocr_skips_vision() {
        let ocr = MockOcr::new().with_boxes(vec![
            TextBox::new("First Name", 10, 10, 80, 16).with_confidence(0.95),
            TextBox::new("Email", 10, 60, 50, 16).with_confidence(0.95),
        ]);
        let vision = MockVision::new();
        let analyzer = HybridAnalyzer::new(ocr, vision.clone());

        let snapshot = FormSnapshot::new(vec![1, 2, 3], "https://jobs.example.com/apply");
        let fields = analyzer.analyze(&snapshot).await.unwrap();

        assert_eq!(fields.len(), 2);
        assert!(fields.iter().all(|f| f.source == ExtractorSource::Ocr));
        assert_eq!(vision.analyze_calls(), 0);
    }

    #[tokio::test]
    async fn test_low_confidence_ocr_falls_back_to_vision() {
        let ocr = MockOcr::new()
            .with_boxes(vec![TextBox::new("Email", 10, 10, 50, 16).with_confidence(0.3)]);
        let vision = MockVision::new().with_form_fields(vec![field(
            "label=email address",
            0.9,
            ExtractorSource::Vision,
        )]);
        let analyzer = HybridAnalyzer::new(ocr, vision.clone());

        let snapshot = FormSnapshot::new(vec![], "https://jobs.example.com/apply");
        let fields = analyzer.analyze(&snapshot).await.unwrap();

        assert_eq!(vision.analyze_calls(), 1);
        assert!(fields
            .iter()
            .any(|f| f.source == ExtractorSource::Vision));
    }

    #[tokio::test]
    async fn test_both_paths_failing_is_an_error() {
        let ocr = MockOcr::new().failing();
        let vision = MockVision::new().failing();
        let analyzer = HybridAnalyzer::new(ocr, vision);

        let snapshot = FormSnapshot::new(vec![], "https://jobs.example.com/apply");
        let err = analyzer.analyze(&snapshot).await.unwrap_err();
        assert!(matches!(err, ApplyError::Analysis { .. }));
    }

    #[tokio::test]
    async fn test_empty_ok_result_is_forwarded() {
        // Vision sees nothing (confirmation screen); not an error.
        let ocr = MockOcr::new();
        let vision = MockVision::new();
        let analyzer = HybridAnalyzer::new(ocr, vision);

        let snapshot = FormSnapshot::new(vec![], "https://jobs.example.com/done");
        let fields = analyzer.analyze(&snapshot).await.unwrap();
        assert!(fields.is_empty());
    }
}
