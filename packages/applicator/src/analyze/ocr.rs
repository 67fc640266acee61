//! OCR path: fast structural field inference over raw text boxes.
//!
//! The engine behind [`OcrEngine`] only reads text; everything form-shaped
//! here is heuristic: adjacent boxes are grouped into label phrases,
//! phrases are matched against a pattern table, and button keywords become
//! next/submit control metadata.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::traits::ocr::{OcrEngine, TextBox};
use crate::types::{ExtractorSource, FieldKind, FormSnapshot, RecognizedField};

/// Boxes on the same line closer than this many pixels are one phrase.
const PHRASE_MAX_GAP: u32 = 50;

/// Vertical tolerance for "same line".
const LINE_TOLERANCE: u32 = 20;

/// Label patterns that identify a form field, checked in order.
/// First match wins.
fn field_patterns() -> &'static Vec<(Regex, FieldKind)> {
    static PATTERNS: OnceLock<Vec<(Regex, FieldKind)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let table: &[(&str, FieldKind)] = &[
            (r"(?i)first\s*name", FieldKind::Text),
            (r"(?i)last\s*name|surname|family\s*name", FieldKind::Text),
            (r"(?i)full\s*name", FieldKind::Text),
            (r"(?i)e[-\s]?mail", FieldKind::Text),
            (r"(?i)phone|mobile|telephone", FieldKind::Text),
            (r"(?i)city", FieldKind::Text),
            (r"(?i)country", FieldKind::Dropdown),
            (r"(?i)linkedin", FieldKind::Text),
            (r"(?i)github", FieldKind::Text),
            (r"(?i)portfolio|website", FieldKind::Text),
            (r"(?i)resume|\bcv\b|curriculum", FieldKind::FileUpload),
            (r"(?i)cover\s*letter", FieldKind::FileUpload),
            (r"(?i)years?\s*of\s*experience", FieldKind::Dropdown),
            (r"(?i)education|degree", FieldKind::Dropdown),
            (r"(?i)graduat(ion|ed)", FieldKind::Text),
            (r"(?i)sponsor(ship)?|visa", FieldKind::Dropdown),
            (r"(?i)salary|compensation", FieldKind::Text),
            (r"(?i)availab(le|ility)|notice\s*period", FieldKind::Text),
            (r"(?i)agree|accept|terms|consent", FieldKind::Checkbox),
            (r"(?i)about\s*(you|me)|summary|why\s+", FieldKind::Textarea),
        ];
        table
            .iter()
            .map(|(pattern, kind)| (Regex::new(pattern).expect("static pattern"), *kind))
            .collect()
    })
}

/// Keywords that mark a phrase as a navigation control rather than a field.
const NEXT_KEYWORDS: &[&str] = &["next", "continue", "proceed"];
const SUBMIT_KEYWORDS: &[&str] = &["submit", "review", "send application", "apply"];

/// Group text boxes into label phrases: same line, small horizontal gap.
/// "First" + "Name" becomes "First Name".
pub fn group_phrases(mut boxes: Vec<TextBox>) -> Vec<TextBox> {
    if boxes.is_empty() {
        return vec![];
    }

    boxes.sort_by_key(|b| (b.y, b.x));

    let mut phrases: Vec<TextBox> = Vec::new();
    let mut current = boxes[0].clone();

    for item in boxes.into_iter().skip(1) {
        let same_line = item.y.abs_diff(current.y) < LINE_TOLERANCE;
        let close = item.x >= current.right() && item.x - current.right() < PHRASE_MAX_GAP;

        if same_line && close {
            current.text.push(' ');
            current.text.push_str(&item.text);
            current.width = item.right().saturating_sub(current.x);
            current.confidence = current.confidence.min(item.confidence);
        } else {
            phrases.push(current);
            current = item;
        }
    }
    phrases.push(current);
    phrases
}

/// Derive an opaque label-based locator for a phrase.
///
/// The page session resolves these against the live DOM (label
/// association, placeholder, aria-label), so minor re-renders do not
/// invalidate them the way coordinates would.
fn label_locator(label: &str) -> String {
    let normalized = label
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    format!("label={normalized}")
}

fn required_from_label(label: &str) -> bool {
    label.contains('*') || label.to_lowercase().contains("required")
}

/// Identify form fields and navigation controls from grouped phrases.
pub fn identify_fields(phrases: &[TextBox]) -> Vec<RecognizedField> {
    let mut fields = Vec::new();

    for phrase in phrases {
        let lower = phrase.text.to_lowercase();

        // Navigation controls first: a "Submit application" phrase must
        // not be mistaken for an application field.
        if SUBMIT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            fields.push(
                RecognizedField::new(
                    FieldKind::Text,
                    phrase.text.clone(),
                    label_locator(&phrase.text),
                    ExtractorSource::Ocr,
                )
                .with_confidence(phrase.confidence)
                .as_submit_control(),
            );
            continue;
        }
        if NEXT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            fields.push(
                RecognizedField::new(
                    FieldKind::Text,
                    phrase.text.clone(),
                    label_locator(&phrase.text),
                    ExtractorSource::Ocr,
                )
                .with_confidence(phrase.confidence)
                .as_next_control(),
            );
            continue;
        }

        for (pattern, kind) in field_patterns() {
            if pattern.is_match(&phrase.text) {
                let mut field = RecognizedField::new(
                    *kind,
                    phrase.text.clone(),
                    label_locator(&phrase.text),
                    ExtractorSource::Ocr,
                )
                .with_confidence(phrase.confidence);
                if required_from_label(&phrase.text) {
                    field = field.required();
                }
                fields.push(field);
                break;
            }
        }
    }

    fields
}

/// The OCR extraction path: engine + structural inference.
pub struct OcrFieldExtractor<O: OcrEngine> {
    engine: O,
}

impl<O: OcrEngine> OcrFieldExtractor<O> {
    pub fn new(engine: O) -> Self {
        Self { engine }
    }

    /// Run the fast path over a snapshot.
    ///
    /// An empty result is not an error; the hybrid analyzer decides
    /// whether to fall back to vision.
    pub async fn extract(&self, snapshot: &FormSnapshot) -> Result<Vec<RecognizedField>> {
        let boxes = self.engine.read_boxes(&snapshot.image).await?;
        let phrases = group_phrases(boxes);
        let fields = identify_fields(&phrases);
        debug!(
            url = %snapshot.url,
            phrases = phrases.len(),
            fields = fields.len(),
            "OCR pass complete"
        );
        Ok(fields)
    }
}
