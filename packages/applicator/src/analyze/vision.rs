//! Vision path response parsing.
//!
//! Vision models are asked for JSON-only output but routinely wrap it in
//! prose; the parsers here slice from the first `{` to the last `}`
//! before deserializing.

use serde::Deserialize;
use tracing::warn;

use crate::error::{ApplyError, Result};
use crate::traits::vision::{ConfirmationVerdict, VisionAnalysis};
use crate::types::{ExtractorSource, FieldKind, RecognizedField};

/// Confidence assigned to vision-derived fields. The vision pass is the
/// high-confidence arbiter, but still short of certainty.
const VISION_CONFIDENCE: f32 = 0.9;

#[derive(Debug, Deserialize)]
struct RawForm {
    #[serde(default)]
    fields: Vec<RawField>,
    #[serde(default)]
    next_buttons: Vec<String>,
    #[serde(default)]
    submit_buttons: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    #[serde(default)]
    label: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    accepted_file_types: Vec<String>,
    #[serde(default)]
    max_length: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawConfirmation {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    confirmation_number: Option<String>,
}

/// Slice the first balanced-looking JSON object out of model output.
fn json_slice(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn kind_from_str(kind: &str) -> FieldKind {
    // Models are loose about naming; map the common aliases.
    match kind.to_lowercase().as_str() {
        "textarea" | "multiline" => FieldKind::Textarea,
        "dropdown" | "select" => FieldKind::Dropdown,
        "checkbox" => FieldKind::Checkbox,
        "file_upload" | "file" | "upload" => FieldKind::FileUpload,
        "radio_group" | "radio" => FieldKind::RadioGroup,
        _ => FieldKind::Text,
    }
}

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

/// Parse a form-analysis response into recognized fields.
///
/// Fields with empty labels are dropped (nothing downstream can resolve
/// or locate them); next/submit buttons become control-flagged entries.
pub fn parse_form_response(raw: &str) -> Result<VisionAnalysis> {
    let Some(slice) = json_slice(raw) else {
        warn!("no JSON object in vision response");
        return Err(ApplyError::Analysis {
            reason: "vision response contained no JSON".to_string(),
        });
    };

    let parsed: RawForm = serde_json::from_str(slice)?;

    let mut fields = Vec::new();
    for f in parsed.fields {
        if f.label.trim().is_empty() {
            continue;
        }
        let mut field = RecognizedField::new(
            kind_from_str(&f.kind),
            f.label.trim(),
            label_locator(&f.label),
            ExtractorSource::Vision,
        )
        .with_confidence(VISION_CONFIDENCE)
        .with_options(f.options)
        .with_accepted_types(f.accepted_file_types);
        if f.required {
            field = field.required();
        }
        if let Some(max) = f.max_length {
            field = field.with_max_length(max);
        }
        fields.push(field);
    }

    for label in parsed.next_buttons {
        fields.push(
            RecognizedField::new(
                FieldKind::Text,
                label.clone(),
                label_locator(&label),
                ExtractorSource::Vision,
            )
            .with_confidence(VISION_CONFIDENCE)
            .as_next_control(),
        );
    }
    for label in parsed.submit_buttons {
        fields.push(
            RecognizedField::new(
                FieldKind::Text,
                label.clone(),
                label_locator(&label),
                ExtractorSource::Vision,
            )
            .with_confidence(VISION_CONFIDENCE)
            .as_submit_control(),
        );
    }

    Ok(VisionAnalysis { fields })
}

/// Parse a "yes"/"no" CAPTCHA answer. Anything containing "yes" counts.
pub fn parse_captcha_response(raw: &str) -> bool {
    raw.to_lowercase().contains("yes")
}

/// Parse a confirmation-classification response.
///
/// Unparseable output is `Ambiguous`, never an error: the submission may
/// have succeeded regardless of what the model produced.
pub fn parse_confirmation_response(raw: &str) -> ConfirmationVerdict {
    let Some(slice) = json_slice(raw) else {
        return ConfirmationVerdict::Ambiguous;
    };
    match serde_json::from_str::<RawConfirmation>(slice) {
        Ok(c) if c.success => ConfirmationVerdict::Confirmed {
            message: c.message,
            confirmation_number: c.confirmation_number,
        },
        Ok(c) => ConfirmationVerdict::NotConfirmed { message: c.message },
        Err(e) => {
            warn!(error = %e, "unparseable confirmation response");
            ConfirmationVerdict::Ambiguous
        }
    }
}
