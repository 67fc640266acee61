//! Recognized form fields: the output unit of extraction.

use serde::{Deserialize, Serialize};

/// The closed set of form control kinds the pipeline understands.
///
/// Every consumer matches exhaustively on this enum; adding a variant is
/// a compile-time-visible change, unlike the stringly-typed dispatch the
/// pipeline replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Textarea,
    Dropdown,
    Checkbox,
    FileUpload,
    RadioGroup,
}

/// Which extractor produced a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorSource {
    Ocr,
    Vision,
}

/// One recognized field on a form page.
///
/// The `locator` is an opaque handle sufficient for a
/// [`crate::traits::PageSession`] to act on the live element. It is never
/// a raw pixel coordinate, so it survives minor re-renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizedField {
    pub kind: FieldKind,

    /// Best-guess human-readable prompt for the field.
    pub label: String,

    /// Opaque handle for acting on the live element.
    pub locator: String,

    /// Best-effort required flag (asterisk or "required" in the label,
    /// or the model saying so).
    pub required: bool,

    /// Ordered options, for dropdowns and radio groups.
    #[serde(default)]
    pub options: Vec<String>,

    /// Accepted file types, for file uploads (e.g. ".pdf", ".docx").
    #[serde(default)]
    pub accepted_file_types: Vec<String>,

    /// Maximum text length, when the page advertises one.
    pub max_length: Option<usize>,

    /// Extractor confidence in [0.0, 1.0].
    pub confidence: f32,

    pub source: ExtractorSource,

    /// This control advances to the next form page.
    #[serde(default)]
    pub is_next_control: bool,

    /// This control performs the final submission.
    #[serde(default)]
    pub is_submit_control: bool,
}

impl RecognizedField {
    /// Create a field with defaults for the optional metadata.
    pub fn new(
        kind: FieldKind,
        label: impl Into<String>,
        locator: impl Into<String>,
        source: ExtractorSource,
    ) -> Self {
        Self {
            kind,
            label: label.into(),
            locator: locator.into(),
            required: false,
            options: vec![],
            accepted_file_types: vec![],
            max_length: None,
            confidence: 0.0,
            source,
            is_next_control: false,
            is_submit_control: false,
        }
    }

    /// Mark as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the extractor confidence.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Set dropdown/radio options.
    pub fn with_options(mut self, options: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.options = options.into_iter().map(|o| o.into()).collect();
        self
    }

    /// Set accepted file types.
    pub fn with_accepted_types(
        mut self,
        types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.accepted_file_types = types.into_iter().map(|t| t.into()).collect();
        self
    }

    /// Set the max text length.
    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Mark as the page's "next" control.
    pub fn as_next_control(mut self) -> Self {
        self.is_next_control = true;
        self
    }

    /// Mark as the page's final submit control.
    pub fn as_submit_control(mut self) -> Self {
        self.is_submit_control = true;
        self
    }

    /// Whether this is an input the driver can act on (not a nav control).
    pub fn is_fillable(&self) -> bool {
        !self.is_next_control && !self.is_submit_control
    }
}
