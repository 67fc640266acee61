//! Field resolutions: the decided action for each recognized field.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::field::RecognizedField;

/// The action decided for a field.
///
/// `SkipUnresolved` is the only permitted action when no profile mapping
/// exists; the resolver never fabricates a value for an unmapped field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "value")]
pub enum FieldAction {
    FillText(String),
    SelectOption(String),
    Toggle(bool),
    UploadFile(PathBuf),
    SkipUnresolved,
}

impl FieldAction {
    /// Whether the driver has anything to do for this action.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::SkipUnresolved)
    }
}

/// A non-fatal recorded gap surfaced in the outcome detail for human
/// review: unresolved field, truncated text, unmatched dropdown value,
/// failed verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Label of the field the discrepancy concerns.
    pub field_label: String,

    /// What happened, in one line.
    pub note: String,
}

impl Discrepancy {
    pub fn new(field_label: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            field_label: field_label.into(),
            note: note.into(),
        }
    }
}

impl std::fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field_label, self.note)
    }
}

/// A recognized field paired with its decided action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldResolution {
    pub field: RecognizedField,
    pub action: FieldAction,

    /// Set when the resolution itself is a discrepancy (skip, truncation).
    pub discrepancy: Option<Discrepancy>,
}

impl FieldResolution {
    /// A resolution carrying a concrete action.
    pub fn resolved(field: RecognizedField, action: FieldAction) -> Self {
        Self {
            field,
            action,
            discrepancy: None,
        }
    }

    /// An unresolved field, recorded with the reason.
    pub fn skipped(field: RecognizedField, note: impl Into<String>) -> Self {
        let discrepancy = Discrepancy::new(field.label.clone(), note);
        Self {
            field,
            action: FieldAction::SkipUnresolved,
            discrepancy: Some(discrepancy),
        }
    }

    /// Attach a discrepancy to a resolved action (e.g. truncation).
    pub fn with_discrepancy(mut self, note: impl Into<String>) -> Self {
        self.discrepancy = Some(Discrepancy::new(self.field.label.clone(), note));
        self
    }
}
