//! Applicant profile: the canonical facts used to fill forms.
//!
//! The profile is loaded once, never mutated by the pipeline, and shared
//! read-only across runs (wrap it in an `Arc` when running applications
//! concurrently).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File format of a generated application document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Docx,
    Pdf,
}

impl DocumentFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    /// Whether a field's accepted-file-types set admits this format.
    ///
    /// Accepted types may appear as extensions (".pdf"), bare names
    /// ("pdf") or MIME-ish strings ("application/pdf").
    pub fn accepted_by(&self, accepted: &[String]) -> bool {
        if accepted.is_empty() {
            // No restriction advertised.
            return true;
        }
        let ext = self.extension();
        accepted
            .iter()
            .any(|a| a.trim_start_matches('.').to_lowercase().contains(ext))
    }
}

/// A generated document in a primary and a fallback format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Preferred variant (usually `.docx`, friendliest to ATS parsers).
    pub primary: PathBuf,
    pub primary_format: DocumentFormat,

    /// Fallback variant (usually `.pdf`).
    pub fallback: Option<PathBuf>,
    pub fallback_format: Option<DocumentFormat>,
}

impl DocumentRef {
    /// A single-format document.
    pub fn single(path: impl Into<PathBuf>, format: DocumentFormat) -> Self {
        Self {
            primary: path.into(),
            primary_format: format,
            fallback: None,
            fallback_format: None,
        }
    }

    /// A document with both variants.
    pub fn with_fallback(
        primary: impl Into<PathBuf>,
        primary_format: DocumentFormat,
        fallback: impl Into<PathBuf>,
        fallback_format: DocumentFormat,
    ) -> Self {
        Self {
            primary: primary.into(),
            primary_format,
            fallback: Some(fallback.into()),
            fallback_format: Some(fallback_format),
        }
    }

    /// Pick the variant matching a field's accepted file types.
    ///
    /// Prefers the primary format; falls back to the secondary variant
    /// when the primary is not accepted. Returns `None` when neither
    /// variant is acceptable.
    pub fn pick(&self, accepted: &[String]) -> Option<&Path> {
        if self.primary_format.accepted_by(accepted) {
            return Some(&self.primary);
        }
        match (&self.fallback, self.fallback_format) {
            (Some(path), Some(format)) if format.accepted_by(accepted) => Some(path),
            _ => None,
        }
    }
}

/// Named documents attached to a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Documents {
    pub cv: Option<DocumentRef>,
    pub cover_letter: Option<DocumentRef>,
}

/// Immutable map of canonical personal facts plus document references.
///
/// Keys are canonical snake_case fact names ("first_name", "email",
/// "work_authorization", ...). The resolver maps recognized field labels
/// onto these keys; the profile itself knows nothing about forms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicantProfile {
    facts: BTreeMap<String, String>,

    #[serde(default)]
    documents: Documents,
}

impl ApplicantProfile {
    /// Create an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a canonical fact.
    pub fn with_fact(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.facts.insert(key.into(), value.into());
        self
    }

    /// Attach the CV document.
    pub fn with_cv(mut self, doc: DocumentRef) -> Self {
        self.documents.cv = Some(doc);
        self
    }

    /// Attach the cover letter document.
    pub fn with_cover_letter(mut self, doc: DocumentRef) -> Self {
        self.documents.cover_letter = Some(doc);
        self
    }

    /// Look up a fact by canonical key.
    pub fn fact(&self, key: &str) -> Option<&str> {
        self.facts.get(key).map(String::as_str)
    }

    /// The attached documents.
    pub fn documents(&self) -> &Documents {
        &self.documents
    }

    /// Replace the documents wholesale (used when a document provider
    /// supplies per-job paths).
    pub fn with_documents(mut self, documents: Documents) -> Self {
        self.documents = documents;
        self
    }
}
