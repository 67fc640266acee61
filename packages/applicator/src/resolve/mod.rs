//! Field resolver: maps recognized fields to profile values, document
//! paths, or an explicit skip.
//!
//! Resolution is pure and deterministic: the same `(fields, profile)`
//! pair always produces the same resolution sequence. The resolver never
//! fabricates a value — a field with no profile mapping resolves to
//! `SkipUnresolved` and is recorded as a discrepancy.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::types::{
    ApplicantProfile, DocumentRef, FieldAction, FieldKind, FieldResolution, RecognizedField,
};

/// What a label pattern maps to.
#[derive(Debug, Clone, Copy)]
enum MappingTarget {
    /// A canonical profile fact key.
    Fact(&'static str),
    /// The CV document.
    Cv,
    /// The cover letter document.
    CoverLetter,
}

/// Ordered label-pattern table. First match wins, so the more specific
/// patterns ("first name") sit above the general ones ("name").
fn mapping_table() -> &'static Vec<(Regex, MappingTarget)> {
    static TABLE: OnceLock<Vec<(Regex, MappingTarget)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let rows: &[(&str, MappingTarget)] = &[
            (r"first\s*name|given\s*name", MappingTarget::Fact("first_name")),
            (
                r"last\s*name|surname|family\s*name",
                MappingTarget::Fact("last_name"),
            ),
            (r"full\s*name|\bname\b", MappingTarget::Fact("name")),
            (r"e\s*mail", MappingTarget::Fact("email")),
            (r"phone|mobile|telephone", MappingTarget::Fact("phone")),
            (r"\bcity\b", MappingTarget::Fact("city")),
            (r"country", MappingTarget::Fact("country")),
            (r"location|address", MappingTarget::Fact("location")),
            (r"linkedin", MappingTarget::Fact("linkedin")),
            (r"github", MappingTarget::Fact("github")),
            (r"portfolio|website", MappingTarget::Fact("portfolio")),
            (
                r"university|college|school",
                MappingTarget::Fact("university"),
            ),
            (r"degree|education", MappingTarget::Fact("degree")),
            (r"graduat", MappingTarget::Fact("graduation_year")),
            (
                r"about\s*(you|me|yourself)|professional\s*summary|introduce",
                MappingTarget::Fact("about_me"),
            ),
            (
                r"cover\s*letter",
                // Above the resume row: "cover letter" labels often
                // mention attachments generically.
                MappingTarget::CoverLetter,
            ),
            (r"resume|\bcv\b|curriculum", MappingTarget::Cv),
            (
                r"years?\s*of\s*experience|experience\s*level",
                MappingTarget::Fact("years_of_experience"),
            ),
            (
                r"notice\s*period|availab",
                MappingTarget::Fact("notice_period"),
            ),
            (
                r"salary|compensation",
                MappingTarget::Fact("salary_expectation"),
            ),
            (
                r"relocat",
                MappingTarget::Fact("willing_to_relocate"),
            ),
            (r"remote", MappingTarget::Fact("remote_ok")),
            (
                r"work\s*authori[sz]|authori[sz]ed\s*to\s*work",
                MappingTarget::Fact("work_authorization"),
            ),
            (
                r"sponsor|visa",
                MappingTarget::Fact("requires_sponsorship"),
            ),
        ];
        rows.iter()
            .map(|(pattern, target)| {
                (Regex::new(pattern).expect("static pattern"), *target)
            })
            .collect()
    })
}

/// Consent-ish checkbox labels that default to checked when required.
fn consent_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"agree|accept|terms|consent|privacy|policy").expect("static pattern")
    })
}

/// Normalize a label for matching: lowercase, punctuation stripped,
/// whitespace collapsed.
pub fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Match a value against dropdown/radio options: exact (case-insensitive)
/// first, then case-insensitive substring. Returns the option text to
/// select, never the raw value.
fn match_option<'a>(value: &str, options: &'a [String]) -> Option<&'a str> {
    // An empty value substring-matches everything; it can never justify
    // selecting an option.
    if value.trim().is_empty() {
        return None;
    }
    let value_lower = value.to_lowercase();

    if let Some(exact) = options.iter().find(|o| o.to_lowercase() == value_lower) {
        return Some(exact);
    }
    options
        .iter()
        .find(|o| o.to_lowercase().contains(&value_lower))
        .map(String::as_str)
}

/// Maps recognized fields to actions using the applicant profile.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldResolver;

impl FieldResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve every fillable field on a page. Navigation controls are
    /// passed through untouched by the resolver (the driver handles
    /// them separately) and therefore excluded here.
    pub fn resolve(
        &self,
        fields: &[RecognizedField],
        profile: &ApplicantProfile,
    ) -> Vec<FieldResolution> {
        fields
            .iter()
            .filter(|f| f.is_fillable())
            .map(|f| self.resolve_field(f, profile))
            .collect()
    }

    fn resolve_field(
        &self,
        field: &RecognizedField,
        profile: &ApplicantProfile,
    ) -> FieldResolution {
        let normalized = normalize_label(&field.label);

        match field.kind {
            FieldKind::FileUpload => self.resolve_upload(field, profile, &normalized),
            FieldKind::Checkbox => self.resolve_checkbox(field, &normalized),
            FieldKind::Dropdown | FieldKind::RadioGroup => {
                self.resolve_choice(field, profile, &normalized)
            }
            FieldKind::Text | FieldKind::Textarea => {
                self.resolve_text(field, profile, &normalized)
            }
        }
    }

    /// Look up the mapped profile value for a normalized label.
    fn mapped_value<'p>(
        &self,
        normalized: &str,
        profile: &'p ApplicantProfile,
    ) -> Option<&'p str> {
        for (pattern, target) in mapping_table() {
            if pattern.is_match(normalized) {
                return match target {
                    MappingTarget::Fact(key) => profile.fact(key),
                    // Document targets are handled by resolve_upload;
                    // a text field asking for a "resume link" has no
                    // fact to offer.
                    MappingTarget::Cv | MappingTarget::CoverLetter => None,
                };
            }
        }
        None
    }

    fn mapped_document<'p>(
        &self,
        normalized: &str,
        profile: &'p ApplicantProfile,
    ) -> Option<&'p DocumentRef> {
        for (pattern, target) in mapping_table() {
            if pattern.is_match(normalized) {
                return match target {
                    MappingTarget::Cv => profile.documents().cv.as_ref(),
                    MappingTarget::CoverLetter => profile.documents().cover_letter.as_ref(),
                    MappingTarget::Fact(_) => None,
                };
            }
        }
        None
    }

    fn resolve_text(
        &self,
        field: &RecognizedField,
        profile: &ApplicantProfile,
        normalized: &str,
    ) -> FieldResolution {
        let Some(value) = self.mapped_value(normalized, profile) else {
            debug!(label = %field.label, "no profile mapping for field");
            return FieldResolution::skipped(field.clone(), "no profile mapping");
        };

        // Truncate to the advertised bound; never hand the driver an
        // over-long value.
        if let Some(max) = field.max_length {
            if value.chars().count() > max {
                let truncated: String = value.chars().take(max).collect();
                return FieldResolution::resolved(
                    field.clone(),
                    FieldAction::FillText(truncated),
                )
                .with_discrepancy(format!("text truncated to {max} characters"));
            }
        }

        FieldResolution::resolved(field.clone(), FieldAction::FillText(value.to_string()))
    }

    fn resolve_choice(
        &self,
        field: &RecognizedField,
        profile: &ApplicantProfile,
        normalized: &str,
    ) -> FieldResolution {
        let Some(value) = self.mapped_value(normalized, profile) else {
            return FieldResolution::skipped(field.clone(), "no profile mapping");
        };

        match match_option(value, &field.options) {
            Some(option) => FieldResolution::resolved(
                field.clone(),
                FieldAction::SelectOption(option.to_string()),
            ),
            // Guessing the closest option would misrepresent the
            // applicant; record the gap instead.
            None => FieldResolution::skipped(
                field.clone(),
                format!("profile value {value:?} matches none of the options"),
            ),
        }
    }

    fn resolve_checkbox(&self, field: &RecognizedField, normalized: &str) -> FieldResolution {
        if field.required && consent_pattern().is_match(normalized) {
            FieldResolution::resolved(field.clone(), FieldAction::Toggle(true))
        } else {
            FieldResolution::skipped(field.clone(), "checkbox left unresolved")
        }
    }

    fn resolve_upload(
        &self,
        field: &RecognizedField,
        profile: &ApplicantProfile,
        normalized: &str,
    ) -> FieldResolution {
        let Some(doc) = self.mapped_document(normalized, profile) else {
            return FieldResolution::skipped(field.clone(), "no document for this field");
        };

        match doc.pick(&field.accepted_file_types) {
            Some(path) => FieldResolution::resolved(
                field.clone(),
                FieldAction::UploadFile(path.to_path_buf()),
            ),
            None => FieldResolution::skipped(
                field.clone(),
                "no document variant matches the accepted file types",
            ),
        }
    }
}
