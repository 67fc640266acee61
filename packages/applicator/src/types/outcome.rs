//! Application outcomes: the one record per run that crosses into
//! persistent storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resolution::Discrepancy;

/// Job identity and apply entry point, supplied by the external
/// scraper/job-data collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTarget {
    /// Stable identifier used to key generated documents.
    pub id: String,

    pub company: String,
    pub title: String,
    pub location: String,

    /// The job's apply entry point; the pipeline never navigates search
    /// results, only this URL.
    pub url: String,
}

impl JobTarget {
    pub fn new(
        id: impl Into<String>,
        company: impl Into<String>,
        title: impl Into<String>,
        location: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            company: company.into(),
            title: title.into(),
            location: location.into(),
            url: url.into(),
        }
    }
}

/// Terminal status of one application run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Submitted,
    DryRunComplete,
    Skipped,
    Failed,
    CaptchaRequired,
}

impl ApplicationStatus {
    /// Storage representation, matching the outcome-log contract.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::DryRunComplete => "dry_run_complete",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::CaptchaRequired => "captcha_required",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal record for one job application. Created once the run
/// controller reaches a terminal state; immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationOutcome {
    pub status: ApplicationStatus,

    /// Free-text detail: confirmation message, error description,
    /// "confirmation unverified", "cancelled", ...
    pub detail: String,

    pub job: JobTarget,

    pub recorded_at: DateTime<Utc>,

    /// Ordered screenshot references taken during the run.
    pub screenshots: Vec<String>,

    /// Document paths actually used.
    pub cv_path: Option<String>,
    pub cover_letter_path: Option<String>,

    /// Non-fatal gaps accumulated across all pages.
    pub discrepancies: Vec<Discrepancy>,
}

impl ApplicationOutcome {
    pub fn new(status: ApplicationStatus, detail: impl Into<String>, job: JobTarget) -> Self {
        Self {
            status,
            detail: detail.into(),
            job,
            recorded_at: Utc::now(),
            screenshots: vec![],
            cv_path: None,
            cover_letter_path: None,
            discrepancies: vec![],
        }
    }

    pub fn with_screenshots(mut self, screenshots: Vec<String>) -> Self {
        self.screenshots = screenshots;
        self
    }

    pub fn with_documents(
        mut self,
        cv_path: Option<String>,
        cover_letter_path: Option<String>,
    ) -> Self {
        self.cv_path = cv_path;
        self.cover_letter_path = cover_letter_path;
        self
    }

    pub fn with_discrepancies(mut self, discrepancies: Vec<Discrepancy>) -> Self {
        self.discrepancies = discrepancies;
        self
    }
}
