//! CSV outcome log: one append-only row per application run.
//!
//! The log is the audit trail operators grep and open in a spreadsheet,
//! so the schema is flat text. Screenshot references are joined with `|`
//! into a single column.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ApplyError, Result};
use crate::traits::sink::OutcomeSink;
use crate::types::{ApplicationOutcome, ApplicationStatus};

/// One row of the log file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRow {
    pub timestamp: String,
    pub company: String,
    pub title: String,
    pub location: String,
    pub job_url: String,
    pub status: String,
    pub detail: String,
    pub cv_path: String,
    pub cover_letter_path: String,
    pub screenshots: String,
}

impl LogRow {
    fn from_outcome(outcome: &ApplicationOutcome) -> Self {
        Self {
            timestamp: outcome.recorded_at.to_rfc3339(),
            company: outcome.job.company.clone(),
            title: outcome.job.title.clone(),
            location: outcome.job.location.clone(),
            job_url: outcome.job.url.clone(),
            status: outcome.status.to_string(),
            detail: outcome.detail.clone(),
            cv_path: outcome.cv_path.clone().unwrap_or_default(),
            cover_letter_path: outcome.cover_letter_path.clone().unwrap_or_default(),
            screenshots: outcome.screenshots.join("|"),
        }
    }
}

/// Aggregate counts over the log, for operator run reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogReport {
    pub total: usize,
    pub submitted: usize,
    pub dry_run_complete: usize,
    pub skipped: usize,
    pub failed: usize,
    pub captcha_required: usize,

    /// Rows per company, for spotting repeat failures at one employer.
    pub by_company: BTreeMap<String, usize>,
}

/// Append-only CSV log of application outcomes.
///
/// Writes the header only when creating the file, so restarted batches
/// keep appending to the same log. Writes are serialized through a mutex;
/// the file is opened, appended and flushed per record so a crash loses
/// at most the in-flight row.
pub struct CsvOutcomeLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvOutcomeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_row(&self, row: &LogRow) -> Result<()> {
        let write_header = !self.path.exists();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        writer
            .serialize(row)
            .map_err(|e| ApplyError::Sink(Box::new(e)))?;
        writer
            .flush()
            .map_err(|e| ApplyError::Sink(Box::new(e)))?;
        Ok(())
    }

    /// Read the whole log back.
    pub fn rows(&self) -> Result<Vec<LogRow>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        let mut reader =
            csv::Reader::from_path(&self.path).map_err(|e| ApplyError::Sink(Box::new(e)))?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row.map_err(|e| ApplyError::Sink(Box::new(e)))?);
        }
        Ok(rows)
    }

    /// Aggregate the log into per-status counts.
    pub fn report(&self) -> Result<LogReport> {
        let mut report = LogReport::default();
        for row in self.rows()? {
            report.total += 1;
            *report.by_company.entry(row.company.clone()).or_default() += 1;
            match row.status.as_str() {
                s if s == ApplicationStatus::Submitted.as_str() => report.submitted += 1,
                s if s == ApplicationStatus::DryRunComplete.as_str() => {
                    report.dry_run_complete += 1
                }
                s if s == ApplicationStatus::Skipped.as_str() => report.skipped += 1,
                s if s == ApplicationStatus::CaptchaRequired.as_str() => {
                    report.captcha_required += 1
                }
                _ => report.failed += 1,
            }
        }
        Ok(report)
    }
}

#[async_trait]
impl OutcomeSink for CsvOutcomeLog {
    async fn record(&self, outcome: &ApplicationOutcome) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let row = LogRow::from_outcome(outcome);
        self.append_row(&row)?;
        debug!(path = %self.path.display(), company = %row.company, status = %row.status, "outcome logged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobTarget;

    fn outcome(status: ApplicationStatus, company: &str) -> ApplicationOutcome {
        let job = JobTarget::new(
            "j1",
            company,
            "Engineer",
            "Remote",
            "https://jobs.example.com/apply/1",
        );
        ApplicationOutcome::new(status, "detail", job)
            .with_screenshots(vec!["page_1.png".to_string(), "page_2.png".to_string()])
    }

    #[tokio::test]
    async fn test_header_written_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("applications_log.csv");

        let log = CsvOutcomeLog::new(&path);
        log.record(&outcome(ApplicationStatus::Submitted, "Acme"))
            .await
            .unwrap();

        // A fresh handle on the same file must not repeat the header.
        let log = CsvOutcomeLog::new(&path);
        log.record(&outcome(ApplicationStatus::Failed, "Globex"))
            .await
            .unwrap();

        let rows = log.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].company, "Acme");
        assert_eq!(rows[1].status, "failed");
        assert_eq!(rows[0].screenshots, "page_1.png|page_2.png");
    }

    #[tokio::test]
    async fn test_report_counts_by_status() {
        let dir = tempfile::tempdir().unwrap();
        let log = CsvOutcomeLog::new(dir.path().join("log.csv"));

        log.record(&outcome(ApplicationStatus::Submitted, "Acme"))
            .await
            .unwrap();
        log.record(&outcome(ApplicationStatus::Submitted, "Globex"))
            .await
            .unwrap();
        log.record(&outcome(ApplicationStatus::CaptchaRequired, "Initech"))
            .await
            .unwrap();

        let report = log.report().unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.submitted, 2);
        assert_eq!(report.captcha_required, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.by_company.get("Acme"), Some(&1));
    }

    #[tokio::test]
    async fn test_empty_log_reads_back_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = CsvOutcomeLog::new(dir.path().join("missing.csv"));
        assert!(log.rows().unwrap().is_empty());
        assert_eq!(log.report().unwrap(), LogReport::default());
    }
}
