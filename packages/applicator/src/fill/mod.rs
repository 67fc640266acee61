//! Form fill driver: applies resolutions to the live page and verifies
//! each application.
//!
//! A failed or unverified field never aborts the page; the driver
//! accumulates successes and failures into a [`PageResult`] and leaves
//! the tolerance decision to the run controller. Submission is a
//! distinct, separately-gated operation from `apply_all`.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{ApplyError, Result};
use crate::traits::page::PageSession;
use crate::types::{
    Discrepancy, FieldAction, FieldResolution, PageResult, RecognizedField,
};

/// Applies resolved values to a live page.
#[derive(Debug, Clone)]
pub struct FillDriver {
    /// Timeout for each individual live-page action.
    action_timeout: Duration,
}

impl FillDriver {
    pub fn new(action_timeout: Duration) -> Self {
        Self { action_timeout }
    }

    /// Apply one resolution. Side-effects the live page, then re-reads
    /// the control's state where feasible and compares to the intent.
    pub async fn apply<P: PageSession>(
        &self,
        page: &mut P,
        resolution: &FieldResolution,
    ) -> Result<bool> {
        let locator = &resolution.field.locator;

        match &resolution.action {
            FieldAction::FillText(value) => {
                self.bounded(page.fill_text(locator, value), "fill_text")
                    .await?;
                self.verify(page, locator, value).await
            }
            FieldAction::SelectOption(option) => {
                self.bounded(page.select_option(locator, option), "select_option")
                    .await?;
                self.verify(page, locator, option).await
            }
            FieldAction::Toggle(checked) => {
                self.bounded(page.set_checked(locator, *checked), "set_checked")
                    .await?;
                self.verify(page, locator, if *checked { "true" } else { "false" })
                    .await
            }
            FieldAction::UploadFile(path) => {
                self.bounded(page.attach_file(locator, path), "attach_file")
                    .await?;
                // File inputs rarely expose readable state; trust the
                // action when read-back is unavailable.
                self.verify(page, locator, &path.display().to_string())
                    .await
            }
            FieldAction::SkipUnresolved => Ok(true),
        }
    }

    /// Apply every resolution for a page and accumulate the result.
    ///
    /// `fields` is the full analyzer output for the page; it supplies
    /// the next-control metadata.
    pub async fn apply_all<P: PageSession>(
        &self,
        page: &mut P,
        resolutions: Vec<FieldResolution>,
        fields: &[RecognizedField],
    ) -> PageResult {
        let mut result = PageResult {
            next_found: Self::next_control(fields).is_some(),
            ..Default::default()
        };

        for resolution in resolutions {
            if let Some(d) = &resolution.discrepancy {
                result.discrepancies.push(d.clone());
            }
            if !resolution.action.is_actionable() {
                continue;
            }

            match self.apply(page, &resolution).await {
                Ok(true) => result.applied.push(resolution),
                Ok(false) => {
                    warn!(label = %resolution.field.label, "applied value did not verify");
                    result.discrepancies.push(Discrepancy::new(
                        resolution.field.label.clone(),
                        "applied value did not verify",
                    ));
                    result.failed.push(resolution);
                }
                Err(e) => {
                    warn!(label = %resolution.field.label, error = %e, "failed to apply field");
                    result.discrepancies.push(Discrepancy::new(
                        resolution.field.label.clone(),
                        format!("apply failed: {e}"),
                    ));
                    result.failed.push(resolution);
                }
            }
        }

        debug!(
            applied = result.applied.len(),
            failed = result.failed.len(),
            next_found = result.next_found,
            "page fill complete"
        );
        result
    }

    /// The page's "next" control, from analyzer metadata only.
    pub fn next_control(fields: &[RecognizedField]) -> Option<&RecognizedField> {
        fields.iter().find(|f| f.is_next_control)
    }

    /// The page's submit control, from analyzer metadata only.
    pub fn submit_control(fields: &[RecognizedField]) -> Option<&RecognizedField> {
        fields.iter().find(|f| f.is_submit_control)
    }

    /// Advance to the next form page.
    pub async fn advance<P: PageSession>(
        &self,
        page: &mut P,
        next: &RecognizedField,
    ) -> Result<()> {
        self.bounded(page.click(&next.locator), "click_next")
            .await
            .map_err(|e| match e {
                ApplyError::Timeout { .. } => ApplyError::Navigation {
                    reason: "next control did not respond".to_string(),
                },
                other => other,
            })
    }

    /// Perform the final destructive submission.
    ///
    /// Only the run controller calls this, and only when no next control
    /// was found and the run is live.
    pub async fn submit<P: PageSession>(
        &self,
        page: &mut P,
        submit: &RecognizedField,
    ) -> Result<()> {
        self.bounded(page.click(&submit.locator), "click_submit")
            .await
            .map_err(|e| match e {
                ApplyError::Timeout { .. } => ApplyError::Navigation {
                    reason: "submit control did not respond".to_string(),
                },
                other => other,
            })
    }

    /// Read back the control's state and compare with the intent.
    /// `None` from the page means the state is unobservable; the action
    /// is then trusted.
    async fn verify<P: PageSession>(
        &self,
        page: &mut P,
        locator: &str,
        intended: &str,
    ) -> Result<bool> {
        match self.bounded(page.read_value(locator), "read_value").await {
            Ok(Some(actual)) => Ok(actual == intended),
            Ok(None) => Ok(true),
            Err(e) => {
                // Verification failing is not the same as the action
                // failing; report an unverified success.
                warn!(locator = %locator, error = %e, "read-back failed");
                Ok(true)
            }
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T>>,
        stage: &'static str,
    ) -> Result<T> {
        timeout(self.action_timeout, fut)
            .await
            .map_err(|_| ApplyError::Timeout { stage })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPage;
    use crate::types::{ExtractorSource, FieldKind};

    fn text_field(label: &str) -> RecognizedField {
        RecognizedField::new(
            FieldKind::Text,
            label,
            format!("label={}", label.to_lowercase()),
            ExtractorSource::Ocr,
        )
    }

    fn driver() -> FillDriver {
        FillDriver::new(Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_apply_all_accumulates_successes() {
        let mut page = ScriptedPage::single_page("https://jobs.example.com/apply");
        let fields = vec![text_field("First Name"), text_field("Email")];
        let resolutions = vec![
            FieldResolution::resolved(
                fields[0].clone(),
                FieldAction::FillText("Ada".to_string()),
            ),
            FieldResolution::resolved(
                fields[1].clone(),
                FieldAction::FillText("ada@example.com".to_string()),
            ),
        ];

        let result = driver().apply_all(&mut page, resolutions, &fields).await;

        assert_eq!(result.applied.len(), 2);
        assert!(result.failed.is_empty());
        assert!(!result.next_found);
        assert_eq!(
            page.value_of("label=first name"),
            Some("Ada".to_string())
        );
    }

    #[tokio::test]
    async fn test_mismatch_is_recorded_not_fatal() {
        let mut page = ScriptedPage::single_page("https://jobs.example.com/apply")
            .sabotage("label=email", "wrong@example.com");
        let fields = vec![text_field("Email"), text_field("First Name")];
        let resolutions = vec![
            FieldResolution::resolved(
                fields[0].clone(),
                FieldAction::FillText("ada@example.com".to_string()),
            ),
            FieldResolution::resolved(
                fields[1].clone(),
                FieldAction::FillText("Ada".to_string()),
            ),
        ];

        let result = driver().apply_all(&mut page, resolutions, &fields).await;

        // The sabotaged field fails verification; the other still lands.
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.applied.len(), 1);
        assert_eq!(result.discrepancies.len(), 1);
    }

    #[tokio::test]
    async fn test_skip_unresolved_is_not_attempted() {
        let mut page = ScriptedPage::single_page("https://jobs.example.com/apply");
        let fields = vec![text_field("Mystery")];
        let resolutions = vec![FieldResolution::skipped(fields[0].clone(), "no mapping")];

        let result = driver().apply_all(&mut page, resolutions, &fields).await;

        assert!(result.applied.is_empty());
        assert!(result.failed.is_empty());
        assert_eq!(result.discrepancies.len(), 1);
        assert!(page.fill_calls().is_empty());
    }

    #[tokio::test]
    async fn test_next_control_detection_comes_from_metadata() {
        let fields = vec![
            text_field("First Name"),
            text_field("Next").as_next_control(),
        ];
        assert!(FillDriver::next_control(&fields).is_some());
        assert!(FillDriver::submit_control(&fields).is_none());
    }
}
