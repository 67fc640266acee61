//! Run controller: the per-application state machine.
//!
//! One controller run takes a job from a captured first page to exactly
//! one terminal [`ApplicationOutcome`], written to the outcome sink on
//! every exit path — success, failure, CAPTCHA halt or cancellation.
//!
//! The controller owns the page session (`&mut P`) for the full run, so
//! no other run can interleave actions on the same live page. Callers
//! sharing a browser page across runs serialize through their own
//! `Arc<tokio::sync::Mutex<_>>`.

use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::analyze::HybridAnalyzer;
use crate::error::{ApplyError, Result};
use crate::fill::FillDriver;
use crate::resolve::FieldResolver;
use crate::traits::{
    gate::{ApprovalGate, GateDecision},
    ocr::OcrEngine,
    page::PageSession,
    sink::OutcomeSink,
    vision::{ConfirmationVerdict, VisionModel},
    DocumentProvider,
};
use crate::types::{
    ApplicantProfile, ApplicationOutcome, ApplicationStatus, Discrepancy, JobTarget,
    RecognizedField, RunConfig, RunMode,
};

/// Pipeline states, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    PageCaptured,
    Analyzed,
    Resolved,
    Filled,
    NextPage,
    AwaitingSubmitDecision,
    Submitted,
    DryRunComplete,
    ConfirmationChecked,
    Terminal,
}

/// Everything accumulated across a run that ends up in the outcome.
#[derive(Debug, Default)]
struct RunContext {
    screenshots: Vec<String>,
    discrepancies: Vec<Discrepancy>,
    cv_path: Option<String>,
    cover_letter_path: Option<String>,
    /// Fields applied and verified across all pages so far.
    filled: usize,
    state: RunState,
}

impl Default for RunState {
    fn default() -> Self {
        Self::Start
    }
}

impl RunContext {
    fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }
}

/// The top-level state machine: one instance serves many runs, one run
/// per job application.
pub struct RunController<O, V, G, S, D>
where
    O: OcrEngine,
    V: VisionModel,
    G: ApprovalGate,
    S: OutcomeSink,
    D: DocumentProvider,
{
    analyzer: HybridAnalyzer<O, V>,
    resolver: FieldResolver,
    gate: G,
    sink: S,
    documents: D,
    config: RunConfig,
}

impl<O, V, G, S, D> RunController<O, V, G, S, D>
where
    O: OcrEngine,
    V: VisionModel,
    G: ApprovalGate,
    S: OutcomeSink,
    D: DocumentProvider,
{
    pub fn new(
        analyzer: HybridAnalyzer<O, V>,
        gate: G,
        sink: S,
        documents: D,
        config: RunConfig,
    ) -> Self {
        Self {
            analyzer,
            resolver: FieldResolver::new(),
            gate,
            sink,
            documents,
            config,
        }
    }

    /// Process one job application to a terminal outcome.
    ///
    /// Never returns an error: every internal failure folds into the
    /// outcome, which is also written to the sink before returning, so
    /// one run's failure can never abort sibling runs in a batch.
    pub async fn run<P: PageSession>(
        &self,
        page: &mut P,
        job: &JobTarget,
        profile: &ApplicantProfile,
        mode: RunMode,
    ) -> ApplicationOutcome {
        self.run_with_cancel(page, job, profile, mode, CancellationToken::new())
            .await
    }

    /// [`Self::run`] with operator cancellation. Cancellation at any
    /// suspension point still produces (and persists) a terminal
    /// outcome.
    pub async fn run_with_cancel<P: PageSession>(
        &self,
        page: &mut P,
        job: &JobTarget,
        profile: &ApplicantProfile,
        mode: RunMode,
        cancel: CancellationToken,
    ) -> ApplicationOutcome {
        info!(
            company = %job.company,
            title = %job.title,
            mode = ?mode,
            headless = self.config.headless,
            "starting application run"
        );

        let mut ctx = RunContext::default();

        let result = tokio::select! {
            result = self.execute(page, job, profile, mode, &mut ctx) => result,
            _ = cancel.cancelled() => Err(ApplyError::Cancelled),
        };

        let (status, detail) = match result {
            Ok(terminal) => terminal,
            Err(ApplyError::Cancelled) => (ApplicationStatus::Failed, "cancelled".to_string()),
            Err(ApplyError::CaptchaDetected) => (
                ApplicationStatus::CaptchaRequired,
                "CAPTCHA persisted after manual-intervention window".to_string(),
            ),
            Err(e) => (ApplicationStatus::Failed, e.to_string()),
        };

        ctx.transition(RunState::Terminal);
        info!(status = %status, detail = %detail, "run complete");

        let outcome = ApplicationOutcome::new(status, detail, job.clone())
            .with_screenshots(ctx.screenshots)
            .with_documents(ctx.cv_path, ctx.cover_letter_path)
            .with_discrepancies(ctx.discrepancies);

        // The sink failing must not lose the outcome for the caller.
        if let Err(e) = self.sink.record(&outcome).await {
            warn!(error = %e, "failed to persist outcome record");
        }

        outcome
    }

    /// The fallible pipeline. Accumulates audit state into `ctx` as it
    /// goes so the outcome is reconstructible up to the failure point.
    async fn execute<P: PageSession>(
        &self,
        page: &mut P,
        job: &JobTarget,
        profile: &ApplicantProfile,
        mode: RunMode,
        ctx: &mut RunContext,
    ) -> Result<(ApplicationStatus, String)> {
        let driver = FillDriver::new(self.config.stage_timeout);

        // Per-job documents overlay the profile's own.
        let documents = self.documents.documents_for(job).await?;
        let profile = if documents.cv.is_some() || documents.cover_letter.is_some() {
            profile.clone().with_documents(documents)
        } else {
            profile.clone()
        };
        ctx.cv_path = profile
            .documents()
            .cv
            .as_ref()
            .map(|d| d.primary.display().to_string());
        ctx.cover_letter_path = profile
            .documents()
            .cover_letter
            .as_ref()
            .map(|d| d.primary.display().to_string());

        self.bounded(page.goto(&job.url), "goto").await?;

        let mut captcha_retried = false;
        let mut last_fields: Vec<RecognizedField> = vec![];

        for page_number in 1..=self.config.max_pages {
            let mut snapshot = self.bounded(page.capture(), "capture").await?;
            ctx.transition(RunState::PageCaptured);
            if let Ok(reference) = page.save_screenshot(&format!("page_{page_number}")).await {
                ctx.screenshots.push(reference);
            }

            // CAPTCHA gate before any analysis is trusted.
            if self
                .bounded(self.analyzer.detect_captcha(&snapshot), "captcha_detection")
                .await?
            {
                if captcha_retried {
                    return Err(ApplyError::CaptchaDetected);
                }
                warn!(
                    wait = ?self.config.captcha_wait,
                    "CAPTCHA detected, pausing for manual intervention"
                );
                captcha_retried = true;
                sleep(self.config.captcha_wait).await;

                let retry_snapshot = self.bounded(page.capture(), "capture").await?;
                if self
                    .bounded(
                        self.analyzer.detect_captcha(&retry_snapshot),
                        "captcha_detection",
                    )
                    .await?
                {
                    return Err(ApplyError::CaptchaDetected);
                }
                snapshot = retry_snapshot;
            }

            // Analysis failures (both extractors erroring, or the stage
            // timing out) get one retry against a fresh capture; only the
            // retry failing fails the run.
            let fields = match self
                .bounded(self.analyzer.analyze(&snapshot), "analysis")
                .await
            {
                Ok(fields) => fields,
                Err(e) => {
                    warn!(error = %e, "analysis failed, retrying with a fresh capture");
                    let retry_snapshot = self.bounded(page.capture(), "capture").await?;
                    self.bounded(self.analyzer.analyze(&retry_snapshot), "analysis")
                        .await?
                }
            };
            ctx.transition(RunState::Analyzed);

            if fields.is_empty() {
                // Not a hard failure; confirmation screens look like this.
                ctx.discrepancies.push(Discrepancy::new(
                    format!("page {page_number}"),
                    "no recognizable fields on this page",
                ));
            }

            let resolutions = self.resolver.resolve(&fields, &profile);
            ctx.transition(RunState::Resolved);

            let mut page_result = driver.apply_all(page, resolutions, &fields).await;
            ctx.transition(RunState::Filled);
            if let Ok(reference) = page
                .save_screenshot(&format!("page_{page_number}_filled"))
                .await
            {
                page_result.screenshot = Some(reference.clone());
                ctx.screenshots.push(reference);
            }
            ctx.discrepancies.append(&mut page_result.discrepancies);
            ctx.filled += page_result.applied.len();

            if page_result.attempted() > 0
                && page_result.failure_rate() > self.config.fill_failure_tolerance
            {
                return Ok((
                    ApplicationStatus::Failed,
                    format!(
                        "fill failure rate {:.0}% on page {page_number} exceeds tolerance",
                        page_result.failure_rate() * 100.0
                    ),
                ));
            }

            if let Some(next) = FillDriver::next_control(&fields).cloned() {
                // Loop guard: a "next" on the final allowed page means
                // the control is likely misidentified.
                if page_number == self.config.max_pages {
                    return Ok((
                        ApplicationStatus::Failed,
                        format!("exceeded maximum pages ({})", self.config.max_pages),
                    ));
                }
                driver.advance(page, &next).await?;
                ctx.transition(RunState::NextPage);
                continue;
            }

            last_fields = fields;
            break;
        }

        ctx.transition(RunState::AwaitingSubmitDecision);
        self.decide_and_submit(page, job, mode, &driver, &last_fields, ctx)
            .await
    }

    /// The submit decision and everything after it.
    async fn decide_and_submit<P: PageSession>(
        &self,
        page: &mut P,
        job: &JobTarget,
        mode: RunMode,
        driver: &FillDriver,
        fields: &[RecognizedField],
        ctx: &mut RunContext,
    ) -> Result<(ApplicationStatus, String)> {
        // No fillable fields, no submit control, and nothing filled on
        // any earlier page: there is no application form here. That is
        // a skip, not a failure, and no gate decision is owed.
        if ctx.filled == 0
            && fields.iter().all(|f| !f.is_fillable())
            && FillDriver::submit_control(fields).is_none()
        {
            return Ok((
                ApplicationStatus::Skipped,
                "no applicable form located".to_string(),
            ));
        }

        if mode.is_dry_run() {
            ctx.transition(RunState::DryRunComplete);
            return Ok((
                ApplicationStatus::DryRunComplete,
                "dry run - all steps performed except submission".to_string(),
            ));
        }

        if self.config.manual_approval {
            match self.gate.approve(job).await? {
                GateDecision::Approve => {}
                GateDecision::Decline => {
                    return Ok((
                        ApplicationStatus::Skipped,
                        "manual approval declined".to_string(),
                    ));
                }
            }
        }

        let submit = FillDriver::submit_control(fields).ok_or(ApplyError::Navigation {
            reason: "no submit control found on final page".to_string(),
        })?;
        driver.submit(page, submit).await?;
        ctx.transition(RunState::Submitted);

        // Confirmation classification: advisory only. An ambiguous or
        // negative verdict never demotes a performed submission to
        // Failed; the application may genuinely have gone through.
        let detail = match self.bounded(page.capture(), "capture").await {
            Ok(snapshot) => {
                if let Ok(reference) = page.save_screenshot("confirmation").await {
                    ctx.screenshots.push(reference);
                }
                match self
                    .bounded(
                        self.analyzer.classify_confirmation(&snapshot),
                        "confirmation",
                    )
                    .await
                {
                    Ok(ConfirmationVerdict::Confirmed {
                        message,
                        confirmation_number,
                    }) => match confirmation_number {
                        Some(number) => format!("{message} (confirmation {number})"),
                        None => message,
                    },
                    Ok(ConfirmationVerdict::NotConfirmed { message }) => {
                        format!("submitted; confirmation unverified: {message}")
                    }
                    Ok(ConfirmationVerdict::Ambiguous) => {
                        "submitted; confirmation unverified".to_string()
                    }
                    Err(e) => {
                        warn!(error = %e, "confirmation classification failed");
                        "submitted; confirmation unverified".to_string()
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "post-submit capture failed");
                "submitted; confirmation unverified".to_string()
            }
        };
        ctx.transition(RunState::ConfirmationChecked);

        Ok((ApplicationStatus::Submitted, detail))
    }

    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T>>,
        stage: &'static str,
    ) -> Result<T> {
        timeout(self.config.stage_timeout, fut)
            .await
            .map_err(|_| ApplyError::Timeout { stage })?
    }
}
