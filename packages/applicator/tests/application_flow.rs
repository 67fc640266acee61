//! Integration tests for the application run controller.
//!
//! These tests verify the full apply workflow:
//! 1. Capture and analyze each form page
//! 2. Resolve fields against the applicant profile
//! 3. Fill and verify on the live page
//! 4. Navigate multi-page forms
//! 5. Reach exactly one terminal, persisted outcome

use std::time::Duration;

use applicator::{
    sinks::{CsvOutcomeLog, MemorySink},
    testing::{MockOcr, MockVision, PageCall, ScriptedPage, StaticDocuments, StaticGate},
    traits::gate::AutoApprove,
    ApplicantProfile, ApplicationStatus, ConfirmationVerdict, DocumentFormat, DocumentRef,
    ExtractorSource, FieldKind, HybridAnalyzer, JobTarget, OutcomeSink, RecognizedField,
    RunConfig, RunController, RunMode,
};
use tokio_util::sync::CancellationToken;

const APPLY_URL: &str = "https://jobs.example.com/apply/42";

fn job() -> JobTarget {
    JobTarget::new("42", "Acme", "Rust Engineer", "Remote", APPLY_URL)
}

fn profile() -> ApplicantProfile {
    ApplicantProfile::new()
        .with_fact("first_name", "Ada")
        .with_fact("email", "ada@example.com")
        .with_fact("years_of_experience", "2")
        .with_cv(DocumentRef::with_fallback(
            "cv.docx",
            DocumentFormat::Docx,
            "cv.pdf",
            DocumentFormat::Pdf,
        ))
}

/// Helper to create a vision-derived field.
fn vision_field(kind: FieldKind, label: &str) -> RecognizedField {
    RecognizedField::new(
        kind,
        label,
        format!("label={}", label.to_lowercase()),
        ExtractorSource::Vision,
    )
    .with_confidence(0.9)
}

fn submit_button() -> RecognizedField {
    vision_field(FieldKind::Text, "Submit").as_submit_control()
}

fn next_button() -> RecognizedField {
    vision_field(FieldKind::Text, "Next").as_next_control()
}

/// Controller wired to an empty-OCR analyzer, so every page's fields
/// come from the scripted vision queue.
fn controller<G, S>(
    vision: MockVision,
    gate: G,
    sink: S,
    config: RunConfig,
) -> RunController<MockOcr, MockVision, G, S, StaticDocuments>
where
    G: applicator::ApprovalGate,
    S: OutcomeSink,
{
    RunController::new(
        HybridAnalyzer::new(MockOcr::new(), vision),
        gate,
        sink,
        StaticDocuments::empty(),
        config,
    )
}

#[tokio::test]
async fn test_dry_run_fills_everything_but_never_submits() {
    let vision = MockVision::new().with_form_fields(vec![
        vision_field(FieldKind::Text, "First Name").required(),
        vision_field(FieldKind::Text, "Email"),
        vision_field(FieldKind::FileUpload, "Resume").with_accepted_types([".pdf", ".docx"]),
        submit_button(),
    ]);
    let sink = MemorySink::new();
    let controller = controller(vision, AutoApprove, sink.clone(), RunConfig::default());

    let mut page = ScriptedPage::single_page(APPLY_URL);
    let outcome = controller
        .run(&mut page, &job(), &profile(), RunMode::DryRun)
        .await;

    assert_eq!(outcome.status, ApplicationStatus::DryRunComplete);
    assert_eq!(page.value_of("label=first name"), Some("Ada".to_string()));
    assert_eq!(
        page.value_of("label=email"),
        Some("ada@example.com".to_string())
    );
    // The .docx variant is accepted and preferred.
    assert_eq!(page.value_of("label=resume"), Some("cv.docx".to_string()));

    // Nothing was clicked: no next control, and dry run never submits.
    assert!(page.clicks().is_empty());

    assert_eq!(sink.len(), 1);
    let recorded = &sink.outcomes()[0];
    assert_eq!(recorded.status, ApplicationStatus::DryRunComplete);
    assert_eq!(recorded.cv_path, Some("cv.docx".to_string()));
    assert_eq!(
        recorded.screenshots,
        vec!["page_1.png".to_string(), "page_1_filled.png".to_string()]
    );
}

#[tokio::test]
async fn test_multi_page_flow_carries_discrepancies_forward() {
    // Page 1: an unresolvable dropdown plus a next button. Page 2: the
    // rest of the form and the submit button.
    let vision = MockVision::new()
        .with_form_fields(vec![
            vision_field(FieldKind::Text, "First Name"),
            vision_field(FieldKind::Dropdown, "Years of Experience")
                .with_options(["0-1", "1-3", "3-5"]),
            next_button(),
        ])
        .with_form_fields(vec![vision_field(FieldKind::Text, "Email"), submit_button()]);
    let sink = MemorySink::new();
    let controller = controller(vision, AutoApprove, sink.clone(), RunConfig::default());

    let mut page = ScriptedPage::single_page(APPLY_URL).with_next("label=next");
    let outcome = controller
        .run(&mut page, &job(), &profile(), RunMode::DryRun)
        .await;

    assert_eq!(outcome.status, ApplicationStatus::DryRunComplete);
    assert_eq!(page.page_index(), 1);
    assert_eq!(page.clicks(), vec!["label=next".to_string()]);

    // Page 2 was filled after the advance.
    assert_eq!(
        page.value_of("label=email"),
        Some("ada@example.com".to_string())
    );

    // The profile's "2" matches none of the experience buckets; the gap
    // travels all the way into the outcome.
    assert!(outcome
        .discrepancies
        .iter()
        .any(|d| d.note.contains("none of the options")));
}

#[tokio::test]
async fn test_persistent_captcha_halts_without_submission() {
    let vision = MockVision::new().with_captcha_answers(vec![true, true]);
    let sink = MemorySink::new();
    let config = RunConfig::default().with_captcha_wait(Duration::ZERO);
    let controller = controller(vision.clone(), AutoApprove, sink.clone(), config);

    let mut page = ScriptedPage::single_page(APPLY_URL);
    let outcome = controller
        .run(&mut page, &job(), &profile(), RunMode::Live)
        .await;

    assert_eq!(outcome.status, ApplicationStatus::CaptchaRequired);
    assert!(page.clicks().is_empty());
    // The CAPTCHA gate fires before any form analysis is trusted.
    assert_eq!(vision.analyze_calls(), 0);
    assert_eq!(
        sink.outcomes()[0].status,
        ApplicationStatus::CaptchaRequired
    );
}

#[tokio::test]
async fn test_captcha_solved_within_window_continues() {
    // First check sees a CAPTCHA, the re-check after the wait does not.
    let vision = MockVision::new()
        .with_captcha_answers(vec![true, false])
        .with_form_fields(vec![vision_field(FieldKind::Text, "Email"), submit_button()]);
    let sink = MemorySink::new();
    let config = RunConfig::default().with_captcha_wait(Duration::ZERO);
    let controller = controller(vision, AutoApprove, sink, config);

    let mut page = ScriptedPage::single_page(APPLY_URL);
    let outcome = controller
        .run(&mut page, &job(), &profile(), RunMode::DryRun)
        .await;

    assert_eq!(outcome.status, ApplicationStatus::DryRunComplete);
    assert_eq!(
        page.value_of("label=email"),
        Some("ada@example.com".to_string())
    );
}

fn capture_count(page: &ScriptedPage) -> usize {
    page.calls()
        .iter()
        .filter(|c| matches!(c, PageCall::Capture))
        .count()
}

#[tokio::test]
async fn test_failed_analysis_retries_with_a_fresh_capture() {
    // The first analysis pass errors; the run must re-capture and try
    // once more before anything is allowed to fail.
    let vision = MockVision::new()
        .with_form_error()
        .with_form_fields(vec![vision_field(FieldKind::Text, "Email"), submit_button()]);
    let sink = MemorySink::new();
    let controller = controller(vision.clone(), AutoApprove, sink, RunConfig::default());

    let mut page = ScriptedPage::single_page(APPLY_URL);
    let outcome = controller
        .run(&mut page, &job(), &profile(), RunMode::DryRun)
        .await;

    assert_eq!(outcome.status, ApplicationStatus::DryRunComplete);
    assert_eq!(vision.analyze_calls(), 2);
    assert_eq!(capture_count(&page), 2);
    assert_eq!(
        page.value_of("label=email"),
        Some("ada@example.com".to_string())
    );
}

#[tokio::test]
async fn test_analysis_failing_twice_fails_the_run() {
    let vision = MockVision::new().with_form_error().with_form_error();
    let sink = MemorySink::new();
    let controller = controller(vision.clone(), AutoApprove, sink.clone(), RunConfig::default());

    let mut page = ScriptedPage::single_page(APPLY_URL);
    let outcome = controller
        .run(&mut page, &job(), &profile(), RunMode::DryRun)
        .await;

    assert_eq!(outcome.status, ApplicationStatus::Failed);
    // Exactly one retry: two captures, two analysis attempts, no more.
    assert_eq!(vision.analyze_calls(), 2);
    assert_eq!(capture_count(&page), 2);
    assert_eq!(sink.outcomes()[0].status, ApplicationStatus::Failed);
}

#[tokio::test]
async fn test_fieldless_page_is_skipped_not_failed() {
    // A page with no fields and no controls is not an application form.
    let vision = MockVision::new().with_form_fields(vec![]);
    let gate = StaticGate::approving();
    let sink = MemorySink::new();
    let config = RunConfig::default().with_manual_approval(true);
    let controller = controller(vision, gate.clone(), sink.clone(), config);

    let mut page = ScriptedPage::single_page(APPLY_URL);
    let outcome = controller
        .run(&mut page, &job(), &profile(), RunMode::Live)
        .await;

    assert_eq!(outcome.status, ApplicationStatus::Skipped);
    assert!(outcome.detail.contains("no applicable form"));
    assert!(page.clicks().is_empty());
    // There is nothing to approve when no form was located.
    assert_eq!(gate.approve_calls(), 0);
    assert_eq!(sink.outcomes()[0].status, ApplicationStatus::Skipped);
}

#[tokio::test]
async fn test_live_submit_verifies_confirmation() {
    let vision = MockVision::new()
        .with_form_fields(vec![
            vision_field(FieldKind::Text, "First Name"),
            submit_button(),
        ])
        .with_confirmation(ConfirmationVerdict::Confirmed {
            message: "Thank you for applying".to_string(),
            confirmation_number: Some("APP-9".to_string()),
        });
    let gate = StaticGate::approving();
    let sink = MemorySink::new();
    let config = RunConfig::default().with_manual_approval(true);
    let controller = controller(vision, gate.clone(), sink.clone(), config);

    let mut page = ScriptedPage::single_page(APPLY_URL);
    let outcome = controller
        .run(&mut page, &job(), &profile(), RunMode::Live)
        .await;

    assert_eq!(outcome.status, ApplicationStatus::Submitted);
    assert!(outcome.detail.contains("APP-9"));

    // The gate fired exactly once and submit was clicked exactly once.
    assert_eq!(gate.approve_calls(), 1);
    assert_eq!(page.clicks(), vec!["label=submit".to_string()]);
    assert!(page.screenshots().contains(&"confirmation".to_string()));
}

#[tokio::test]
async fn test_unverified_confirmation_still_counts_as_submitted() {
    // Default confirmation verdict is Ambiguous.
    let vision = MockVision::new().with_form_fields(vec![
        vision_field(FieldKind::Text, "First Name"),
        submit_button(),
    ]);
    let sink = MemorySink::new();
    let controller = controller(vision, AutoApprove, sink, RunConfig::default());

    let mut page = ScriptedPage::single_page(APPLY_URL);
    let outcome = controller
        .run(&mut page, &job(), &profile(), RunMode::Live)
        .await;

    assert_eq!(outcome.status, ApplicationStatus::Submitted);
    assert!(outcome.detail.contains("confirmation unverified"));
}

#[tokio::test]
async fn test_declined_gate_skips_the_job() {
    let vision = MockVision::new().with_form_fields(vec![
        vision_field(FieldKind::Text, "First Name"),
        submit_button(),
    ]);
    let gate = StaticGate::declining();
    let sink = MemorySink::new();
    let config = RunConfig::default().with_manual_approval(true);
    let controller = controller(vision, gate, sink.clone(), config);

    let mut page = ScriptedPage::single_page(APPLY_URL);
    let outcome = controller
        .run(&mut page, &job(), &profile(), RunMode::Live)
        .await;

    assert_eq!(outcome.status, ApplicationStatus::Skipped);
    assert!(page.clicks().is_empty());
    assert_eq!(sink.outcomes()[0].status, ApplicationStatus::Skipped);
}

#[tokio::test]
async fn test_missing_submit_control_fails_a_live_run() {
    let vision =
        MockVision::new().with_form_fields(vec![vision_field(FieldKind::Text, "First Name")]);
    let sink = MemorySink::new();
    let controller = controller(vision, AutoApprove, sink, RunConfig::default());

    let mut page = ScriptedPage::single_page(APPLY_URL);
    let outcome = controller
        .run(&mut page, &job(), &profile(), RunMode::Live)
        .await;

    assert_eq!(outcome.status, ApplicationStatus::Failed);
    assert!(outcome.detail.contains("no submit control"));
    assert!(page.clicks().is_empty());
}

#[tokio::test]
async fn test_page_loop_guard_fails_instead_of_looping() {
    // Every page advertises another "next": a misidentified control.
    let vision = MockVision::new()
        .with_form_fields(vec![vision_field(FieldKind::Text, "First Name"), next_button()])
        .with_form_fields(vec![vision_field(FieldKind::Text, "Email"), next_button()]);
    let sink = MemorySink::new();
    let config = RunConfig::default().with_max_pages(2);
    let controller = controller(vision, AutoApprove, sink, config);

    let mut page = ScriptedPage::single_page(APPLY_URL).with_next("label=next");
    let outcome = controller
        .run(&mut page, &job(), &profile(), RunMode::DryRun)
        .await;

    assert_eq!(outcome.status, ApplicationStatus::Failed);
    assert!(outcome.detail.contains("exceeded maximum pages"));
    assert_eq!(page.clicks().len(), 1);
}

#[tokio::test]
async fn test_cancellation_still_records_an_outcome() {
    let vision = MockVision::new();
    let sink = MemorySink::new();
    let controller = controller(vision, AutoApprove, sink.clone(), RunConfig::default());

    let mut page =
        ScriptedPage::single_page(APPLY_URL).with_capture_delay(Duration::from_secs(5));
    let token = CancellationToken::new();
    token.cancel();

    let outcome = controller
        .run_with_cancel(&mut page, &job(), &profile(), RunMode::Live, token)
        .await;

    assert_eq!(outcome.status, ApplicationStatus::Failed);
    assert_eq!(outcome.detail, "cancelled");
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn test_stage_timeout_fails_the_run() {
    let vision = MockVision::new();
    let sink = MemorySink::new();
    let config = RunConfig::default().with_stage_timeout(Duration::from_millis(50));
    let controller = controller(vision, AutoApprove, sink, config);

    let mut page =
        ScriptedPage::single_page(APPLY_URL).with_capture_delay(Duration::from_secs(5));
    let outcome = controller
        .run(&mut page, &job(), &profile(), RunMode::DryRun)
        .await;

    assert_eq!(outcome.status, ApplicationStatus::Failed);
    assert!(outcome.detail.contains("timeout during capture"));
}

#[tokio::test]
async fn test_outcomes_land_in_the_csv_log() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("applications_log.csv");

    let vision = MockVision::new().with_form_fields(vec![
        vision_field(FieldKind::Text, "First Name"),
        submit_button(),
    ]);
    let controller = controller(
        vision,
        AutoApprove,
        CsvOutcomeLog::new(&log_path),
        RunConfig::default(),
    );

    let mut page = ScriptedPage::single_page(APPLY_URL);
    controller
        .run(&mut page, &job(), &profile(), RunMode::DryRun)
        .await;

    let rows = CsvOutcomeLog::new(&log_path).rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].company, "Acme");
    assert_eq!(rows[0].status, "dry_run_complete");
    assert_eq!(rows[0].job_url, APPLY_URL);
}
