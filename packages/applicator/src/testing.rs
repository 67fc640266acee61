//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the applicator
//! library without a real browser, OCR engine or vision model.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ApplyError, Result};
use crate::traits::{
    gate::{ApprovalGate, GateDecision},
    ocr::{OcrEngine, TextBox},
    page::PageSession,
    vision::{ConfirmationVerdict, VisionAnalysis, VisionModel},
    DocumentProvider,
};
use crate::types::{Documents, FormSnapshot, JobTarget, RecognizedField};

/// A mock OCR engine returning a fixed set of text boxes.
#[derive(Default, Clone)]
pub struct MockOcr {
    boxes: Vec<TextBox>,
    fail: bool,
    calls: Arc<RwLock<usize>>,
}

impl MockOcr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return these boxes for every snapshot.
    pub fn with_boxes(mut self, boxes: Vec<TextBox>) -> Self {
        self.boxes = boxes;
        self
    }

    /// Fail every call.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn read_calls(&self) -> usize {
        *self.calls.read().unwrap()
    }
}

#[async_trait]
impl OcrEngine for MockOcr {
    async fn read_boxes(&self, _image: &[u8]) -> Result<Vec<TextBox>> {
        *self.calls.write().unwrap() += 1;
        if self.fail {
            return Err(ApplyError::Analysis {
                reason: "mock OCR configured to fail".to_string(),
            });
        }
        Ok(self.boxes.clone())
    }
}

/// One scripted answer to an `analyze_form` call.
#[derive(Clone)]
enum ScriptedAnalysis {
    Fields(Vec<RecognizedField>),
    Fail,
}

/// A mock vision model with scripted per-call responses.
///
/// Form analyses and CAPTCHA answers are queues consumed one per call;
/// an exhausted queue yields an empty analysis / `false`. Confirmation
/// verdicts are a single configurable answer (default `Ambiguous`).
#[derive(Clone)]
pub struct MockVision {
    form_responses: Arc<RwLock<VecDeque<ScriptedAnalysis>>>,
    captcha_answers: Arc<RwLock<VecDeque<bool>>>,
    confirmation: Arc<RwLock<ConfirmationVerdict>>,
    fail: bool,
    analyze_calls: Arc<RwLock<usize>>,
    captcha_calls: Arc<RwLock<usize>>,
    confirmation_calls: Arc<RwLock<usize>>,
}

impl Default for MockVision {
    fn default() -> Self {
        Self {
            form_responses: Arc::default(),
            captcha_answers: Arc::default(),
            confirmation: Arc::new(RwLock::new(ConfirmationVerdict::Ambiguous)),
            fail: false,
            analyze_calls: Arc::default(),
            captcha_calls: Arc::default(),
            confirmation_calls: Arc::default(),
        }
    }
}

impl MockVision {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue one form-analysis response; calls consume in order.
    pub fn with_form_fields(self, fields: Vec<RecognizedField>) -> Self {
        self.form_responses
            .write()
            .unwrap()
            .push_back(ScriptedAnalysis::Fields(fields));
        self
    }

    /// Enqueue one failing form analysis; later calls keep consuming the
    /// queue normally.
    pub fn with_form_error(self) -> Self {
        self.form_responses
            .write()
            .unwrap()
            .push_back(ScriptedAnalysis::Fail);
        self
    }

    /// Enqueue CAPTCHA answers; calls consume in order, then `false`.
    pub fn with_captcha_answers(self, answers: Vec<bool>) -> Self {
        self.captcha_answers.write().unwrap().extend(answers);
        self
    }

    /// Set the confirmation verdict returned for every classification.
    pub fn with_confirmation(self, verdict: ConfirmationVerdict) -> Self {
        *self.confirmation.write().unwrap() = verdict;
        self
    }

    /// Fail every call.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn analyze_calls(&self) -> usize {
        *self.analyze_calls.read().unwrap()
    }

    pub fn captcha_calls(&self) -> usize {
        *self.captcha_calls.read().unwrap()
    }

    pub fn confirmation_calls(&self) -> usize {
        *self.confirmation_calls.read().unwrap()
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail {
            return Err(ApplyError::Analysis {
                reason: "mock vision configured to fail".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VisionModel for MockVision {
    async fn analyze_form(&self, _image: &[u8]) -> Result<VisionAnalysis> {
        *self.analyze_calls.write().unwrap() += 1;
        self.check_failure()?;
        match self.form_responses.write().unwrap().pop_front() {
            Some(ScriptedAnalysis::Fields(fields)) => Ok(VisionAnalysis { fields }),
            Some(ScriptedAnalysis::Fail) => Err(ApplyError::Analysis {
                reason: "scripted analysis failure".to_string(),
            }),
            None => Ok(VisionAnalysis::default()),
        }
    }

    async fn detect_captcha(&self, _image: &[u8]) -> Result<bool> {
        *self.captcha_calls.write().unwrap() += 1;
        self.check_failure()?;
        Ok(self
            .captcha_answers
            .write()
            .unwrap()
            .pop_front()
            .unwrap_or(false))
    }

    async fn classify_confirmation(&self, _image: &[u8]) -> Result<ConfirmationVerdict> {
        *self.confirmation_calls.write().unwrap() += 1;
        self.check_failure()?;
        Ok(self.confirmation.read().unwrap().clone())
    }
}

/// Record of a call made to the scripted page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageCall {
    Goto(String),
    Capture,
    FillText { locator: String, value: String },
    SelectOption { locator: String, option: String },
    SetChecked { locator: String, checked: bool },
    AttachFile { locator: String, path: String },
    ReadValue(String),
    Click(String),
    SaveScreenshot(String),
}

/// A scripted in-memory page session.
///
/// Tracks a page index that advances when a registered next-locator is
/// clicked; `capture` returns a snapshot whose image byte is the page
/// index, so scripted analyzers can key responses per page.
pub struct ScriptedPage {
    url: String,
    page_index: usize,
    values: HashMap<String, String>,
    sabotaged: HashMap<String, String>,
    next_locators: HashSet<String>,
    capture_delay: Duration,
    failing_locators: HashSet<String>,
    calls: Arc<RwLock<Vec<PageCall>>>,
}

impl ScriptedPage {
    /// A page with no next-controls: clicking never advances.
    pub fn single_page(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            page_index: 0,
            values: HashMap::new(),
            sabotaged: HashMap::new(),
            next_locators: HashSet::new(),
            capture_delay: Duration::ZERO,
            failing_locators: HashSet::new(),
            calls: Arc::default(),
        }
    }

    /// Register a locator whose click advances to the next page.
    pub fn with_next(mut self, locator: impl Into<String>) -> Self {
        self.next_locators.insert(locator.into());
        self
    }

    /// Make read-back for this locator return a wrong value.
    pub fn sabotage(mut self, locator: impl Into<String>, wrong: impl Into<String>) -> Self {
        self.sabotaged.insert(locator.into(), wrong.into());
        self
    }

    /// Make every action on this locator fail.
    pub fn with_failing_locator(mut self, locator: impl Into<String>) -> Self {
        self.failing_locators.insert(locator.into());
        self
    }

    /// Delay every capture, for timeout tests.
    pub fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = delay;
        self
    }

    /// Zero-based index of the page currently shown.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// The value last applied to a locator.
    pub fn value_of(&self, locator: &str) -> Option<String> {
        self.values.get(locator).cloned()
    }

    pub fn calls(&self) -> Vec<PageCall> {
        self.calls.read().unwrap().clone()
    }

    /// All `fill_text` calls as (locator, value) pairs.
    pub fn fill_calls(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PageCall::FillText { locator, value } => Some((locator, value)),
                _ => None,
            })
            .collect()
    }

    /// All clicked locators, in order.
    pub fn clicks(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PageCall::Click(locator) => Some(locator),
                _ => None,
            })
            .collect()
    }

    /// Screenshot names saved, in order.
    pub fn screenshots(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PageCall::SaveScreenshot(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: PageCall) {
        self.calls.write().unwrap().push(call);
    }

    fn check_locator(&self, locator: &str) -> Result<()> {
        if self.failing_locators.contains(locator) {
            return Err(ApplyError::Navigation {
                reason: format!("scripted failure for {locator}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PageSession for ScriptedPage {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.record(PageCall::Goto(url.to_string()));
        self.url = url.to_string();
        Ok(())
    }

    fn current_url(&self) -> String {
        self.url.clone()
    }

    async fn capture(&mut self) -> Result<FormSnapshot> {
        self.record(PageCall::Capture);
        if !self.capture_delay.is_zero() {
            tokio::time::sleep(self.capture_delay).await;
        }
        Ok(FormSnapshot::new(
            vec![self.page_index as u8],
            self.url.clone(),
        ))
    }

    async fn fill_text(&mut self, locator: &str, value: &str) -> Result<()> {
        self.record(PageCall::FillText {
            locator: locator.to_string(),
            value: value.to_string(),
        });
        self.check_locator(locator)?;
        self.values.insert(locator.to_string(), value.to_string());
        Ok(())
    }

    async fn select_option(&mut self, locator: &str, option: &str) -> Result<()> {
        self.record(PageCall::SelectOption {
            locator: locator.to_string(),
            option: option.to_string(),
        });
        self.check_locator(locator)?;
        self.values.insert(locator.to_string(), option.to_string());
        Ok(())
    }

    async fn set_checked(&mut self, locator: &str, checked: bool) -> Result<()> {
        self.record(PageCall::SetChecked {
            locator: locator.to_string(),
            checked,
        });
        self.check_locator(locator)?;
        self.values
            .insert(locator.to_string(), checked.to_string());
        Ok(())
    }

    async fn attach_file(&mut self, locator: &str, path: &Path) -> Result<()> {
        self.record(PageCall::AttachFile {
            locator: locator.to_string(),
            path: path.display().to_string(),
        });
        self.check_locator(locator)?;
        self.values
            .insert(locator.to_string(), path.display().to_string());
        Ok(())
    }

    async fn read_value(&mut self, locator: &str) -> Result<Option<String>> {
        self.record(PageCall::ReadValue(locator.to_string()));
        if let Some(wrong) = self.sabotaged.get(locator) {
            return Ok(Some(wrong.clone()));
        }
        Ok(self.values.get(locator).cloned())
    }

    async fn click(&mut self, locator: &str) -> Result<()> {
        self.record(PageCall::Click(locator.to_string()));
        self.check_locator(locator)?;
        if self.next_locators.contains(locator) {
            self.page_index += 1;
        }
        Ok(())
    }

    async fn save_screenshot(&mut self, name: &str) -> Result<String> {
        self.record(PageCall::SaveScreenshot(name.to_string()));
        Ok(format!("{name}.png"))
    }
}

/// A gate that always answers the same way and counts invocations.
#[derive(Clone)]
pub struct StaticGate {
    decision: GateDecision,
    calls: Arc<RwLock<usize>>,
}

impl StaticGate {
    pub fn approving() -> Self {
        Self {
            decision: GateDecision::Approve,
            calls: Arc::default(),
        }
    }

    pub fn declining() -> Self {
        Self {
            decision: GateDecision::Decline,
            calls: Arc::default(),
        }
    }

    pub fn approve_calls(&self) -> usize {
        *self.calls.read().unwrap()
    }
}

#[async_trait]
impl ApprovalGate for StaticGate {
    async fn approve(&self, _job: &JobTarget) -> Result<GateDecision> {
        *self.calls.write().unwrap() += 1;
        Ok(self.decision)
    }
}

/// A document provider that hands the same documents to every job.
#[derive(Debug, Clone, Default)]
pub struct StaticDocuments {
    documents: Documents,
}

impl StaticDocuments {
    /// No documents for any job.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(documents: Documents) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl DocumentProvider for StaticDocuments {
    async fn documents_for(&self, _job: &JobTarget) -> Result<Documents> {
        Ok(self.documents.clone())
    }
}
