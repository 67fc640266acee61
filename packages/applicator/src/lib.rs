//! Form Analysis and Fill Orchestration
//!
//! Turns a screenshot of a job-application form into structured fields,
//! resolves each field against an applicant profile, fills the live page,
//! and drives the multi-page apply flow to exactly one terminal outcome
//! per job.
//!
//! # Design Philosophy
//!
//! **"Trust fast paths, verify with slow ones"**
//!
//! - OCR first (hundreds of milliseconds), vision fallback (seconds)
//! - Closed action enums, no stringly-typed dispatch
//! - Every run ends in exactly one logged outcome, errors included
//! - Destructive submission is a distinct, separately-gated operation
//! - Library handles mechanics, app supplies the browser and the profile
//!
//! # Usage
//!
//! ```rust,ignore
//! use applicator::{
//!     ApplicantProfile, HybridAnalyzer, JobTarget, RunConfig, RunController, RunMode,
//! };
//! use applicator::ai::{OllamaConfig, OllamaVision};
//! use applicator::sinks::CsvOutcomeLog;
//! use applicator::traits::gate::AutoApprove;
//! use applicator::testing::StaticDocuments;
//!
//! let analyzer = HybridAnalyzer::new(my_ocr_engine, OllamaVision::with_defaults()?);
//! let sink = CsvOutcomeLog::new("applications_log.csv");
//! let controller = RunController::new(
//!     analyzer,
//!     AutoApprove,
//!     sink,
//!     StaticDocuments::empty(),
//!     RunConfig::default(),
//! );
//!
//! let outcome = controller
//!     .run(&mut page, &job, &profile, RunMode::DryRun)
//!     .await;
//! println!("{}: {}", outcome.status, outcome.detail);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (PageSession, OcrEngine, VisionModel, ...)
//! - [`types`] - Domain data types (fields, resolutions, outcomes, config)
//! - [`analyze`] - Hybrid OCR/vision form analysis
//! - [`resolve`] - Field-to-profile-value resolution
//! - [`fill`] - Live-page fill driver with read-back verification
//! - [`run`] - Per-application run controller state machine
//! - [`sinks`] - Outcome persistence (CSV log, in-memory)
//! - [`ai`] - Vision model backends (Ollama)
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod analyze;
pub mod error;
pub mod fill;
pub mod resolve;
pub mod run;
pub mod sinks;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{ApplyError, Result};
pub use traits::{
    documents::DocumentProvider,
    gate::{ApprovalGate, GateDecision},
    ocr::{OcrEngine, TextBox},
    page::PageSession,
    sink::OutcomeSink,
    vision::{ConfirmationVerdict, VisionAnalysis, VisionModel},
};
pub use types::{
    AnalyzerConfig, ApplicantProfile, ApplicationOutcome, ApplicationStatus, Discrepancy,
    DocumentFormat, DocumentRef, Documents, ExtractorSource, FieldAction, FieldKind,
    FieldResolution, FormSnapshot, JobTarget, PageResult, RecognizedField, RunConfig, RunMode,
};

// Re-export the pipeline components
pub use analyze::{dedup_by_locator, HybridAnalyzer, OcrFieldExtractor};
pub use fill::FillDriver;
pub use resolve::FieldResolver;
pub use run::{RunController, RunState};
