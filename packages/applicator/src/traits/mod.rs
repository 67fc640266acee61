//! Core trait abstractions: the seams where real browsers, OCR engines,
//! vision models, approval gates, document generators and persistence
//! plug into the pipeline.

pub mod documents;
pub mod gate;
pub mod ocr;
pub mod page;
pub mod sink;
pub mod vision;

pub use documents::DocumentProvider;
pub use gate::{ApprovalGate, AutoApprove, GateDecision};
pub use ocr::{OcrEngine, TextBox};
pub use page::PageSession;
pub use sink::OutcomeSink;
pub use vision::{ConfirmationVerdict, VisionAnalysis, VisionModel};
