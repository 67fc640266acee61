//! Form analysis: the OCR fast path, the vision fallback, and the hybrid
//! arbitration between them.

pub mod hybrid;
pub mod ocr;
pub mod prompts;
pub mod vision;

pub use hybrid::{dedup_by_locator, HybridAnalyzer};
pub use ocr::OcrFieldExtractor;
pub use vision::{parse_confirmation_response, parse_form_response};
