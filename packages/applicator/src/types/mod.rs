//! Data types for the form analysis and fill pipeline.

pub mod config;
pub mod field;
pub mod outcome;
pub mod page;
pub mod profile;
pub mod resolution;

pub use config::{AnalyzerConfig, RunConfig, RunMode};
pub use field::{ExtractorSource, FieldKind, RecognizedField};
pub use outcome::{ApplicationOutcome, ApplicationStatus, JobTarget};
pub use page::{FormSnapshot, PageResult};
pub use profile::{ApplicantProfile, DocumentFormat, DocumentRef, Documents};
pub use resolution::{Discrepancy, FieldAction, FieldResolution};
