//! AI backends for the vision trait.

mod ollama;

pub use ollama::{OllamaConfig, OllamaVision};
