//! OCR engine trait: fast, low-confidence structural text detection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One piece of text with its bounding box, as read off a screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub text: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,

    /// Engine confidence in [0.0, 1.0].
    pub confidence: f32,
}

impl TextBox {
    pub fn new(text: impl Into<String>, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            width,
            height,
            confidence: 1.0,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Right edge of the box.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }
}

/// OCR engine: reads text boxes off a PNG screenshot.
///
/// Target latency is a few hundred milliseconds; the structural field
/// inference on top of the boxes lives in [`crate::analyze::ocr`].
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Extract all text with bounding boxes from a PNG image.
    async fn read_boxes(&self, image: &[u8]) -> Result<Vec<TextBox>>;
}
