//! Page session trait: the live browser page behind an opaque seam.
//!
//! Implementations wrap a real browser page (CDP, WebDriver, Playwright
//! bridge, ...). The pipeline only ever acts through locators handed back
//! by the analyzer, never raw coordinates.
//!
//! # Exclusivity
//!
//! The run controller takes the session by value for the full duration of
//! a run, so no two runs can interleave actions on the same live page.
//! Callers sharing one browser page across sequential runs should hold it
//! in an `Arc<tokio::sync::Mutex<_>>` and pass the owned guard.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::FormSnapshot;

/// A live form page: screenshots and element actions on demand.
#[async_trait]
pub trait PageSession: Send {
    /// Navigate to a URL and wait for render completion.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Current page URL.
    fn current_url(&self) -> String;

    /// Capture a full-page screenshot of the current state.
    async fn capture(&mut self) -> Result<FormSnapshot>;

    /// Type text into the element behind `locator`, replacing any
    /// existing value.
    async fn fill_text(&mut self, locator: &str, value: &str) -> Result<()>;

    /// Select a dropdown or radio option by visible text.
    async fn select_option(&mut self, locator: &str, option: &str) -> Result<()>;

    /// Set a checkbox's checked state.
    async fn set_checked(&mut self, locator: &str, checked: bool) -> Result<()>;

    /// Attach a file to a file-upload input.
    async fn attach_file(&mut self, locator: &str, path: &std::path::Path) -> Result<()>;

    /// Read back the control's current value, where the page exposes it.
    /// Returns `None` when the state is not observable (e.g. some file
    /// inputs); the driver then trusts the action optimistically.
    async fn read_value(&mut self, locator: &str) -> Result<Option<String>>;

    /// Click a control (next/submit buttons).
    async fn click(&mut self, locator: &str) -> Result<()>;

    /// Persist the latest screenshot for audit and return its reference.
    async fn save_screenshot(&mut self, name: &str) -> Result<String>;
}
