// src/browser/mod.rs
//! Headless-browser capability.
//!
//! Everything the session, expander and resolver do to a live page goes
//! through [`BrowserPage`]. One page is launched per request and closed on
//! every exit path by whoever launched it.

pub mod chrome;
#[cfg(test)]
pub mod scripted;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::utils::error::BrowserError;

pub use chrome::ChromeLauncher;

/// When a `goto` is considered finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    Load,
    NetworkIdle,
}

/// Element state a selector wait is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    /// Present in the DOM.
    Attached,
    /// Present and rendered with a non-empty box.
    Visible,
    /// Absent or not rendered.
    Hidden,
}

#[derive(Debug, Clone, Copy)]
pub struct WaitOptions {
    pub state: ElementState,
    pub timeout: Duration,
}

impl WaitOptions {
    pub fn attached(timeout: Duration) -> Self {
        Self { state: ElementState::Attached, timeout }
    }

    pub fn visible(timeout: Duration) -> Self {
        Self { state: ElementState::Visible, timeout }
    }

    pub fn hidden(timeout: Duration) -> Self {
        Self { state: ElementState::Hidden, timeout }
    }
}

/// A single rendered page. All calls on one page are strictly sequential.
#[async_trait]
pub trait BrowserPage: Send {
    async fn goto(&mut self, url: &str, wait: WaitUntil, timeout: Duration) -> Result<(), BrowserError>;

    async fn wait_for_selector(&mut self, selector: &str, opts: WaitOptions) -> Result<(), BrowserError>;

    /// Marks the current document so that a later [`wait_for_navigation`]
    /// only accepts a document loaded after this call. Call it before the
    /// action that is expected to navigate.
    ///
    /// [`wait_for_navigation`]: BrowserPage::wait_for_navigation
    async fn arm_navigation(&mut self) -> Result<(), BrowserError>;

    /// Waits until a document newer than the one current at the last
    /// `arm_navigation` has replaced it and finished loading. A page that
    /// was already loaded does not count.
    async fn wait_for_navigation(&mut self, timeout: Duration) -> Result<(), BrowserError>;

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError>;

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError>;

    async fn current_url(&mut self) -> Result<String, BrowserError>;

    /// Serialized HTML of the current document.
    async fn content(&mut self) -> Result<String, BrowserError>;

    async fn screenshot(&mut self, path: &Path) -> Result<(), BrowserError>;

    /// Releases the page and its browser process. Safe to call twice.
    async fn close(&mut self) -> Result<(), BrowserError>;
}

#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    type Page: BrowserPage;

    async fn launch(&self) -> Result<Self::Page, BrowserError>;
}

/// Closes a page, logging instead of propagating a failed release.
pub async fn release<P: BrowserPage>(page: &mut P) {
    match page.close().await {
        Ok(()) => tracing::debug!("Browser session released"),
        Err(e) => tracing::warn!("Failed to release browser session cleanly: {}", e),
    }
}
