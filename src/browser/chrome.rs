// src/browser/chrome.rs
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{BrowserLauncher, BrowserPage, ElementState, WaitOptions, WaitUntil};
use crate::utils::error::BrowserError;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const NETWORK_IDLE_MS: u64 = 500;
// Window property set on the document a navigation is expected to replace.
const NAVIGATION_MARK: &str = "__screenerNavigationArmed";

const LAUNCH_ARGS: &[&str] = &[
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--disable-gpu",
    "--disable-extensions",
    "--disable-notifications",
    "--disable-infobars",
    "--disable-blink-features=AutomationControlled",
];

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        BrowserError::Protocol(e.to_string())
    }
}

/// Launch settings for a Chrome session.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    pub chrome_bin: Option<PathBuf>,
    pub headless: bool,
    pub launch_timeout: Duration,
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    type Page = ChromePage;

    async fn launch(&self) -> Result<ChromePage, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .request_timeout(self.launch_timeout)
            .args(LAUNCH_ARGS.iter().copied());
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(bin) = &self.chrome_bin {
            tracing::debug!("Using browser binary at {}", bin.display());
            builder = builder.chrome_executable(bin);
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        tracing::info!("Launching Chrome (headless: {})", self.headless);
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::warn!("CDP handler event error: {}", e);
                }
            }
        });

        let page = match open_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                // The process is already running; don't leak it on a failed setup.
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler.abort();
                return Err(e);
            }
        };

        Ok(ChromePage { browser, page, handler, closed: false })
    }
}

async fn open_page(browser: &Browser) -> Result<Page, BrowserError> {
    let page = browser.new_page("about:blank").await?;
    page.set_user_agent(USER_AGENT).await?;
    page.execute(SetExtraHttpHeadersParams::new(Headers::new(serde_json::json!({
        "Accept-Language": "en-US,en;q=0.9",
    }))))
    .await?;
    Ok(page)
}

/// A live Chrome tab plus the process and CDP handler task behind it.
pub struct ChromePage {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    closed: bool,
}

impl ChromePage {
    async fn selector_in_state(&self, selector: &str, state: ElementState) -> Result<bool, BrowserError> {
        let wanted = match state {
            ElementState::Attached => "attached",
            ElementState::Visible => "visible",
            ElementState::Hidden => "hidden",
        };
        let js = format!(
            r#"(() => {{
                const el = document.querySelector({selector});
                if (!el) return {wanted} === 'hidden';
                if ({wanted} === 'attached') return true;
                const style = window.getComputedStyle(el);
                const rect = el.getBoundingClientRect();
                const shown = style.visibility !== 'hidden' && style.display !== 'none'
                    && (rect.width > 0 || rect.height > 0);
                return {wanted} === 'visible' ? shown : !shown;
            }})()"#,
            selector = serde_json::Value::from(selector),
            wanted = serde_json::Value::from(wanted),
        );
        let result = self.page.evaluate(js).await?;
        result
            .into_value::<bool>()
            .map_err(|e| BrowserError::Protocol(format!("selector check for '{}': {}", selector, e)))
    }

    /// Resolves once the resource count has been stable for a short window.
    async fn wait_for_network_idle(&self, timeout: Duration) {
        let js = format!(
            r#"(async () => {{
                const start = Date.now();
                let last = performance.getEntriesByType('resource').length;
                let stable = 0;
                while (Date.now() - start < {timeout_ms}) {{
                    await new Promise(r => setTimeout(r, 100));
                    const now = performance.getEntriesByType('resource').length;
                    if (document.readyState === 'complete' && now === last) {{
                        stable += 100;
                        if (stable >= {idle_ms}) return true;
                    }} else {{
                        stable = 0;
                    }}
                    last = now;
                }}
                return false;
            }})()"#,
            timeout_ms = timeout.as_millis(),
            idle_ms = NETWORK_IDLE_MS,
        );
        match self.page.evaluate(js).await.map(|r| r.into_value::<bool>()) {
            Ok(Ok(true)) => tracing::debug!("Network idle reached"),
            Ok(_) => tracing::warn!("Network did not settle within {:?}", timeout),
            Err(e) => tracing::warn!("Network idle check failed: {}", e),
        }
    }
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn goto(&mut self, url: &str, wait: WaitUntil, timeout: Duration) -> Result<(), BrowserError> {
        let started = Instant::now();
        tracing::debug!("Navigating to {}", url);
        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .map_err(|_| BrowserError::timeout(format!("navigation to {}", url), timeout))??;

        if wait == WaitUntil::NetworkIdle {
            let remaining = timeout.saturating_sub(started.elapsed());
            self.wait_for_network_idle(remaining).await;
        }
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, opts: WaitOptions) -> Result<(), BrowserError> {
        let deadline = Instant::now() + opts.timeout;
        loop {
            if self.selector_in_state(selector, opts.state).await? {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::timeout(
                    format!("'{}' to be {:?}", selector, opts.state),
                    opts.timeout,
                ));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn arm_navigation(&mut self) -> Result<(), BrowserError> {
        let js = format!("(() => {{ window[{}] = true; return true; }})()", serde_json::Value::from(NAVIGATION_MARK));
        self.page.evaluate(js).await?;
        Ok(())
    }

    // chromiumoxide's own wait answers at once when the frame is already
    // loaded, so the armed marker is polled instead: it only disappears with
    // the document that carried it.
    async fn wait_for_navigation(&mut self, timeout: Duration) -> Result<(), BrowserError> {
        let js = format!(
            "(() => window[{}] !== true && document.readyState === 'complete')()",
            serde_json::Value::from(NAVIGATION_MARK)
        );
        let deadline = Instant::now() + timeout;
        loop {
            // Evaluation fails while the old context is being torn down.
            match self.page.evaluate(js.clone()).await.map(|r| r.into_value::<bool>()) {
                Ok(Ok(true)) => return Ok(()),
                Ok(_) => {}
                Err(e) => tracing::trace!("Navigation check failed mid-load: {}", e),
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::timeout("navigation event", timeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        element.click().await?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        Ok(self.page.content().await?)
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), BrowserError> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.page.save_screenshot(params, path).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Waiting for the browser process failed: {}", e);
        }
        self.handler.abort();
        result.map(|_| ()).map_err(BrowserError::from)
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        if !self.closed {
            // chromiumoxide kills the child process when `Browser` drops.
            tracing::warn!("Browser page dropped without close; killing the process");
            self.handler.abort();
        }
    }
}
