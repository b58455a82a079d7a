// src/browser/scripted.rs
//! In-memory page used by tests. Selector waits are answered by running the
//! selector against the current HTML with `scraper`, so fixtures behave like
//! the rendered site as far as the extractors can tell.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::{BrowserLauncher, BrowserPage, ElementState, WaitOptions, WaitUntil};
use crate::utils::error::BrowserError;

/// What a click on a given selector does to the page.
#[derive(Debug, Clone)]
pub enum ClickEffect {
    /// Loads another route. `emits_event` controls whether a navigation
    /// event is observable afterwards.
    Navigate { url: String, emits_event: bool },
    /// Alternates between the given HTML and whatever was shown before.
    Toggle { expanded: String },
    /// Like `Toggle`, but the expanded HTML only lands once something waits
    /// on the page, as an asynchronous render would.
    Reveal { expanded: String },
    /// Expands on the first click; every later click fails, leaving it open.
    Stuck { expanded: String },
    /// The element exists but the click itself fails.
    Fail,
}

#[derive(Debug, Default)]
pub struct PageLog {
    pub actions: Vec<String>,
    pub launches: usize,
    pub closed: bool,
}

#[derive(Debug, Default, Clone)]
pub struct Script {
    pub routes: HashMap<String, String>,
    pub clicks: HashMap<String, ClickEffect>,
    /// Elements matching any of these selectors are present but never visible.
    pub hidden: Vec<String>,
    /// Added to every `goto`, for exercising overall budgets.
    pub latency: Duration,
    /// Time a launch takes before the page exists.
    pub launch_delay: Duration,
}

impl Script {
    pub fn route(mut self, url: &str, html: &str) -> Self {
        self.routes.insert(url.to_string(), html.to_string());
        self
    }

    pub fn on_click(mut self, selector: &str, effect: ClickEffect) -> Self {
        self.clicks.insert(selector.to_string(), effect);
        self
    }
}

#[derive(Clone)]
pub struct ScriptedLauncher {
    script: Script,
    log: Arc<Mutex<PageLog>>,
}

impl ScriptedLauncher {
    pub fn new(script: Script) -> Self {
        Self { script, log: Arc::new(Mutex::new(PageLog::default())) }
    }

    pub fn log(&self) -> Arc<Mutex<PageLog>> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl BrowserLauncher for ScriptedLauncher {
    type Page = ScriptedPage;

    async fn launch(&self) -> Result<ScriptedPage, BrowserError> {
        if !self.script.launch_delay.is_zero() {
            tokio::time::sleep(self.script.launch_delay).await;
        }
        let mut log = self.log.lock().unwrap();
        log.launches += 1;
        log.closed = false;
        Ok(ScriptedPage::new(self.script.clone(), Arc::clone(&self.log), ""))
    }
}

pub struct ScriptedPage {
    script: Script,
    log: Arc<Mutex<PageLog>>,
    url: String,
    html: String,
    collapsed: HashMap<String, String>,
    /// A reveal clicked but not yet rendered: (control selector, expanded HTML).
    pending_reveal: Option<(String, String)>,
    /// A document finished loading and no armed wait has consumed it yet.
    /// Set by every `goto`, mirroring a browser whose frame is already loaded.
    loaded: bool,
}

impl ScriptedPage {
    fn new(script: Script, log: Arc<Mutex<PageLog>>, html: &str) -> Self {
        Self {
            script,
            log,
            url: "about:blank".to_string(),
            html: html.to_string(),
            collapsed: HashMap::new(),
            pending_reveal: None,
            loaded: false,
        }
    }

    pub fn with_html(html: &str) -> (Self, Arc<Mutex<PageLog>>) {
        let log = Arc::new(Mutex::new(PageLog::default()));
        (Self::new(Script::default(), Arc::clone(&log), html), log)
    }

    pub fn script_mut(&mut self) -> &mut Script {
        &mut self.script
    }

    fn record(&self, action: String) {
        self.log.lock().unwrap().actions.push(action);
    }

    fn matches(&self, selector: &str) -> Result<bool, BrowserError> {
        let parsed = parse(selector)?;
        Ok(Html::parse_document(&self.html).select(&parsed).next().is_some())
    }

    /// (present, visible) for the first element matching `selector`.
    fn element_state(&self, selector: &str) -> Result<(bool, bool), BrowserError> {
        let parsed = parse(selector)?;
        let hidden = self.script.hidden.iter().map(|h| parse(h)).collect::<Result<Vec<_>, _>>()?;
        let document = Html::parse_document(&self.html);
        Ok(match document.select(&parsed).next() {
            Some(element) => (true, !hidden.iter().any(|h| h.matches(&element))),
            None => (false, false),
        })
    }

    fn render_pending_reveal(&mut self) -> bool {
        let Some((selector, expanded)) = self.pending_reveal.take() else { return false };
        let previous = std::mem::replace(&mut self.html, expanded);
        self.collapsed.insert(selector, previous);
        true
    }
}

fn parse(selector: &str) -> Result<Selector, BrowserError> {
    Selector::parse(selector).map_err(|_| BrowserError::Protocol(format!("invalid selector '{}'", selector)))
}

#[async_trait]
impl BrowserPage for ScriptedPage {
    async fn goto(&mut self, url: &str, _wait: WaitUntil, timeout: Duration) -> Result<(), BrowserError> {
        self.record(format!("goto {}", url));
        if !self.script.latency.is_zero() {
            tokio::time::sleep(self.script.latency).await;
        }
        let html = self
            .script
            .routes
            .get(url)
            .cloned()
            .ok_or_else(|| BrowserError::timeout(format!("navigation to {}", url), timeout))?;
        self.url = url.to_string();
        self.html = html;
        self.loaded = true;
        Ok(())
    }

    async fn wait_for_selector(&mut self, selector: &str, opts: WaitOptions) -> Result<(), BrowserError> {
        loop {
            let (present, visible) = self.element_state(selector)?;
            let satisfied = match opts.state {
                ElementState::Attached => present,
                ElementState::Visible => visible,
                ElementState::Hidden => !visible,
            };
            if satisfied {
                return Ok(());
            }
            // Waiting is what gives a deferred reveal the chance to render.
            if !self.render_pending_reveal() {
                return Err(BrowserError::timeout(format!("'{}' to be {:?}", selector, opts.state), opts.timeout));
            }
        }
    }

    async fn arm_navigation(&mut self) -> Result<(), BrowserError> {
        self.record("arm navigation".to_string());
        self.loaded = false;
        Ok(())
    }

    async fn wait_for_navigation(&mut self, timeout: Duration) -> Result<(), BrowserError> {
        if std::mem::take(&mut self.loaded) {
            Ok(())
        } else {
            Err(BrowserError::timeout("navigation event", timeout))
        }
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), BrowserError> {
        if !self.matches(selector)? {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        self.record(format!("type {} {}", selector, text));
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        self.record(format!("click {}", selector));
        if !self.matches(selector)? {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        match self.script.clicks.get(selector).cloned() {
            Some(ClickEffect::Navigate { url, emits_event }) => {
                self.html = self.script.routes.get(&url).cloned().unwrap_or_default();
                self.url = url;
                self.loaded = emits_event;
            }
            Some(ClickEffect::Toggle { expanded }) => match self.collapsed.remove(selector) {
                Some(previous) => self.html = previous,
                None => {
                    let previous = std::mem::replace(&mut self.html, expanded);
                    self.collapsed.insert(selector.to_string(), previous);
                }
            },
            Some(ClickEffect::Reveal { expanded }) => match self.collapsed.remove(selector) {
                Some(previous) => self.html = previous,
                None => self.pending_reveal = Some((selector.to_string(), expanded)),
            },
            Some(ClickEffect::Stuck { expanded }) => {
                if self.collapsed.contains_key(selector) {
                    return Err(BrowserError::Protocol(format!("click on '{}' failed", selector)));
                }
                let previous = std::mem::replace(&mut self.html, expanded);
                self.collapsed.insert(selector.to_string(), previous);
            }
            Some(ClickEffect::Fail) => {
                return Err(BrowserError::Protocol(format!("click on '{}' failed", selector)));
            }
            None => {}
        }
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.url.clone())
    }

    async fn content(&mut self) -> Result<String, BrowserError> {
        Ok(self.html.clone())
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), BrowserError> {
        std::fs::write(path, b"scripted-screenshot")?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.record("close".to_string());
        self.log.lock().unwrap().closed = true;
        Ok(())
    }
}
