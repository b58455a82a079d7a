// src/config.rs
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::utils::error::AppError;

pub const DEFAULT_BASE_URL: &str = "https://www.screener.in";
pub const LOGIN_PATH: &str = "/login/";

/// Opaque login secret. Never printed.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Upper bounds for every blocking wait. No wait in the crate is unbounded.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Page loads (`goto`).
    pub navigation: Duration,
    /// Post-submit navigation event after login.
    pub login: Duration,
    /// Login form fields, page-arrival marker, search widgets.
    pub selector: Duration,
    /// Each optional section on the company page.
    pub section: Duration,
    /// Reveal/collapse of one schedule.
    pub schedule: Duration,
    /// Pause letting an autocomplete list settle before it is read.
    pub settle: Duration,
    /// Whole-request budget.
    pub total: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(120),
            login: Duration::from_secs(30),
            selector: Duration::from_secs(30),
            section: Duration::from_secs(15),
            schedule: Duration::from_secs(10),
            settle: Duration::from_secs(1),
            total: Duration::from_secs(300),
        }
    }
}

/// The target site's origin. Canonical paths are only ever joined onto it.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    base_url: Url,
}

impl SiteConfig {
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config(format!("Base URL '{}' cannot carry paths", base_url)));
        }
        Ok(Self { base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins a site-relative path onto the origin. Paths that resolve to a
    /// different origin yield `None`.
    pub fn url_for(&self, path: &str) -> Option<Url> {
        let url = self.base_url.join(path).ok()?;
        (url.origin() == self.base_url.origin()).then_some(url)
    }

    pub fn login_url(&self) -> Option<Url> {
        self.url_for(LOGIN_PATH)
    }

    pub fn is_login_url(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => parsed.path().starts_with(LOGIN_PATH),
            Err(_) => url.contains(LOGIN_PATH),
        }
    }

    /// Reduces an absolute same-origin link to its path; relative links pass through.
    pub fn site_path(&self, link: &str) -> Option<String> {
        let url = self.url_for(link)?;
        Some(url.path().to_string())
    }
}

/// Everything the process reads at startup, passed down explicitly.
#[derive(Debug, Clone)]
pub struct Settings {
    pub site: SiteConfig,
    pub credentials: Credentials,
    pub timeouts: Timeouts,
    pub chrome_bin: Option<PathBuf>,
    pub headless: bool,
    pub debug_dir: Option<PathBuf>,
    pub expand_schedules: bool,
}
