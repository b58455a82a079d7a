// src/screener/session.rs
//! Navigation controller: drives one browser page from a fresh launch to a
//! verified company page.

use std::fmt;
use std::path::Path;

use crate::browser::{self, BrowserPage, WaitOptions, WaitUntil};
use crate::config::{Credentials, SiteConfig, Timeouts};
use crate::screener::models::CompanyRef;
use crate::utils::error::{BrowserError, NavigationError};
use crate::utils::html_debug;

const USERNAME_INPUT: &str = "#id_username";
const PASSWORD_INPUT: &str = "#id_password";
const LOGIN_BUTTON: &str = "button.button-primary";

/// Present only once the company page has rendered its ratios.
pub const PAGE_MARKER: &str = ".company-ratios";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Navigating,
    OnTargetPage,
    Failed(String),
}

/// A page plus the state it has been driven to.
pub struct Session<'p, P: BrowserPage> {
    page: &'p mut P,
    state: SessionState,
}

impl<'p, P: BrowserPage> Session<'p, P> {
    pub fn new(page: &'p mut P) -> Self {
        Self { page, state: SessionState::Unauthenticated }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!("Session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, error: NavigationError) -> NavigationError {
        self.transition(SessionState::Failed(error.to_string()));
        error
    }
}

/// A page confirmed to be showing the requested company.
pub struct ReadyPage<'p, P: BrowserPage> {
    pub page: &'p mut P,
    pub company: CompanyRef,
    pub url: String,
}

impl<P: BrowserPage> fmt::Debug for ReadyPage<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyPage")
            .field("company", &self.company)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Timeouts on the wire are network problems; anything else is a browser fault.
fn network(error: BrowserError) -> NavigationError {
    if error.is_timeout() {
        NavigationError::NetworkTimeout(error.to_string())
    } else {
        NavigationError::Browser(error)
    }
}

pub struct NavigationController<'a> {
    site: &'a SiteConfig,
    timeouts: Timeouts,
    debug_dir: Option<&'a Path>,
}

impl<'a> NavigationController<'a> {
    pub fn new(site: &'a SiteConfig, timeouts: Timeouts, debug_dir: Option<&'a Path>) -> Self {
        Self { site, timeouts, debug_dir }
    }

    /// Logs in and opens `company`. On failure the page is released before
    /// the error is returned; on success the caller keeps ownership.
    pub async fn establish<'p, P: BrowserPage>(
        &self,
        page: &'p mut P,
        company: &CompanyRef,
        credentials: &Credentials,
    ) -> Result<ReadyPage<'p, P>, NavigationError> {
        let mut session = Session::new(page);

        let outcome = match self.login(&mut session, credentials).await {
            Ok(()) => self.open_company(&mut session, company).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(url) => {
                tracing::debug!("Session ready ({:?}) at {}", session.state(), url);
                Ok(ReadyPage { page: session.page, company: company.clone(), url })
            }
            Err(e) => {
                if matches!(e, NavigationError::PageNotFound(_)) {
                    html_debug::snapshot_if_enabled(&mut *session.page, self.debug_dir, "error-state").await;
                }
                browser::release(&mut *session.page).await;
                Err(e)
            }
        }
    }

    pub async fn login<P: BrowserPage>(
        &self,
        session: &mut Session<'_, P>,
        credentials: &Credentials,
    ) -> Result<(), NavigationError> {
        let t = self.timeouts;
        let login_url = self
            .site
            .login_url()
            .ok_or_else(|| session.fail(NavigationError::PageNotFound("login page".to_string())))?;

        tracing::info!("Opening login page {}", login_url);
        if let Err(e) = session.page.goto(login_url.as_str(), WaitUntil::NetworkIdle, t.navigation).await {
            return Err(session.fail(network(e)));
        }
        for selector in [USERNAME_INPUT, PASSWORD_INPUT, LOGIN_BUTTON] {
            if let Err(e) = session.page.wait_for_selector(selector, WaitOptions::visible(t.selector)).await {
                return Err(session.fail(network(e)));
            }
        }

        session.transition(SessionState::Authenticating);
        let submitted = async {
            session.page.type_text(USERNAME_INPUT, &credentials.username).await?;
            session.page.type_text(PASSWORD_INPUT, &credentials.password).await?;
            // The login page itself is loaded; only a document after the click counts.
            session.page.arm_navigation().await?;
            session.page.click(LOGIN_BUTTON).await
        }
        .await;
        if let Err(e) = submitted {
            return Err(session.fail(NavigationError::Browser(e)));
        }

        // The site sometimes redirects client-side without a full navigation
        // event, so a missing event falls back to checking the location.
        let navigated = match session.page.wait_for_navigation(t.login).await {
            Ok(()) => true,
            Err(e) if e.is_timeout() => false,
            Err(e) => return Err(session.fail(NavigationError::Browser(e))),
        };
        let current = match session.page.current_url().await {
            Ok(url) => url,
            Err(e) => return Err(session.fail(NavigationError::Browser(e))),
        };

        if self.site.is_login_url(&current) {
            let error = if navigated {
                NavigationError::CredentialRejected
            } else {
                NavigationError::LoginTimeout(t.login)
            };
            tracing::warn!("Login failed, still on {}: {}", current, error);
            return Err(session.fail(error));
        }
        if !navigated {
            tracing::info!("No navigation event after login, but already at {}", current);
        }

        session.transition(SessionState::Authenticated);
        tracing::info!("Authenticated");
        Ok(())
    }

    /// Navigates to the company and waits for the page marker rather than
    /// trusting the navigation itself. Returns the landed URL.
    pub async fn open_company<P: BrowserPage>(
        &self,
        session: &mut Session<'_, P>,
        company: &CompanyRef,
    ) -> Result<String, NavigationError> {
        let t = self.timeouts;
        session.transition(SessionState::Navigating);

        let Some(url) = self.site.url_for(&company.canonical_path) else {
            return Err(session.fail(NavigationError::PageNotFound(format!(
                "'{}' is not a path on {}",
                company.canonical_path,
                self.site.base_url()
            ))));
        };

        tracing::info!("Opening {} at {}", company.display_name, url);
        if let Err(e) = session.page.goto(url.as_str(), WaitUntil::Load, t.navigation).await {
            return Err(session.fail(network(e)));
        }
        match session.page.wait_for_selector(PAGE_MARKER, WaitOptions::visible(t.selector)).await {
            Ok(()) => {}
            Err(e) if e.is_timeout() => {
                return Err(session.fail(NavigationError::PageNotFound(company.canonical_path.clone())));
            }
            Err(e) => return Err(session.fail(NavigationError::Browser(e))),
        }

        let landed = session.page.current_url().await.unwrap_or_else(|_| url.to_string());
        session.transition(SessionState::OnTargetPage);
        Ok(landed)
    }
}
