// src/utils/error.rs
use std::time::Duration;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Browser protocol failure: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BrowserError {
    pub fn timeout(what: impl Into<String>, after: Duration) -> Self {
        BrowserError::Timeout { what: what.into(), after }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BrowserError::Timeout { .. })
    }
}

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Credentials were rejected by the login form")]
    CredentialRejected,

    #[error("Login did not complete within {0:?}")]
    LoginTimeout(Duration),

    #[error("Target page marker never appeared: {0}")]
    PageNotFound(String),

    #[error("Network timeout: {0}")]
    NetworkTimeout(String),

    #[error("Browser failure during navigation: {0}")]
    Browser(#[from] BrowserError),
}

impl NavigationError {
    /// Login failures are reported as authentication errors at the boundary.
    pub fn is_authentication(&self) -> bool {
        matches!(self, NavigationError::CredentialRejected | NavigationError::LoginTimeout(_))
    }
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Section not found: {0}")]
    SectionNotFound(String),

    #[error("Column mismatch in {table} row '{row}': {expected} headers but {found} cells")]
    ColumnMismatch {
        table: String,
        row: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),
}

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("No company matches '{0}'")]
    NotFound(String),

    #[error("Lookup request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Lookup returned HTTP {0}")]
    Http(reqwest::StatusCode),

    #[error("Invalid lookup URL: {0}")]
    Url(String),

    #[error("Browser failure during search: {0}")]
    Browser(#[from] BrowserError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    ClientInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Navigation(#[from] NavigationError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Browser failure: {0}")]
    Browser(#[from] BrowserError),

    #[error("Scrape exceeded its {0:?} budget")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Taxonomy name reported alongside the message at the request boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ClientInput(_) => "ClientInputError",
            AppError::Navigation(e) if e.is_authentication() => "AuthenticationError",
            AppError::Navigation(_) => "NavigationError",
            AppError::Extraction(_) => "ExtractionError",
            AppError::Resolution(_) => "ResolutionError",
            AppError::Browser(_) => "BrowserError",
            AppError::Timeout(_) => "TimeoutError",
            AppError::Config(_) => "ConfigError",
            AppError::Io(_) | AppError::Serialization(_) => "InternalError",
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::ClientInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_failures_are_authentication_kind() {
        let rejected = AppError::from(NavigationError::CredentialRejected);
        let timed_out = AppError::from(NavigationError::LoginTimeout(Duration::from_secs(30)));
        let missing = AppError::from(NavigationError::PageNotFound("/company/X/".into()));

        assert_eq!(rejected.kind(), "AuthenticationError");
        assert_eq!(timed_out.kind(), "AuthenticationError");
        assert_eq!(missing.kind(), "NavigationError");
    }

    #[test]
    fn only_client_input_is_a_client_error() {
        assert!(AppError::ClientInput("name is required".into()).is_client_error());
        assert!(!AppError::Timeout(Duration::from_secs(1)).is_client_error());
        assert!(!AppError::from(ResolutionError::NotFound("Acme".into())).is_client_error());
    }
}
