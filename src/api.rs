// src/api.rs
//! Request boundary: validates inputs, runs the request and shapes errors.

use serde::Serialize;

use crate::browser::BrowserLauncher;
use crate::screener::models::{CompanyRef, ScrapeResult, SearchResponse};
use crate::screener::{Scraper, SearchResolver, SearchStrategy};
use crate::utils::AppError;

/// What a failed request reports. Never carries a backtrace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub kind: &'static str,
    pub message: String,
}

impl From<&AppError> for ErrorBody {
    fn from(error: &AppError) -> Self {
        Self {
            status: if error.is_client_error() { 400 } else { 500 },
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

pub async fn resolve_company<L: BrowserLauncher>(
    resolver: &SearchResolver<L>,
    query: &str,
    strategy: SearchStrategy,
) -> Result<SearchResponse, AppError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::ClientInput("search query is required".to_string()));
    }

    let results = resolver.search(query, strategy).await?;
    Ok(SearchResponse { results })
}

/// Scrapes a company given either its canonical path (leading `/`) or its
/// exact display name.
pub async fn scrape_company<L: BrowserLauncher, R: BrowserLauncher>(
    scraper: &Scraper<L>,
    resolver: &SearchResolver<R>,
    name_or_path: &str,
) -> Result<ScrapeResult, AppError> {
    let input = name_or_path.trim();
    if input.is_empty() {
        return Err(AppError::ClientInput("name is required".to_string()));
    }

    let company = if input.starts_with('/') {
        CompanyRef { display_name: input.to_string(), canonical_path: input.to_string() }
    } else {
        resolver.resolve_exact(input, SearchStrategy::Lookup).await?
    };
    tracing::info!("Resolved '{}' to {}", input, company.canonical_path);

    scraper.scrape(&company).await
}
