// src/screener/client.rs
use std::time::Duration;

use reqwest::header;
use serde::Deserialize;

use crate::browser::chrome::USER_AGENT;
use crate::config::SiteConfig;
use crate::screener::models::SearchHit;
use crate::utils::error::ResolutionError;

const LOOKUP_PATH: &str = "/api/company/search/";

/// One entry of the site's keyword lookup response.
#[derive(Debug, Deserialize)]
struct LookupEntry {
    #[serde(default)]
    id: Option<u64>,
    name: String,
    #[serde(default)]
    url: Option<String>,
}

/// Keyword lookup against the site's JSON search endpoint. No browser involved.
#[derive(Debug, Clone)]
pub struct LookupClient {
    http: reqwest::Client,
    site: SiteConfig,
}

impl LookupClient {
    pub fn new(site: SiteConfig, timeout: Duration) -> Result<Self, ResolutionError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http, site })
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// Candidates in the order the site ranks them. Links are reduced to
    /// site-relative paths; off-site links are dropped from the hit.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ResolutionError> {
        let url = self
            .site
            .url_for(LOOKUP_PATH)
            .ok_or_else(|| ResolutionError::Url(LOOKUP_PATH.to_string()))?;

        tracing::info!("Looking up '{}' via {}", query, url);
        let response = self
            .http
            .get(url)
            .query(&[("q", query), ("v", "3"), ("fts", "1")])
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Lookup returned HTTP {} for '{}'", status, query);
            return Err(ResolutionError::Http(status));
        }

        let entries: Vec<LookupEntry> = response.json().await?;
        tracing::debug!("Lookup returned {} candidates", entries.len());

        Ok(entries
            .into_iter()
            .map(|entry| SearchHit {
                id: entry.id,
                url: entry.url.as_deref().and_then(|link| self.site.site_path(link)),
                name: entry.name.trim().to_string(),
                is_search_everywhere: false,
            })
            .collect())
    }
}
