// src/screener/search.rs
use crate::browser::{self, BrowserLauncher, BrowserPage, WaitOptions, WaitUntil};
use crate::config::Timeouts;
use crate::extractors::autocomplete::{SEARCH_INPUT, SUGGESTION_LIST};
use crate::extractors::extract_suggestions;
use crate::screener::client::LookupClient;
use crate::screener::models::{CompanyRef, SearchHit};
use crate::utils::error::ResolutionError;

/// How a free-text query is turned into candidates. Both give the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SearchStrategy {
    /// The site's JSON keyword lookup.
    #[default]
    Lookup,
    /// Type into the home page search box and read the suggestion list.
    Autocomplete,
}

pub struct SearchResolver<L> {
    lookup: LookupClient,
    launcher: L,
    timeouts: Timeouts,
}

impl<L: BrowserLauncher> SearchResolver<L> {
    pub fn new(lookup: LookupClient, launcher: L, timeouts: Timeouts) -> Self {
        Self { lookup, launcher, timeouts }
    }

    pub async fn search(&self, query: &str, strategy: SearchStrategy) -> Result<Vec<SearchHit>, ResolutionError> {
        let hits = match strategy {
            SearchStrategy::Lookup => self.lookup.search(query).await?,
            SearchStrategy::Autocomplete => self.autocomplete(query).await?,
        };
        tracing::info!("{} candidates for '{}' ({:?})", hits.len(), query, strategy);
        Ok(hits)
    }

    /// The candidate whose name equals `name` exactly (after trimming).
    pub async fn resolve_exact(&self, name: &str, strategy: SearchStrategy) -> Result<CompanyRef, ResolutionError> {
        let wanted = name.trim();
        let hits = self.search(wanted, strategy).await?;
        select_exact(&hits, wanted).ok_or_else(|| ResolutionError::NotFound(wanted.to_string()))
    }

    async fn autocomplete(&self, query: &str) -> Result<Vec<SearchHit>, ResolutionError> {
        let mut page = self.launcher.launch().await?;
        let result = self.read_suggestions(&mut page, query).await;
        browser::release(&mut page).await;
        result
    }

    async fn read_suggestions<P: BrowserPage>(&self, page: &mut P, query: &str) -> Result<Vec<SearchHit>, ResolutionError> {
        let t = self.timeouts;
        let site = self.lookup.site();

        page.goto(site.base_url().as_str(), WaitUntil::NetworkIdle, t.navigation).await?;
        page.wait_for_selector(SEARCH_INPUT, WaitOptions::visible(t.selector)).await?;
        page.type_text(SEARCH_INPUT, query).await?;
        page.wait_for_selector(SUGGESTION_LIST, WaitOptions::visible(t.selector)).await?;
        // The list re-renders a few times while suggestions stream in.
        tokio::time::sleep(t.settle).await;

        let html = page.content().await?;
        Ok(extract_suggestions(&html)
            .into_iter()
            .map(|hit| SearchHit { url: hit.url.as_deref().and_then(|link| site.site_path(link)), ..hit })
            .collect())
    }
}

fn select_exact(hits: &[SearchHit], name: &str) -> Option<CompanyRef> {
    hits.iter()
        .filter(|hit| hit.name == name)
        .find_map(SearchHit::to_company_ref)
}
