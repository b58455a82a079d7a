// src/screener/scrape.rs
//! Scrape orchestrator: one browser per request, released on every exit.

use std::path::PathBuf;

use tokio::time::Instant;

use crate::browser::{self, BrowserLauncher, BrowserPage, WaitOptions};
use crate::config::{Credentials, Settings, SiteConfig, Timeouts};
use crate::extractors::row_table::table_selector;
use crate::extractors::{extract_growth, extract_peers, extract_ratios, extract_row_table};
use crate::screener::expander::ScheduleExpander;
use crate::screener::models::{CompanyRef, ExpandedSchedule, QuarterlyTable, ScrapeResult};
use crate::screener::session::NavigationController;
use crate::utils::error::{AppError, ExtractError};
use crate::utils::html_debug;

pub const QUARTERS_SECTION: &str = "section#quarters";
pub const PROFIT_LOSS_SECTION: &str = "section#profit-loss";

// Peers are fetched after page load and injected into this placeholder.
const PEERS_TABLE: &str = "section#peers #peers-table-placeholder table";

pub struct Scraper<L> {
    launcher: L,
    site: SiteConfig,
    credentials: Credentials,
    timeouts: Timeouts,
    debug_dir: Option<PathBuf>,
    expand_schedules: bool,
}

impl<L: BrowserLauncher> Scraper<L> {
    pub fn new(launcher: L, settings: &Settings) -> Self {
        Self {
            launcher,
            site: settings.site.clone(),
            credentials: settings.credentials.clone(),
            timeouts: settings.timeouts,
            debug_dir: settings.debug_dir.clone(),
            expand_schedules: settings.expand_schedules,
        }
    }

    /// Runs the whole scrape, browser startup included, under the total
    /// budget. Partial data is never returned: exceeding the budget is an error.
    pub async fn scrape(&self, company: &CompanyRef) -> Result<ScrapeResult, AppError> {
        let budget = self.timeouts.total;
        let started = Instant::now();

        // A launch cut off here drops the half-started browser, which kills it.
        let mut page = match tokio::time::timeout(budget, self.launcher.launch()).await {
            Ok(page) => page?,
            Err(_) => {
                tracing::error!("Browser launch for {} exceeded {:?}; aborting", company.display_name, budget);
                return Err(AppError::Timeout(budget));
            }
        };

        let remaining = budget.saturating_sub(started.elapsed());
        let outcome = tokio::time::timeout(remaining, self.scrape_page(&mut page, company)).await;
        let result = match outcome {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Scrape of {} exceeded {:?}; aborting", company.display_name, budget);
                Err(AppError::Timeout(budget))
            }
        };
        if matches!(result, Err(AppError::Extraction(_) | AppError::Timeout(_))) {
            html_debug::snapshot_if_enabled(&mut page, self.debug_dir.as_deref(), "scrape-failed").await;
        }

        browser::release(&mut page).await;
        result
    }

    async fn scrape_page<P: BrowserPage>(&self, page: &mut P, company: &CompanyRef) -> Result<ScrapeResult, AppError> {
        let nav = NavigationController::new(&self.site, self.timeouts, self.debug_dir.as_deref());
        let ready = nav.establish(page, company, &self.credentials).await?;
        tracing::info!("Scraping {} from {}", ready.company.display_name, ready.url);
        let page = ready.page;

        let html = page.content().await?;
        let ratios = extract_ratios(&html)?;
        tracing::info!("Extracted {} ratios", ratios.len());

        let quarterly = match self.section_html(page, &table_selector(QUARTERS_SECTION)).await? {
            Some(html) => optional(extract_row_table(&html, QUARTERS_SECTION))?,
            None => Default::default(),
        };
        let expanded = if self.expand_schedules && !quarterly.is_empty() {
            ScheduleExpander::new(QUARTERS_SECTION, self.timeouts.schedule).expand_all(page).await?
        } else {
            ExpandedSchedule::new()
        };

        let (profit_loss, growth) = match self.section_html(page, &table_selector(PROFIT_LOSS_SECTION)).await? {
            Some(html) => (optional(extract_row_table(&html, PROFIT_LOSS_SECTION))?, extract_growth(&html)),
            None => Default::default(),
        };

        // A column mismatch here is a hard failure, unlike a missing table.
        let peers = match self.section_html(page, PEERS_TABLE).await? {
            Some(html) => optional(extract_peers(&html))?,
            None => Default::default(),
        };

        tracing::info!(
            "Scraped {}: {} quarterly rows, {} schedules, {} P&L rows, {} peers",
            company.display_name,
            quarterly.rows.len(),
            expanded.len(),
            profit_loss.rows.len(),
            peers.companies.len()
        );

        Ok(ScrapeResult {
            ratios,
            quarterly: QuarterlyTable { table: quarterly, expanded },
            profit_loss,
            peers,
            growth,
        })
    }

    /// Waits for an optional section. `None` when it never appears.
    async fn section_html<P: BrowserPage>(&self, page: &mut P, selector: &str) -> Result<Option<String>, AppError> {
        match page.wait_for_selector(selector, WaitOptions::attached(self.timeouts.section)).await {
            Ok(()) => Ok(Some(page.content().await?)),
            Err(e) if e.is_timeout() => {
                tracing::warn!("Optional section '{}' missing: {}", selector, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// A table that vanished between wait and read counts as absent.
fn optional<T: Default>(result: Result<T, ExtractError>) -> Result<T, ExtractError> {
    match result {
        Err(ExtractError::SectionNotFound(what)) => {
            tracing::warn!("{} not found; leaving it empty", what);
            Ok(T::default())
        }
        other => other,
    }
}
