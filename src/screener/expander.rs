// src/screener/expander.rs
use std::time::Duration;

use crate::browser::{BrowserPage, WaitOptions};
use crate::extractors::{extract_schedule, find_schedule_controls, schedule_rows_selector, ScheduleControl};
use crate::screener::models::{ExpandedSchedule, RowTable};
use crate::utils::error::AppError;

/// Expands each schedule control of one row-table in turn, reads the revealed
/// rows and collapses it again before moving on.
pub struct ScheduleExpander {
    section_selector: String,
    timeout: Duration,
}

impl ScheduleExpander {
    pub fn new(section_selector: &str, timeout: Duration) -> Self {
        Self { section_selector: section_selector.to_string(), timeout }
    }

    /// A control that fails to expand or extract is logged and skipped.
    /// Only failing to read the page at all is returned as an error.
    pub async fn expand_all<P: BrowserPage>(&self, page: &mut P) -> Result<ExpandedSchedule, AppError> {
        let html = page.content().await?;
        let controls = find_schedule_controls(&html, &self.section_selector)?;
        tracing::info!("Found {} schedule controls in {}", controls.len(), self.section_selector);

        let mut schedules = ExpandedSchedule::new();
        for control in &controls {
            let mut rows_selector = None;
            match self.expand_one(page, control, &mut rows_selector).await {
                Ok(table) => {
                    tracing::debug!("Schedule '{}' has {} rows", control.name, table.rows.len());
                    schedules.insert(control.name.clone(), table);
                }
                Err(e) => tracing::warn!("Skipping schedule '{}': {}", control.name, e),
            }
            self.collapse(page, control, rows_selector.as_deref()).await;
        }
        Ok(schedules)
    }

    /// Leaves the selector of the control's child rows in `rows_selector`
    /// once known, so the collapse can wait on the same rows.
    async fn expand_one<P: BrowserPage>(
        &self,
        page: &mut P,
        control: &ScheduleControl,
        rows_selector: &mut Option<String>,
    ) -> Result<RowTable, AppError> {
        page.click(&control.selector).await?;
        let html = page.content().await?;
        let selector = rows_selector.insert(schedule_rows_selector(&html, &self.section_selector, &control.row_key)?);
        // The reveal is asynchronous; a finished click proves nothing.
        page.wait_for_selector(selector.as_str(), WaitOptions::visible(self.timeout)).await?;
        let html = page.content().await?;
        Ok(extract_schedule(&html, &self.section_selector, &control.row_key)?)
    }

    /// Never fails: a stuck schedule must not abort the rest.
    async fn collapse<P: BrowserPage>(&self, page: &mut P, control: &ScheduleControl, rows_selector: Option<&str>) {
        if let Err(e) = page.click(&control.selector).await {
            tracing::warn!("Failed to collapse schedule '{}': {}", control.name, e);
            return;
        }
        let Some(selector) = rows_selector else { return };
        if let Err(e) = page.wait_for_selector(selector, WaitOptions::hidden(self.timeout)).await {
            tracing::warn!("Schedule '{}' did not collapse: {}", control.name, e);
        }
    }
}
