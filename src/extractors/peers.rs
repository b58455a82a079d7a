// src/extractors/peers.rs
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::text::{child_elements, collapse_whitespace, element_text};
use crate::screener::models::{OrderedMap, PeerCompany, PeerHeader, PeerMedian, PeerTable};
use crate::utils::error::ExtractError;

/// Sequence-number and company-name columns precede the metrics.
const LEADING_COLUMNS: usize = 2;

static PEERS_TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("#peers-table-placeholder table").expect("Failed to compile PEERS_TABLE_SELECTOR")
});
static PEERS_SECTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("section#peers").expect("Failed to compile PEERS_SECTION_SELECTOR")
});
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Failed to compile ROW_SELECTOR")
});
static COMPANY_ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr[data-row-company-id]").expect("Failed to compile COMPANY_ROW_SELECTOR")
});
static MEDIAN_ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tfoot tr").expect("Failed to compile MEDIAN_ROW_SELECTOR")
});
static UNIT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("span").expect("Failed to compile UNIT_SELECTOR")
});
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a").expect("Failed to compile LINK_SELECTOR")
});
static CLASSIFICATION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p.sub a").expect("Failed to compile CLASSIFICATION_SELECTOR")
});

/// Extracts the peer comparison table.
///
/// Header text and cell text share no key, so metrics are assigned purely
/// by column position. Any row whose metric cell count differs from the
/// header count is rejected with [`ExtractError::ColumnMismatch`] rather
/// than silently shifted.
pub fn extract_peers(html: &str) -> Result<PeerTable, ExtractError> {
    let document = Html::parse_document(html);
    let table = document
        .select(&PEERS_TABLE_SELECTOR)
        .next()
        .ok_or_else(|| ExtractError::SectionNotFound("peers table".to_string()))?;

    let headers = headers(table);
    let names = metric_names(&headers);

    let mut companies = Vec::new();
    for row in table.select(&COMPANY_ROW_SELECTOR) {
        let cells: Vec<ElementRef> = child_elements(row, "td").collect();
        let name_cell = cells.get(1).copied();
        let name = name_cell.map(element_text).unwrap_or_default();
        let url = name_cell
            .and_then(|cell| cell.select(&LINK_SELECTOR).next())
            .and_then(|link| link.value().attr("href"))
            .unwrap_or_default()
            .to_string();
        let id = row.value().attr("data-row-company-id").unwrap_or_default().to_string();

        let metrics = align_metrics(&names, &cells, &name)?;
        companies.push(PeerCompany { id, name, url, metrics });
    }

    let median = match table.select(&MEDIAN_ROW_SELECTOR).next() {
        Some(row) => {
            let cells: Vec<ElementRef> = child_elements(row, "td").collect();
            let metrics = align_metrics(&names, &cells, "median")?;
            let (sector, industry) = classification(&document);
            Some(PeerMedian { metrics, sector, industry })
        }
        None => None,
    };

    tracing::debug!("Extracted {} peers across {} metrics", companies.len(), headers.len());
    Ok(PeerTable { headers, companies, median })
}

fn headers(table: ElementRef) -> Vec<PeerHeader> {
    let Some(row) = table
        .select(&ROW_SELECTOR)
        .find(|row| child_elements(*row, "th").next().is_some())
    else {
        return Vec::new();
    };

    child_elements(row, "th")
        .skip(LEADING_COLUMNS)
        .map(|cell| {
            let full = element_text(cell);
            let (name, unit) = split_unit(&full, cell);
            let tooltip = cell
                .value()
                .attr("data-tooltip")
                .or_else(|| cell.value().attr("title"))
                .map(collapse_whitespace)
                .unwrap_or_default();
            PeerHeader { name, unit, tooltip }
        })
        .collect()
}

/// The unit is a trailing `<span>` ("CMP Rs.") or a trailing
/// parenthetical ("Mar Cap (Rs. Cr.)"); otherwise empty.
fn split_unit(full: &str, cell: ElementRef) -> (String, String) {
    if let Some(unit) = cell.select(&UNIT_SELECTOR).last().map(element_text) {
        if let Some(name) = full.strip_suffix(unit.as_str()) {
            if !unit.is_empty() {
                return (name.trim().to_string(), unit);
            }
        }
    }
    if full.ends_with(')') {
        if let Some(open) = full.rfind('(') {
            let unit = full[open + 1..full.len() - 1].trim();
            return (full[..open].trim().to_string(), unit.to_string());
        }
    }
    (full.to_string(), String::new())
}

/// Metric keys, made unique so every column keeps its own entry.
fn metric_names(headers: &[PeerHeader]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers {
        let mut name = header.name.clone();
        let mut n = 2;
        while names.contains(&name) {
            name = format!("{} {}", header.name, n);
            n += 1;
        }
        names.push(name);
    }
    names
}

fn align_metrics(names: &[String], cells: &[ElementRef], row: &str) -> Result<OrderedMap<String>, ExtractError> {
    let values = cells.iter().skip(LEADING_COLUMNS).map(|cell| element_text(*cell));
    let found = cells.len().saturating_sub(LEADING_COLUMNS);
    if found != names.len() {
        return Err(ExtractError::ColumnMismatch {
            table: "peers".to_string(),
            row: row.to_string(),
            expected: names.len(),
            found,
        });
    }
    Ok(names.iter().cloned().zip(values).collect())
}

/// Sector and industry links shown above the peers table.
fn classification(document: &Html) -> (String, String) {
    let scope = document.select(&PEERS_SECTION_SELECTOR).next().unwrap_or_else(|| document.root_element());
    let mut links = scope.select(&CLASSIFICATION_SELECTOR).map(element_text);
    let sector = links.next().unwrap_or_default();
    let industry = links.next().unwrap_or_default();
    (sector, industry)
}
