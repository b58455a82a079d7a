// src/extractors/growth.rs
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::text::{child_elements, element_text};
use crate::screener::models::{GrowthKind, GrowthTable, OrderedMap};

static SECTION_RANGES_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("section#profit-loss table.ranges-table").expect("Failed to compile SECTION_RANGES_SELECTOR")
});
static RANGES_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table.ranges-table").expect("Failed to compile RANGES_SELECTOR")
});
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Failed to compile ROW_SELECTOR")
});

/// Reads the compounded-growth tables under the profit & loss section.
/// Tables are identified by position (sales, profit, stock price, ROE);
/// a missing table simply leaves its kind out.
pub fn extract_growth(html: &str) -> GrowthTable {
    let document = Html::parse_document(html);
    let mut tables: Vec<_> = document.select(&SECTION_RANGES_SELECTOR).collect();
    if tables.is_empty() {
        tables = document.select(&RANGES_SELECTOR).collect();
    }

    let mut growth = GrowthTable::new();
    for (kind, table) in GrowthKind::ALL.into_iter().zip(tables) {
        let mut periods = OrderedMap::new();
        // First row is the table's title.
        for row in table.select(&ROW_SELECTOR).skip(1) {
            let mut cells = child_elements(row, "td").map(element_text);
            let (Some(label), Some(value)) = (cells.next(), cells.next()) else { continue };
            let label = label.trim_end_matches(':').trim();
            if label.is_empty() {
                continue;
            }
            periods.insert(label.to_string(), value);
        }
        growth.insert(kind, periods);
    }
    growth
}
