// src/extractors/row_table.rs
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::text::{child_elements, element_text, parse_selector, strip_expand_glyphs};
use crate::screener::models::{OrderedMap, RowTable};
use crate::utils::error::ExtractError;

/// Key prefix marking a row indented under the row before it.
pub const NESTED_ROW_PREFIX: &str = "↳ ";

/// Label of the per-period document link row; never data.
const RAW_DOCUMENT_LABEL: &str = "raw pdf";

static HEAD_CELL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("thead tr th").expect("Failed to compile HEAD_CELL_SELECTOR")
});
static HEADER_ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tr").expect("Failed to compile HEADER_ROW_SELECTOR")
});
static BODY_ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tbody > tr").expect("Failed to compile BODY_ROW_SELECTOR")
});

/// Table selector for a section; the section id scopes every query.
pub fn table_selector(section_selector: &str) -> String {
    format!("{} table.data-table", section_selector)
}

/// One body row after label normalization.
pub(crate) struct ParsedRow<'a> {
    pub element: ElementRef<'a>,
    pub label_cell: ElementRef<'a>,
    pub label: String,
    pub nested: bool,
    pub values: Vec<String>,
}

impl ParsedRow<'_> {
    pub fn key(&self) -> String {
        if self.nested {
            format!("{}{}", NESTED_ROW_PREFIX, self.label)
        } else {
            self.label.clone()
        }
    }
}

/// Extracts the data table of `section_selector` from a page or fragment.
pub fn extract_row_table(html: &str, section_selector: &str) -> Result<RowTable, ExtractError> {
    let document = Html::parse_document(html);
    let table = find_table(&document, section_selector)?;
    Ok(table_from_element(table))
}

pub(crate) fn find_table<'a>(document: &'a Html, section_selector: &str) -> Result<ElementRef<'a>, ExtractError> {
    let selector = parse_selector(&table_selector(section_selector))?;
    document
        .select(&selector)
        .next()
        .ok_or_else(|| ExtractError::SectionNotFound(format!("table in {}", section_selector)))
}

pub(crate) fn table_from_element(table: ElementRef) -> RowTable {
    let columns = columns(table);
    let mut rows = OrderedMap::new();
    for row in parsed_rows(table, &columns) {
        insert_unique(&mut rows, row.key(), row.values);
    }
    RowTable { periods: columns.periods, rows }
}

/// Inserts under `key`, or under `"<key> 2"`, `"<key> 3"`... when a row
/// with that label is already present.
pub(crate) fn insert_unique(rows: &mut OrderedMap<Vec<String>>, key: String, values: Vec<String>) {
    let mut unique = key.clone();
    let mut n = 2;
    while rows.contains_key(&unique) {
        unique = format!("{} {}", key, n);
        n += 1;
    }
    if unique != key {
        tracing::warn!("Duplicate row label '{}'; keeping it as '{}'", key, unique);
    }
    rows.insert(unique, values);
}

/// The period columns of a table: labels and, for each, the position of its
/// cell among a body row's value cells.
pub(crate) struct Columns {
    pub periods: Vec<String>,
    indices: Vec<usize>,
    /// Header cells after the label column, blank ones included.
    span: usize,
}

/// Header cells after the label column. Blank ones are dropped along with
/// the body cells beneath them.
pub(crate) fn columns(table: ElementRef) -> Columns {
    let mut cells: Vec<ElementRef> = table.select(&HEAD_CELL_SELECTOR).collect();
    if cells.is_empty() {
        // No <thead>: the first row carrying <th> cells is the header.
        if let Some(row) = table
            .select(&HEADER_ROW_SELECTOR)
            .find(|row| child_elements(*row, "th").next().is_some())
        {
            cells = child_elements(row, "th").collect();
        }
    }
    let headers: Vec<String> = cells.into_iter().skip(1).map(element_text).collect();
    let (indices, periods): (Vec<usize>, Vec<String>) = headers
        .iter()
        .enumerate()
        .filter(|(_, text)| !text.is_empty())
        .map(|(i, text)| (i, text.clone()))
        .unzip();
    Columns { periods, indices, span: headers.len() }
}

/// Body rows in document order, each with exactly one value per period.
/// Missing cells read as `""`.
pub(crate) fn parsed_rows<'a>(table: ElementRef<'a>, columns: &Columns) -> Vec<ParsedRow<'a>> {
    let mut rows = Vec::new();
    for element in table.select(&BODY_ROW_SELECTOR) {
        let mut cells = child_elements(element, "td");
        let Some(label_cell) = cells.next() else { continue };

        let label = strip_expand_glyphs(&element_text(label_cell)).to_string();
        if label.is_empty() || label.eq_ignore_ascii_case(RAW_DOCUMENT_LABEL) {
            continue;
        }

        let cells: Vec<ElementRef> = cells.collect();
        if cells.len() != columns.span {
            tracing::debug!("Row '{}' has {} cells for {} header columns; normalizing", label, cells.len(), columns.span);
        }
        let values = columns
            .indices
            .iter()
            .map(|&i| cells.get(i).map(|cell| element_text(*cell)).unwrap_or_default())
            .collect();

        rows.push(ParsedRow {
            element,
            label_cell,
            nested: is_nested(label_cell),
            label,
            values,
        });
    }
    rows
}

/// A label cell with a non-zero `padding-left` inline style is indented.
fn is_nested(label_cell: ElementRef) -> bool {
    let Some(style) = label_cell.value().attr("style") else { return false };
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .filter(|(prop, _)| prop.trim().eq_ignore_ascii_case("padding-left"))
        .any(|(_, value)| leading_number(value).is_some_and(|n| n > 0.0))
}

/// Numeric prefix of a CSS length such as "24px" or "1.5em".
fn leading_number(value: &str) -> Option<f64> {
    let value = value.trim();
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    value[..end].parse().ok()
}
