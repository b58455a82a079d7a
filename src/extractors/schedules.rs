// src/extractors/schedules.rs
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::row_table::{columns, find_table, insert_unique, parsed_rows, table_selector};
use super::text::{element_text, strip_expand_glyphs};
use crate::screener::models::{OrderedMap, RowTable};
use crate::utils::error::ExtractError;

static CONTROL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("button.button-plain").expect("Failed to compile CONTROL_SELECTOR")
});

// First quoted argument of Company.showSchedule('<name>', ...)
static SCHEDULE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"showSchedule\(\s*['"]([^'"]+)['"]"#).expect("Failed to compile SCHEDULE_NAME_RE")
});

/// An expandable control found in a row-table's label column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleControl {
    /// Schedule identity, from the action metadata or the label text.
    pub name: String,
    /// Key of the summary row the control sits in.
    pub row_key: String,
    /// Selector that targets exactly this control on the live page.
    pub selector: String,
}

/// Selector for the indented label cell directly under `parent_key` in the
/// page as rendered in `html`. It matches only once that row's own schedule
/// is open, whatever else is expanded elsewhere in the table.
pub fn schedule_rows_selector(html: &str, section_selector: &str, parent_key: &str) -> Result<String, ExtractError> {
    let document = Html::parse_document(html);
    let table = find_table(&document, section_selector)?;
    let parent = parsed_rows(table, &columns(table))
        .into_iter()
        .find(|row| !row.nested && row.label == parent_key)
        .ok_or_else(|| ExtractError::SectionNotFound(format!("schedule row '{}'", parent_key)))?;

    Ok(format!(
        "{} > tbody > tr:nth-child({}) > td:first-child[style*=\"padding-left\"]",
        table_selector(section_selector),
        element_position(parent.element) + 1
    ))
}

/// Controls in document order. Rows that are themselves nested are skipped.
pub fn find_schedule_controls(html: &str, section_selector: &str) -> Result<Vec<ScheduleControl>, ExtractError> {
    let document = Html::parse_document(html);
    let table = find_table(&document, section_selector)?;
    let mut controls = Vec::new();
    for row in parsed_rows(table, &columns(table)) {
        if row.nested {
            continue;
        }
        let Some(button) = row.label_cell.select(&CONTROL_SELECTOR).next() else { continue };

        let onclick = button.value().attr("onclick");
        let name = onclick
            .and_then(schedule_name)
            .unwrap_or_else(|| strip_expand_glyphs(&element_text(button)).to_string());
        let selector = match onclick {
            Some(action) => format!(
                "{} button[onclick=\"{}\"]",
                section_selector,
                escape_css_string(action)
            ),
            None => format!(
                "{} > tbody > tr:nth-child({}) > td:first-child button.button-plain",
                table_selector(section_selector),
                element_position(row.element)
            ),
        };

        controls.push(ScheduleControl { name, row_key: row.key(), selector });
    }
    Ok(controls)
}

/// The indented rows rendered directly under `parent_key` after expansion.
/// Keys are returned without the nesting marker.
pub fn extract_schedule(html: &str, section_selector: &str, parent_key: &str) -> Result<RowTable, ExtractError> {
    let document = Html::parse_document(html);
    let table = find_table(&document, section_selector)?;
    let columns = columns(table);

    let mut rows = OrderedMap::new();
    let mut in_parent = false;
    let mut parent_seen = false;
    for row in parsed_rows(table, &columns) {
        if !row.nested {
            if in_parent {
                break;
            }
            in_parent = row.label == parent_key;
            parent_seen |= in_parent;
            continue;
        }
        if in_parent {
            insert_unique(&mut rows, row.label, row.values);
        }
    }

    if !parent_seen {
        return Err(ExtractError::SectionNotFound(format!("schedule row '{}'", parent_key)));
    }
    if rows.is_empty() {
        return Err(ExtractError::SectionNotFound(format!("expanded rows under '{}'", parent_key)));
    }
    Ok(RowTable { periods: columns.periods, rows })
}

fn schedule_name(action: &str) -> Option<String> {
    SCHEDULE_NAME_RE
        .captures(action)
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// 1-based position among the parent's element children, for :nth-child.
fn element_position(element: ElementRef) -> usize {
    element.prev_siblings().filter(|node| node.value().is_element()).count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLAPSED: &str = r#"
        <section id="quarters"><table class="data-table">
          <thead><tr><th></th><th>Jun 2023</th><th>Sep 2023</th></tr></thead>
          <tbody>
            <tr><td class="text"><button class="button-plain" onclick="Company.showSchedule('Sales', 'quarters', this)">Sales +</button></td><td>10</td><td>11</td></tr>
            <tr><td class="text"><button class="button-plain" onclick="Company.showSchedule(&quot;Other Income&quot;, 'quarters', this)">Other Income +</button></td><td>1</td><td>2</td></tr>
            <tr><td class="text"><button class="button-plain">Expenses +</button></td><td>7</td><td>8</td></tr>
            <tr><td class="text">Net Profit</td><td>3</td><td>3</td></tr>
          </tbody>
        </table></section>
    "#;

    const SALES_EXPANDED: &str = r#"
        <section id="quarters"><table class="data-table">
          <thead><tr><th></th><th>Jun 2023</th><th>Sep 2023</th></tr></thead>
          <tbody>
            <tr><td class="text"><button class="button-plain" onclick="Company.showSchedule('Sales', 'quarters', this)">Sales −</button></td><td>10</td><td>11</td></tr>
            <tr><td class="text" style="padding-left: 24px">Domestic</td><td>6</td><td>7</td></tr>
            <tr><td class="text" style="padding-left: 24px">Export</td><td>4</td><td>4</td></tr>
            <tr><td class="text"><button class="button-plain">Expenses +</button></td><td>7</td><td>8</td></tr>
          </tbody>
        </table></section>
    "#;

    #[test]
    fn test_controls_are_found_in_document_order() {
        let controls = find_schedule_controls(COLLAPSED, "section#quarters").unwrap();
        let names: Vec<&str> = controls.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Sales", "Other Income", "Expenses"]);
    }

    #[test]
    fn test_control_selector_uses_action_metadata() {
        let controls = find_schedule_controls(COLLAPSED, "section#quarters").unwrap();
        assert_eq!(
            controls[0].selector,
            r#"section#quarters button[onclick="Company.showSchedule('Sales', 'quarters', this)"]"#
        );
        assert!(controls[1].selector.contains(r#"showSchedule(\"Other Income\""#));
        // Every selector must parse and hit exactly one element.
        let document = Html::parse_document(COLLAPSED);
        for control in &controls {
            let selector = Selector::parse(&control.selector).unwrap();
            assert_eq!(document.select(&selector).count(), 1, "{}", control.selector);
        }
    }

    #[test]
    fn test_name_falls_back_to_label_without_metadata() {
        let controls = find_schedule_controls(COLLAPSED, "section#quarters").unwrap();
        assert_eq!(controls[2].name, "Expenses");
        assert_eq!(controls[2].row_key, "Expenses");
        assert!(controls[2].selector.contains("tr:nth-child(3)"));
    }

    #[test]
    fn test_schedule_rows_stop_at_next_summary_row() {
        let schedule = extract_schedule(SALES_EXPANDED, "section#quarters", "Sales").unwrap();
        assert_eq!(schedule.periods, vec!["Jun 2023", "Sep 2023"]);
        assert_eq!(schedule.rows.keys().collect::<Vec<_>>(), vec!["Domestic", "Export"]);
        assert_eq!(schedule.rows.get("Export").unwrap(), &vec!["4".to_string(), "4".to_string()]);
    }

    #[test]
    fn test_rows_selector_targets_the_row_under_its_parent() {
        let selector = schedule_rows_selector(SALES_EXPANDED, "section#quarters", "Sales").unwrap();
        assert_eq!(
            selector,
            r#"section#quarters table.data-table > tbody > tr:nth-child(2) > td:first-child[style*="padding-left"]"#
        );
        let document = Html::parse_document(SALES_EXPANDED);
        let parsed = Selector::parse(&selector).unwrap();
        assert_eq!(document.select(&parsed).map(element_text).collect::<Vec<_>>(), vec!["Domestic"]);
    }

    #[test]
    fn test_rows_selector_ignores_rows_open_under_another_parent() {
        // Sales is open; Expenses has nothing under it yet.
        let selector = schedule_rows_selector(SALES_EXPANDED, "section#quarters", "Expenses").unwrap();
        let parsed = Selector::parse(&selector).unwrap();
        assert_eq!(Html::parse_document(SALES_EXPANDED).select(&parsed).count(), 0);

        let missing = schedule_rows_selector(SALES_EXPANDED, "section#quarters", "Net Profit");
        assert!(matches!(missing, Err(ExtractError::SectionNotFound(_))));
    }

    #[test]
    fn test_unexpanded_schedule_is_an_error() {
        let result = extract_schedule(COLLAPSED, "section#quarters", "Sales");
        assert!(matches!(result, Err(ExtractError::SectionNotFound(_))));
    }
}
