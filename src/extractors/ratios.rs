// src/extractors/ratios.rs
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::text::{collapse_whitespace, element_text, strip_currency};
use crate::screener::models::RatioSet;
use crate::utils::error::ExtractError;

static TOP_RATIOS_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("#top-ratios").expect("Failed to compile TOP_RATIOS_SELECTOR")
});
static ITEM_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("li").expect("Failed to compile ITEM_SELECTOR")
});
static NAME_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".name").expect("Failed to compile NAME_SELECTOR")
});
static VALUE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".value").expect("Failed to compile VALUE_SELECTOR")
});
static NUMBER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".number").expect("Failed to compile NUMBER_SELECTOR")
});

/// Extracts the top-ratios list. The list container itself is required;
/// items with an empty label or value are dropped.
pub fn extract_ratios(html: &str) -> Result<RatioSet, ExtractError> {
    let document = Html::parse_document(html);
    let list = document
        .select(&TOP_RATIOS_SELECTOR)
        .next()
        .ok_or_else(|| ExtractError::SectionNotFound("ratios list (#top-ratios)".to_string()))?;

    let mut ratios = RatioSet::new();
    for item in list.select(&ITEM_SELECTOR) {
        let name = item.select(&NAME_SELECTOR).next().map(element_text).unwrap_or_default();
        let Some(value_element) = item.select(&VALUE_SELECTOR).next() else {
            tracing::debug!("Skipping ratio '{}' without a value field", name);
            continue;
        };
        let value = ratio_value(value_element);

        if !name.is_empty() && !value.is_empty() {
            ratios.insert(name, value);
        }
    }

    tracing::debug!("Extracted {} ratios", ratios.len());
    Ok(ratios)
}

/// Numeric sub-spans joined by " / ", followed by whatever text is left
/// once those exact substrings are removed (units such as "Cr." or "%").
fn ratio_value(value_element: ElementRef) -> String {
    let numbers: Vec<String> = value_element
        .select(&NUMBER_SELECTOR)
        .map(element_text)
        .filter(|n| !n.is_empty())
        .collect();

    let mut remainder = value_element.text().collect::<String>();
    for number in &numbers {
        remainder = remainder.replacen(number.as_str(), "", 1);
    }
    let remainder = collapse_whitespace(&strip_currency(&remainder));
    // Separators between numbers are already rebuilt by the join.
    let remainder = remainder.trim_matches(|c: char| c == '/' || c.is_whitespace());

    let mut value = numbers.join(" / ");
    if !remainder.is_empty() {
        value.push(' ');
        value.push_str(remainder);
    }
    collapse_whitespace(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATIOS_HTML: &str = r#"
        <div class="company-ratios">
          <ul id="top-ratios">
            <li><span class="name">Market Cap</span>
                <span class="nowrap value">₹ <span class="number">1,23,456</span> Cr.</span></li>
            <li><span class="name">High / Low</span>
                <span class="nowrap value">₹ <span class="number">2,345</span> / <span class="number">1,234</span></span></li>
            <li><span class="name">Stock P/E</span>
                <span class="nowrap value"><span class="number">24.5</span></span></li>
            <li><span class="name">ROCE</span>
                <span class="nowrap value"><span class="number">18.2</span> %</span></li>
            <li><span class="name">Face Value</span>
                <span class="nowrap value">₹ <span class="number">10</span> 10 shares</span></li>
            <li><span class="name">Book Value</span></li>
            <li><span class="name">Dividend Yield</span><span class="value">  </span></li>
            <li><span class="name"> </span><span class="value"><span class="number">3</span></span></li>
          </ul>
        </div>
    "#;

    #[test]
    fn test_ratio_values_are_normalized() {
        let ratios = extract_ratios(RATIOS_HTML).unwrap();

        assert_eq!(ratios["Market Cap"], "1,23,456 Cr.");
        assert_eq!(ratios["High / Low"], "2,345 / 1,234");
        assert_eq!(ratios["Stock P/E"], "24.5");
        assert_eq!(ratios["ROCE"], "18.2 %");
    }

    #[test]
    fn test_numbers_are_removed_by_exact_match_not_by_digit() {
        // The unit suffix contains the same digits as the number.
        let ratios = extract_ratios(RATIOS_HTML).unwrap();
        assert_eq!(ratios["Face Value"], "10 10 shares");
    }

    #[test]
    fn test_items_without_label_or_value_are_absent() {
        let ratios = extract_ratios(RATIOS_HTML).unwrap();

        assert!(!ratios.contains_key("Book Value"));
        assert!(!ratios.contains_key("Dividend Yield"));
        assert!(!ratios.contains_key(""));
        assert_eq!(ratios.len(), 5);
    }

    #[test]
    fn test_missing_ratio_list_is_an_error() {
        let result = extract_ratios("<div class='company-ratios'></div>");
        assert!(matches!(result, Err(ExtractError::SectionNotFound(_))));
    }
}
