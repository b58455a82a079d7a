// src/extractors/text.rs
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::utils::error::ExtractError;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("Failed to compile WHITESPACE_RE")
});

const CURRENCY_GLYPHS: &[char] = &['₹', '$', '€', '£', '¥'];

// Glyphs the site appends to expandable row labels ("Sales +", "Sales −").
const EXPAND_GLYPHS: &[char] = &['+', '-', '−', '–'];

/// Collapses every whitespace run (including NBSP) to one space and trims.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// All descendant text of an element, whitespace-collapsed.
pub fn element_text(element: ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub fn strip_currency(text: &str) -> String {
    text.chars().filter(|c| !CURRENCY_GLYPHS.contains(c)).collect()
}

/// Drops trailing expand/collapse glyphs from a row label.
pub fn strip_expand_glyphs(label: &str) -> &str {
    label
        .trim_end_matches(|c: char| EXPAND_GLYPHS.contains(&c) || c.is_whitespace())
        .trim()
}

/// Lower-kebab slug used to synthesize company paths from display names.
pub fn slugify(name: &str) -> String {
    collapse_whitespace(name).to_lowercase().replace(' ', "-")
}

pub fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|_| ExtractError::InvalidSelector(selector.to_string()))
}

/// Element children of `element` with the given tag name, in document order.
pub fn child_elements<'a>(element: ElementRef<'a>, tag: &'a str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == tag)
}
