// src/extractors/autocomplete.rs
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::text::{element_text, slugify};
use crate::screener::models::SearchHit;

/// The home page's search box and the suggestion list rendered under it.
pub const SEARCH_INPUT: &str = ".home-search > div:nth-child(1) > input:nth-child(2)";
pub const SUGGESTION_LIST: &str = ".home-search > div:nth-child(1) > ul:nth-child(3)";

const SEARCH_EVERYWHERE: &str = "Search everywhere";

static ITEM_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(&format!("{} li", SUGGESTION_LIST)).expect("Failed to compile ITEM_SELECTOR")
});
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a[href]").expect("Failed to compile LINK_SELECTOR")
});

/// Suggestions in display order. Entries without a link get a path
/// synthesized from their name; the full-text search entry gets none.
/// Links are returned as found and still need reducing to site paths.
pub fn extract_suggestions(html: &str) -> Vec<SearchHit> {
    let document = Html::parse_document(html);

    document
        .select(&ITEM_SELECTOR)
        .filter_map(|item| {
            let name = element_text(item);
            if name.is_empty() {
                return None;
            }
            if name.contains(SEARCH_EVERYWHERE) {
                return Some(SearchHit { id: None, name, url: None, is_search_everywhere: true });
            }
            let url = item
                .select(&LINK_SELECTOR)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string)
                .unwrap_or_else(|| format!("/company/{}/", slugify(&name)));
            Some(SearchHit { id: None, name, url: Some(url), is_search_everywhere: false })
        })
        .collect()
}
