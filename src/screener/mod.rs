// src/screener/mod.rs
//! Everything that talks to the site: login and navigation, schedule
//! expansion, company search and the per-request scrape.

pub mod client;
pub mod expander;
#[cfg(test)]
pub mod fixtures;
pub mod models;
pub mod scrape;
pub mod search;
pub mod session;

pub use client::LookupClient;
pub use scrape::Scraper;
pub use search::{SearchResolver, SearchStrategy};
