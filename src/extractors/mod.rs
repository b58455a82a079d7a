// src/extractors/mod.rs
//! Pure HTML -> record transforms. Nothing here touches the browser.

pub mod autocomplete;
pub mod growth;
pub mod peers;
pub mod ratios;
pub mod row_table;
pub mod schedules;
pub mod text;

// Re-export key extraction functions for convenience
pub use autocomplete::extract_suggestions;
pub use growth::extract_growth;
pub use peers::extract_peers;
pub use ratios::extract_ratios;
pub use row_table::extract_row_table;
pub use schedules::{extract_schedule, find_schedule_controls, schedule_rows_selector, ScheduleControl};
