// src/utils/html_debug.rs
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::browser::BrowserPage;
use crate::utils::error::AppError;

/// Saves an HTML document prefixed with a comment naming where and when it was captured
pub fn save_debug_html(html: &str, path: &Path, source_url: &str) -> Result<(), AppError> {
    let mut file = File::create(path)?;

    writeln!(
        file,
        "<!-- captured from {} at {} -->",
        source_url,
        chrono::Utc::now().to_rfc3339()
    )?;
    file.write_all(html.as_bytes())?;

    tracing::info!("Saved debug HTML to {}", path.display());
    Ok(())
}

/// Captures the current page as `<label>-<timestamp>.html` plus a `.png`
/// screenshot in `dir`. A failed screenshot is logged, not returned.
pub async fn save_failure_snapshot<P: BrowserPage>(page: &mut P, dir: &Path, label: &str) -> Result<PathBuf, AppError> {
    std::fs::create_dir_all(dir)?;

    let stem = format!(
        "{}-{}",
        label.replace(|c: char| !c.is_ascii_alphanumeric(), "_"),
        chrono::Utc::now().format("%Y%m%dT%H%M%S")
    );
    let source_url = page.current_url().await.unwrap_or_default();
    let html = page.content().await?;

    let html_path = dir.join(format!("{}.html", stem));
    save_debug_html(&html, &html_path, &source_url)?;

    let png_path = dir.join(format!("{}.png", stem));
    match page.screenshot(&png_path).await {
        Ok(()) => tracing::info!("Saved screenshot to {}", png_path.display()),
        Err(e) => tracing::warn!("Failed to capture screenshot: {}", e),
    }

    Ok(html_path)
}

/// Snapshot when a debug directory is configured; never fails the caller.
pub async fn snapshot_if_enabled<P: BrowserPage>(page: &mut P, dir: Option<&Path>, label: &str) {
    let Some(dir) = dir else { return };
    if let Err(e) = save_failure_snapshot(page, dir, label).await {
        tracing::warn!("Failed to save failure snapshot '{}': {}", label, e);
    }
}
