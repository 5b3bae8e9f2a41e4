//! Spreadsheet input
//!
//! Targets are read from a headerless CSV sheet, one per row. The URL
//! collector scans every cell of an arbitrary sheet for URL-looking strings.

use csv::{ReaderBuilder, WriterBuilder};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

/// Errors raised while reading or writing input sheets
#[derive(Debug, Error)]
pub enum InputError {
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InputError {
    fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Cells the collector accepts: http(s)/ftp(s) URLs on a domain, localhost or IP
static URL_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:http|ftp)s?://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+(?:[A-Z]{2,6}\.?|[A-Z0-9-]{2,}\.?)|",
        r"localhost|",
        r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}|",
        r"\[?[A-F0-9]*:[A-F0-9:]+\]?)",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("valid URL pattern")
});

/// Returns true if a cell looks like a URL
pub fn is_url_like(cell: &str) -> bool {
    URL_LIKE.is_match(cell)
}

/// Reads crawl targets: the first non-empty cell of each row, trimmed
///
/// Rows without any non-empty cell are skipped. Targets are not validated
/// here; invalid ones become per-row errors downstream.
pub fn read_targets(path: &Path, max: Option<usize>) -> Result<Vec<String>, InputError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| InputError::csv(path, e))?;

    let mut targets = Vec::new();
    for row in reader.records() {
        if max.is_some_and(|max| targets.len() >= max) {
            break;
        }

        let row = row.map_err(|e| InputError::csv(path, e))?;
        if let Some(cell) = row.iter().map(str::trim).find(|cell| !cell.is_empty()) {
            targets.push(cell.to_string());
        }
    }

    tracing::info!("Read {} targets from {}", targets.len(), path.display());
    Ok(targets)
}

/// Collects every URL-looking cell of a sheet, first occurrence order, no duplicates
pub fn collect_urls(path: &Path) -> Result<Vec<String>, InputError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| InputError::csv(path, e))?;

    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for row in reader.records() {
        let row = row.map_err(|e| InputError::csv(path, e))?;
        for cell in row.iter().map(str::trim) {
            if is_url_like(cell) && seen.insert(cell.to_string()) {
                urls.push(cell.to_string());
            }
        }
    }

    Ok(urls)
}

/// Writes a one-column sheet with header `URLs`
pub fn write_url_list(path: &Path, urls: &[String]) -> Result<(), InputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new()
        .from_path(path)
        .map_err(|e| InputError::csv(path, e))?;

    writer
        .write_record(["URLs"])
        .map_err(|e| InputError::csv(path, e))?;
    for url in urls {
        writer
            .write_record([url.as_str()])
            .map_err(|e| InputError::csv(path, e))?;
    }
    writer.flush()?;
    Ok(())
}
