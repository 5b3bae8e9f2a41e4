//! CSV report writer and reader
//!
//! Layout: header `url,emails,phones,error`, one row per record, email and
//! phone lists joined with `; `, empty error column when the record is clean.

use crate::output::traits::{ContactRecord, OutputResult, RecordError, ResultSink};
use csv::StringRecord;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const REPORT_HEADER: [&str; 4] = ["url", "emails", "phones", "error"];

const LIST_SEPARATOR: &str = "; ";

/// Writes the report to a CSV file, replacing any previous content
pub struct CsvReportSink {
    path: PathBuf,
}

impl CsvReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for CsvReportSink {
    fn write_records(&mut self, records: &[ContactRecord]) -> OutputResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = csv::WriterBuilder::new().from_path(&self.path)?;
        writer.write_record(REPORT_HEADER)?;

        for record in records {
            let emails = join_list(&record.emails);
            let phones = join_list(&record.phones);
            let error = record
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            writer.write_record([
                record.url.as_str(),
                emails.as_str(),
                phones.as_str(),
                error.as_str(),
            ])?;
        }

        writer.flush()?;
        tracing::info!(
            "Data saved to {} ({} records)",
            self.path.display(),
            records.len()
        );
        Ok(())
    }
}

/// Reads a report written by [`CsvReportSink`] back into records
pub fn read_report(path: &Path) -> OutputResult<Vec<ContactRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for row in reader.records() {
        records.push(record_from_row(&row?));
    }
    Ok(records)
}

fn record_from_row(row: &StringRecord) -> ContactRecord {
    let field = |index: usize| row.get(index).unwrap_or_default();

    let error = field(3).trim();
    ContactRecord {
        url: field(0).to_string(),
        emails: split_list(field(1)),
        phones: split_list(field(2)),
        error: (!error.is_empty()).then(|| RecordError::from_message(error)),
    }
}

fn join_list(values: &BTreeSet<String>) -> String {
    values
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

fn split_list(value: &str) -> BTreeSet<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}
