//! Output module for batch reports
//!
//! This module handles:
//! - The per-URL `ContactRecord` and its error column
//! - Writing and reading the CSV report
//! - Batch statistics

mod csv_output;
pub mod stats;
mod traits;

pub use csv_output::{read_report, CsvReportSink, REPORT_HEADER};
pub use stats::{print_statistics, BatchStatistics};
pub use traits::{ContactRecord, OutputError, OutputResult, RecordError, ResultSink};
