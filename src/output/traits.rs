//! Output sink trait and record types
//!
//! This module defines the per-URL result record written to the report and
//! the trait interface for report sinks.

use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to format output: {0}")]
    Format(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

const INVALID_TARGET_PREFIX: &str = "Invalid URL: ";
const SITE_DOWN: &str = "Site is down";
const NO_CONTACT_INFO: &str = "No contact info found";
const CANCELLED: &str = "Crawl cancelled";

/// Why a record carries no (or incomplete) results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The input was not an absolute http(s) URL
    InvalidTarget(String),
    /// The liveness gate reported the site as down
    SiteDown,
    /// The seed page could not be fetched
    Fetch(String),
    /// Crawled successfully, nothing found
    NoContactInfo,
    /// Stopped before this target was crawled
    Cancelled,
}

impl RecordError {
    /// Parses the text form written to the report
    pub fn from_message(message: &str) -> Self {
        if let Some(reason) = message.strip_prefix(INVALID_TARGET_PREFIX) {
            return Self::InvalidTarget(reason.to_string());
        }
        match message {
            SITE_DOWN => Self::SiteDown,
            NO_CONTACT_INFO => Self::NoContactInfo,
            CANCELLED => Self::Cancelled,
            other => Self::Fetch(other.to_string()),
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTarget(reason) => write!(f, "{}{}", INVALID_TARGET_PREFIX, reason),
            Self::SiteDown => f.write_str(SITE_DOWN),
            Self::Fetch(message) => f.write_str(message),
            Self::NoContactInfo => f.write_str(NO_CONTACT_INFO),
            Self::Cancelled => f.write_str(CANCELLED),
        }
    }
}

/// Result for one processed URL (an input target or a sitemap-derived page)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub url: String,
    pub emails: BTreeSet<String>,
    pub phones: BTreeSet<String>,
    pub error: Option<RecordError>,
}

impl ContactRecord {
    /// A record with contacts and no error
    pub fn found(url: impl Into<String>, emails: BTreeSet<String>, phones: BTreeSet<String>) -> Self {
        Self {
            url: url.into(),
            emails,
            phones,
            error: None,
        }
    }

    /// A record with no contacts and the given error
    pub fn failed(url: impl Into<String>, error: RecordError) -> Self {
        Self {
            url: url.into(),
            emails: BTreeSet::new(),
            phones: BTreeSet::new(),
            error: Some(error),
        }
    }

    pub fn has_contacts(&self) -> bool {
        !self.emails.is_empty() || !self.phones.is_empty()
    }
}

/// Destination for the batch report
///
/// The report is written once, at the end of a batch.
pub trait ResultSink {
    /// Writes every record, in order
    fn write_records(&mut self, records: &[ContactRecord]) -> OutputResult<()>;
}

/// In-memory sink
impl ResultSink for Vec<ContactRecord> {
    fn write_records(&mut self, records: &[ContactRecord]) -> OutputResult<()> {
        self.extend_from_slice(records);
        Ok(())
    }
}
