//! Batch statistics
//!
//! Summarizes a finished batch from its records and prints it to stdout.

use crate::output::traits::{ContactRecord, RecordError};
use std::collections::BTreeMap;
use std::time::Duration;

/// Batch statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchStatistics {
    /// Input targets processed
    pub targets: usize,

    /// Records written (targets plus sitemap-derived pages)
    pub records: usize,

    /// Records with at least one email or phone
    pub records_with_contacts: usize,

    pub total_emails: usize,
    pub total_phones: usize,

    /// Count of records per error kind
    pub errors: BTreeMap<&'static str, usize>,

    pub elapsed: Duration,
}

impl BatchStatistics {
    /// Builds statistics from the final records
    pub fn from_records(targets: usize, records: &[ContactRecord], elapsed: Duration) -> Self {
        let mut stats = Self {
            targets,
            records: records.len(),
            elapsed,
            ..Self::default()
        };

        for record in records {
            if record.has_contacts() {
                stats.records_with_contacts += 1;
            }
            stats.total_emails += record.emails.len();
            stats.total_phones += record.phones.len();

            if let Some(error) = &record.error {
                *stats.errors.entry(error_kind(error)).or_default() += 1;
            }
        }

        stats
    }

    /// Share of records that produced contacts, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.records == 0 {
            return 0.0;
        }
        (self.records_with_contacts as f64 / self.records as f64) * 100.0
    }
}

fn error_kind(error: &RecordError) -> &'static str {
    match error {
        RecordError::InvalidTarget(_) => "Invalid URL",
        RecordError::SiteDown => "Site down",
        RecordError::Fetch(_) => "Fetch failed",
        RecordError::NoContactInfo => "No contact info",
        RecordError::Cancelled => "Cancelled",
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &BatchStatistics) {
    println!("=== Batch Statistics ===\n");

    println!("Overview:");
    println!("  Targets processed: {}", stats.targets);
    println!("  Records written: {}", stats.records);
    println!("  Unique emails (per record): {}", stats.total_emails);
    println!("  Unique phones (per record): {}", stats.total_phones);
    println!("  Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
    println!();

    if !stats.errors.is_empty() {
        println!("Errors:");
        let mut counts: Vec<_> = stats.errors.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} records with contact info)",
        stats.success_rate(),
        stats.records_with_contacts,
        stats.records
    );
}
