//! Result normalization.

use probe_core::{CallDescriptor, CallOutcome, CallRecord};
use serde::Serialize;
use serde_json::Map;
use std::fmt;

/// Turns an executed (or skipped) call into its normalized record.
///
/// Only reshapes: the parameters become a name-to-value object with binary
/// values replaced by their label.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reporter;

impl Reporter {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, descriptor: &CallDescriptor, url: &str, outcome: CallOutcome) -> CallRecord {
        let mut parameters = Map::new();
        for param in &descriptor.params {
            parameters.insert(param.name.clone(), param.value.to_report_value());
        }

        CallRecord {
            method: descriptor.method,
            url: url.to_string(),
            parameters,
            outcome,
        }
    }
}

/// Counts over one run's records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn from_records(records: &[CallRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Default::default()
        };
        for record in records {
            if record.is_success() {
                summary.succeeded += 1;
            } else if record.is_skipped() {
                summary.skipped += 1;
            } else {
                summary.failed += 1;
            }
        }
        summary
    }

    /// Calls that were actually dispatched.
    pub fn executed(&self) -> usize {
        self.total - self.skipped
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} calls: {} succeeded, {} failed, {} skipped",
            self.total, self.succeeded, self.failed, self.skipped
        )
    }
}
