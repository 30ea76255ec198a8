//! End-of-run reconciliation of declared against observed counts

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use crate::models::{HeaderRecord, RunSummary, TagStatus};

/// Which declared count disagreed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    RecordCount,
    Status(TagStatus),
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::RecordCount => write!(f, "RECORD_COUNT"),
            Dimension::Status(status) => write!(f, "COUNT_STAT{}", status.code()),
        }
    }
}

/// A discrepancy between the header and the processed records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationFinding {
    pub dimension: Dimension,
    pub expected: u64,
    pub actual: u64,
}

impl fmt::Display for ReconciliationFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} mismatch: expected {}, got {}",
            self.dimension, self.expected, self.actual
        )
    }
}

/// Compare all five declared counts with the observed ones
///
/// Every dimension is evaluated; a run can produce up to five findings.
pub fn reconcile(declared: &HeaderRecord, actual: &RunSummary) -> Vec<ReconciliationFinding> {
    let mut findings = Vec::new();

    if actual.actual_record_count != declared.declared_record_count {
        findings.push(ReconciliationFinding {
            dimension: Dimension::RecordCount,
            expected: declared.declared_record_count,
            actual: actual.actual_record_count,
        });
    }

    for status in TagStatus::ALL {
        let expected = declared.declared_status_counts[status];
        let observed = actual.actual_status_counts[status];
        if expected != observed {
            findings.push(ReconciliationFinding {
                dimension: Dimension::Status(status),
                expected,
                actual: observed,
            });
        }
    }

    if findings.is_empty() {
        info!(
            "Reconciliation passed: {} records match header",
            actual.actual_record_count
        );
    } else {
        for finding in &findings {
            warn!("Reconciliation: {}", finding);
        }
    }

    findings
}
