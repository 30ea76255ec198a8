//! ITAG header parsing and validation
//!
//! The header is the first line of the file. It declares the file origin and
//! the record counts the detail section is expected to contain. Every field is
//! checked independently so a single run reports all header defects at once;
//! declared counts that are not numeric fall back to zero for reconciliation.

use tracing::{debug, info, warn};

use super::layout::{HEADER_LAYOUT, lossy};
use crate::constants::HEADER_MIN_WIDTH;
use crate::models::{HeaderRecord, StatusCounts};

/// One header defect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderIssue {
    /// Offending field, `None` when the line itself is unusable
    pub field: Option<&'static str>,
    pub reason: String,
}

/// Decoded header plus its verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderOutcome {
    pub header: HeaderRecord,
    pub valid: bool,
    pub issues: Vec<HeaderIssue>,
    /// Header line with terminators removed
    pub raw: String,
}

impl HeaderOutcome {
    /// Confirmation message, only for a fully valid header
    pub fn confirmation(&self) -> Option<String> {
        if !self.valid {
            return None;
        }
        let header = &self.header;
        Some(format!(
            "Header validated successfully: File Type={}, Agency={}, Date={}, Time={}, Record Count={}",
            header.file_type,
            header.from_agency_id,
            header.file_date,
            header.file_time,
            header.declared_record_count
        ))
    }
}

/// Parse the header line (terminators already stripped)
pub fn parse_header(line: &[u8]) -> HeaderOutcome {
    let raw = lossy(line);

    let decoded = match HEADER_LAYOUT.decode(line) {
        Ok(decoded) => decoded,
        Err(too_short) => {
            warn!(
                "Header too short: {} characters, need {}",
                too_short.actual, HEADER_MIN_WIDTH
            );
            return HeaderOutcome {
                header: HeaderRecord::default(),
                valid: false,
                issues: vec![HeaderIssue {
                    field: None,
                    reason: "Header too short".to_string(),
                }],
                raw,
            };
        }
    };

    let issues: Vec<HeaderIssue> = decoded
        .violations()
        .into_iter()
        .map(|violation| {
            debug!("Header field rejected: {}", violation);
            HeaderIssue {
                field: Some(violation.field),
                reason: violation.to_string(),
            }
        })
        .collect();

    let count = |name: &str| decoded.number(name).unwrap_or(0);

    let header = HeaderRecord {
        file_type: decoded.text("FILE_TYPE"),
        from_agency_id: decoded.text("FROM_AGENCY_ID"),
        file_date: decoded.text("FILE_DATE"),
        file_time: decoded.text("FILE_TIME"),
        declared_record_count: count("RECORD_COUNT"),
        declared_status_counts: StatusCounts::from_array([
            count("COUNT_STAT1"),
            count("COUNT_STAT2"),
            count("COUNT_STAT3"),
            count("COUNT_STAT4"),
        ]),
    };

    let outcome = HeaderOutcome {
        header,
        valid: issues.is_empty(),
        issues,
        raw,
    };

    match outcome.confirmation() {
        Some(message) => info!("{}", message),
        None => warn!(
            "Header invalid ({} field errors); declared counts degraded to recoverable values",
            outcome.issues.len()
        ),
    }

    outcome
}
