//! ITAG detail record parsing
//!
//! Turns one detail line into a [`ValidationOutcome`]. Parsing is a pure
//! function of the line number and bytes, so chunks of lines can be validated
//! on worker threads and reassembled in file order.

use tracing::debug;

use super::layout::{DETAIL_LAYOUT, lossy};
use crate::models::{DetailRecord, TagStatus, ValidationOutcome};

/// Parse one detail line (terminators already stripped)
pub fn parse_detail(line_number: u64, line: &[u8]) -> ValidationOutcome {
    let decoded = match DETAIL_LAYOUT.decode(line) {
        Ok(decoded) => decoded,
        Err(too_short) => {
            return reject(
                line_number,
                vec![format!("line too short: {}", too_short.actual)],
                line,
            );
        }
    };

    let violations = decoded.violations();
    if !violations.is_empty() {
        let reasons = violations.iter().map(|v| v.short_reason()).collect();
        return reject(line_number, reasons, line);
    }

    // The layout check above guarantees a recognised status byte
    let Some(tag_status) = decoded
        .raw("TAG_STATUS")
        .and_then(|status| status.first().copied())
        .and_then(TagStatus::from_byte)
    else {
        return reject(line_number, vec!["Invalid TAG_STATUS".to_string()], line);
    };

    ValidationOutcome::Accepted(DetailRecord {
        tag_agency_id: decoded.text("TAG_AGENCY_ID"),
        tag_serial_number: decoded.text("TAG_SERIAL_NUMBER"),
        tag_status,
        acct_info: decoded.trailing().map(lossy),
    })
}

fn reject(line_number: u64, reasons: Vec<String>, line: &[u8]) -> ValidationOutcome {
    debug!("Rejected line {}: {}", line_number, reasons.join("; "));
    ValidationOutcome::Rejected {
        line_number,
        reasons,
        raw: lossy(line),
    }
}

/// Validate a chunk of `(line_number, line)` pairs, preserving order
pub fn parse_chunk(lines: &[(u64, Vec<u8>)]) -> Vec<ValidationOutcome> {
    lines
        .iter()
        .map(|(line_number, line)| parse_detail(*line_number, line))
        .collect()
}
