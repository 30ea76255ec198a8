//! Core data structures for ITAG ingestion.
//!
//! Defines the decoded header and detail records, tag status codes, per-status
//! counters and the per-line validation outcome shared by the parsers, the
//! accumulator and the batch sink adapter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Tag status codes carried in TAG_STATUS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TagStatus {
    /// Code 1
    Valid,
    /// Code 2
    LowBalance,
    /// Code 3
    Invalid,
    /// Code 4
    LostStolen,
}

impl TagStatus {
    /// All statuses in code order
    pub const ALL: [TagStatus; 4] = [
        TagStatus::Valid,
        TagStatus::LowBalance,
        TagStatus::Invalid,
        TagStatus::LostStolen,
    ];

    /// Decode a single status byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'1' => Some(TagStatus::Valid),
            b'2' => Some(TagStatus::LowBalance),
            b'3' => Some(TagStatus::Invalid),
            b'4' => Some(TagStatus::LostStolen),
            _ => None,
        }
    }

    /// Numeric code as written in the file
    pub fn code(self) -> u8 {
        match self {
            TagStatus::Valid => 1,
            TagStatus::LowBalance => 2,
            TagStatus::Invalid => 3,
            TagStatus::LostStolen => 4,
        }
    }

    fn slot(self) -> usize {
        usize::from(self.code() - 1)
    }
}

impl fmt::Display for TagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Counters keyed by tag status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts([u64; 4]);

impl StatusCounts {
    /// Build counts from values in code order (1, 2, 3, 4)
    pub fn from_array(counts: [u64; 4]) -> Self {
        Self(counts)
    }

    /// Counts in code order
    pub fn as_array(&self) -> [u64; 4] {
        self.0
    }

    /// Iterate `(status, count)` pairs in code order
    pub fn iter(&self) -> impl Iterator<Item = (TagStatus, u64)> + '_ {
        TagStatus::ALL.into_iter().map(|status| (status, self[status]))
    }

    /// Sum across all four buckets
    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

impl Index<TagStatus> for StatusCounts {
    type Output = u64;

    fn index(&self, status: TagStatus) -> &u64 {
        &self.0[status.slot()]
    }
}

impl IndexMut<TagStatus> for StatusCounts {
    fn index_mut(&mut self, status: TagStatus) -> &mut u64 {
        &mut self.0[status.slot()]
    }
}

/// Header record decoded from line 1
///
/// Text fields hold the raw slice even when invalid. Declared counts that
/// failed numeric validation are reported as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRecord {
    pub file_type: String,
    pub from_agency_id: String,
    pub file_date: String,
    pub file_time: String,
    pub declared_record_count: u64,
    pub declared_status_counts: StatusCounts,
}

/// Validated detail record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub tag_agency_id: String,
    pub tag_serial_number: String,
    pub tag_status: TagStatus,
    /// Trailing free text, not persisted
    pub acct_info: Option<String>,
}

/// Result of validating one detail line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted(DetailRecord),
    Rejected {
        line_number: u64,
        reasons: Vec<String>,
        raw: String,
    },
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted(_))
    }

    /// Rejection reasons joined the way they appear in the error log
    pub fn joined_reasons(&self) -> Option<String> {
        match self {
            ValidationOutcome::Accepted(_) => None,
            ValidationOutcome::Rejected { reasons, .. } => Some(reasons.join("; ")),
        }
    }
}

/// Observed totals at end of stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub actual_record_count: u64,
    pub actual_status_counts: StatusCounts,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_status_from_byte() {
        assert_eq!(TagStatus::from_byte(b'1'), Some(TagStatus::Valid));
        assert_eq!(TagStatus::from_byte(b'4'), Some(TagStatus::LostStolen));
        assert_eq!(TagStatus::from_byte(b'0'), None);
        assert_eq!(TagStatus::from_byte(b'5'), None);
        assert_eq!(TagStatus::from_byte(b' '), None);
    }

    #[test]
    fn test_tag_status_code_roundtrip() {
        for status in TagStatus::ALL {
            let byte = b'0' + status.code();
            assert_eq!(TagStatus::from_byte(byte), Some(status));
        }
    }

    #[test]
    fn test_status_counts_indexing() {
        let mut counts = StatusCounts::default();
        counts[TagStatus::Invalid] += 2;
        counts[TagStatus::Valid] += 1;

        assert_eq!(counts.as_array(), [1, 0, 2, 0]);
        assert_eq!(counts.total(), 3);

        let pairs: Vec<_> = counts.iter().collect();
        assert_eq!(pairs[2], (TagStatus::Invalid, 2));
    }

    #[test]
    fn test_joined_reasons() {
        let rejected = ValidationOutcome::Rejected {
            line_number: 7,
            reasons: vec!["first".to_string(), "second".to_string()],
            raw: "raw".to_string(),
        };
        assert_eq!(rejected.joined_reasons().as_deref(), Some("first; second"));
        assert!(!rejected.is_accepted());
    }
}
