//! Declarative fixed-width record layouts
//!
//! A [`Layout`] is a table of [`FieldSpec`]s (name, byte offset, width, kind).
//! One generic decoder slices a line according to the table and checks every
//! field against its kind, so the header and detail formats share the same
//! offset arithmetic and validation rules.

use chrono::NaiveDate;
use std::fmt;

use crate::constants::{
    ITAG_FILE_TYPE, STATUS_CODES, detail_widths as dw, header_widths as hw,
};

/// Shape a fixed-width field must conform to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Must equal the literal exactly
    Literal(&'static str),
    /// ASCII digits only, at least one
    Numeric,
    /// Calendar date `YYYYMMDD`
    Date,
    /// Time of day `HHMMSS`, seconds up to 61
    Time,
    /// One of a closed set of codes
    Code(&'static [&'static str]),
}

impl FieldKind {
    /// Human-readable description of the expected form
    pub fn expected(&self) -> String {
        match self {
            FieldKind::Literal(literal) => literal.to_string(),
            FieldKind::Numeric => "digits".to_string(),
            FieldKind::Date => "YYYYMMDD".to_string(),
            FieldKind::Time => "HHMMSS".to_string(),
            FieldKind::Code(codes) => format!("one of {}", codes.join(", ")),
        }
    }

    /// Check a raw field value against this kind
    pub fn accepts(&self, value: &[u8]) -> bool {
        match self {
            FieldKind::Literal(literal) => value == literal.as_bytes(),
            FieldKind::Numeric => is_all_digits(value),
            FieldKind::Date => parse_date(value).is_some(),
            FieldKind::Time => is_valid_time(value),
            FieldKind::Code(codes) => codes.iter().any(|code| code.as_bytes() == value),
        }
    }
}

/// One column of a fixed-width layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub start: usize,
    pub width: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, start: usize, width: usize, kind: FieldKind) -> Self {
        Self {
            name,
            start,
            width,
            kind,
        }
    }

    pub const fn end(&self) -> usize {
        self.start + self.width
    }
}

/// Ordered field table for one record type
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

/// Line shorter than the layout requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TooShort {
    pub actual: usize,
    pub required: usize,
}

/// A field that failed its kind check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub kind: FieldKind,
    pub value: String,
}

impl FieldViolation {
    /// Reason text without the expected form, as used for detail lines
    pub fn short_reason(&self) -> String {
        match self.kind {
            FieldKind::Numeric => format!("{} not numeric: {}", self.field, self.value),
            _ => format!("Invalid {}: {}", self.field, self.value),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (expected {})",
            self.short_reason(),
            self.kind.expected()
        )
    }
}

impl Layout {
    /// Minimum line width covering every fixed field
    pub fn min_width(&self) -> usize {
        self.fields.iter().map(FieldSpec::end).max().unwrap_or(0)
    }

    /// Slice a line into its fields without validating them
    pub fn decode<'l, 'a>(&'l self, line: &'a [u8]) -> Result<DecodedLine<'l, 'a>, TooShort> {
        let required = self.min_width();
        if line.len() < required {
            return Err(TooShort {
                actual: line.len(),
                required,
            });
        }

        let values = self
            .fields
            .iter()
            .map(|spec| (spec, &line[spec.start..spec.end()]))
            .collect();

        Ok(DecodedLine {
            values,
            trailing: &line[required..],
        })
    }
}

/// A line sliced according to a layout
#[derive(Debug, Clone)]
pub struct DecodedLine<'l, 'a> {
    values: Vec<(&'l FieldSpec, &'a [u8])>,
    trailing: &'a [u8],
}

impl<'l, 'a> DecodedLine<'l, 'a> {
    /// Raw bytes of a named field
    pub fn raw(&self, name: &str) -> Option<&'a [u8]> {
        self.values
            .iter()
            .find(|(spec, _)| spec.name == name)
            .map(|(_, value)| *value)
    }

    /// Field value as (lossy) text
    pub fn text(&self, name: &str) -> String {
        self.raw(name).map(lossy).unwrap_or_default()
    }

    /// Numeric field value, `None` if it fails the numeric check
    pub fn number(&self, name: &str) -> Option<u64> {
        self.raw(name).and_then(parse_number)
    }

    /// Variable-length remainder after the fixed fields, `None` when empty
    pub fn trailing(&self) -> Option<&'a [u8]> {
        if self.trailing.is_empty() {
            None
        } else {
            Some(self.trailing)
        }
    }

    /// Check every field, collecting all violations in layout order
    pub fn violations(&self) -> Vec<FieldViolation> {
        self.values
            .iter()
            .filter(|(spec, value)| !spec.kind.accepts(value))
            .map(|(spec, value)| FieldViolation {
                field: spec.name,
                kind: spec.kind,
                value: lossy(value),
            })
            .collect()
    }
}

/// Header line: FILE_TYPE | FROM_AGENCY_ID | FILE_DATE | FILE_TIME | RECORD_COUNT | COUNT_STAT1..4
pub static HEADER_LAYOUT: Layout = Layout {
    name: "header",
    fields: &[
        FieldSpec::new("FILE_TYPE", 0, hw::FILE_TYPE, FieldKind::Literal(ITAG_FILE_TYPE)),
        FieldSpec::new("FROM_AGENCY_ID", 4, hw::FROM_AGENCY_ID, FieldKind::Numeric),
        FieldSpec::new("FILE_DATE", 7, hw::FILE_DATE, FieldKind::Date),
        FieldSpec::new("FILE_TIME", 15, hw::FILE_TIME, FieldKind::Time),
        FieldSpec::new("RECORD_COUNT", 21, hw::RECORD_COUNT, FieldKind::Numeric),
        FieldSpec::new("COUNT_STAT1", 29, hw::COUNT_STAT, FieldKind::Numeric),
        FieldSpec::new("COUNT_STAT2", 37, hw::COUNT_STAT, FieldKind::Numeric),
        FieldSpec::new("COUNT_STAT3", 45, hw::COUNT_STAT, FieldKind::Numeric),
        FieldSpec::new("COUNT_STAT4", 53, hw::COUNT_STAT, FieldKind::Numeric),
    ],
};

/// Detail line: TAG_AGENCY_ID | TAG_SERIAL_NUMBER | TAG_STATUS, then free-form ACCT_INFO
pub static DETAIL_LAYOUT: Layout = Layout {
    name: "detail",
    fields: &[
        FieldSpec::new("TAG_AGENCY_ID", 0, dw::TAG_AGENCY_ID, FieldKind::Numeric),
        FieldSpec::new("TAG_SERIAL_NUMBER", 3, dw::TAG_SERIAL_NUMBER, FieldKind::Numeric),
        FieldSpec::new("TAG_STATUS", 16, dw::TAG_STATUS, FieldKind::Code(STATUS_CODES)),
    ],
};

pub fn is_all_digits(value: &[u8]) -> bool {
    !value.is_empty() && value.iter().all(u8::is_ascii_digit)
}

/// Parse a digits-only field; anything else yields `None`
pub fn parse_number(value: &[u8]) -> Option<u64> {
    if !is_all_digits(value) {
        return None;
    }
    std::str::from_utf8(value).ok()?.parse().ok()
}

/// Parse `YYYYMMDD` into a calendar date
pub fn parse_date(value: &[u8]) -> Option<NaiveDate> {
    if value.len() != 8 || !is_all_digits(value) {
        return None;
    }
    let year = parse_number(&value[0..4])? as i32;
    let month = parse_number(&value[4..6])? as u32;
    let day = parse_number(&value[6..8])? as u32;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `HHMMSS` with hour 0-23, minute 0-59 and second 0-61 (leap seconds)
pub fn is_valid_time(value: &[u8]) -> bool {
    if value.len() != 6 || !is_all_digits(value) {
        return false;
    }
    let part = |range: std::ops::Range<usize>| parse_number(&value[range]).unwrap_or(u64::MAX);
    part(0..2) <= 23 && part(2..4) <= 59 && part(4..6) <= 61
}

pub fn lossy(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DETAIL_MIN_WIDTH, HEADER_MIN_WIDTH};

    fn assert_contiguous(layout: &Layout) {
        let mut expected_start = 0;
        for spec in layout.fields {
            assert_eq!(
                spec.start, expected_start,
                "{} field {} does not start where the previous one ends",
                layout.name, spec.name
            );
            expected_start = spec.end();
        }
    }

    #[test]
    fn test_header_layout_table() {
        assert_contiguous(&HEADER_LAYOUT);
        assert_eq!(HEADER_LAYOUT.fields.len(), 9);
        assert_eq!(HEADER_LAYOUT.min_width(), HEADER_MIN_WIDTH);
    }

    #[test]
    fn test_detail_layout_table() {
        assert_contiguous(&DETAIL_LAYOUT);
        assert_eq!(DETAIL_LAYOUT.min_width(), DETAIL_MIN_WIDTH);
    }

    #[test]
    fn test_decode_too_short() {
        let err = DETAIL_LAYOUT.decode(b"0011234").unwrap_err();
        assert_eq!(
            err,
            TooShort {
                actual: 7,
                required: 17
            }
        );
    }

    #[test]
    fn test_decode_slices_fields_and_trailing() {
        let decoded = DETAIL_LAYOUT.decode(b"00812345678901231ACCT-77").unwrap();

        assert_eq!(decoded.text("TAG_AGENCY_ID"), "008");
        assert_eq!(decoded.text("TAG_SERIAL_NUMBER"), "1234567890123");
        assert_eq!(decoded.text("TAG_STATUS"), "1");
        assert_eq!(decoded.trailing(), Some(&b"ACCT-77"[..]));
        assert!(decoded.violations().is_empty());
    }

    #[test]
    fn test_decode_exact_width_has_no_trailing() {
        let decoded = DETAIL_LAYOUT.decode(b"00812345678901234").unwrap();
        assert_eq!(decoded.trailing(), None);
    }

    #[test]
    fn test_violations_collects_every_field() {
        let decoded = DETAIL_LAYOUT.decode(b"A0B123456789012X9").unwrap();
        let violations = decoded.violations();

        assert_eq!(violations.len(), 3);
        assert_eq!(violations[0].short_reason(), "TAG_AGENCY_ID not numeric: A0B");
        assert_eq!(
            violations[1].short_reason(),
            "TAG_SERIAL_NUMBER not numeric: 123456789012X"
        );
        assert_eq!(violations[2].short_reason(), "Invalid TAG_STATUS: 9");
    }

    #[test]
    fn test_violation_display_includes_expected_form() {
        let violation = FieldViolation {
            field: "FILE_DATE",
            kind: FieldKind::Date,
            value: "20251301".to_string(),
        };
        assert_eq!(
            violation.to_string(),
            "Invalid FILE_DATE: 20251301 (expected YYYYMMDD)"
        );
    }

    #[test]
    fn test_field_kind_numeric() {
        assert!(FieldKind::Numeric.accepts(b"0042"));
        assert!(!FieldKind::Numeric.accepts(b""));
        assert!(!FieldKind::Numeric.accepts(b"00 2"));
        assert!(!FieldKind::Numeric.accepts(b"-042"));
        assert!(!FieldKind::Numeric.accepts("٣".as_bytes()));
    }

    #[test]
    fn test_field_kind_date() {
        assert!(FieldKind::Date.accepts(b"20250101"));
        assert!(FieldKind::Date.accepts(b"20240229"));
        assert!(!FieldKind::Date.accepts(b"20250229"));
        assert!(!FieldKind::Date.accepts(b"20251301"));
        assert!(!FieldKind::Date.accepts(b"2025010A"));
        assert!(!FieldKind::Date.accepts(b"2025011"));
    }

    #[test]
    fn test_field_kind_time() {
        assert!(FieldKind::Time.accepts(b"000000"));
        assert!(FieldKind::Time.accepts(b"235959"));
        assert!(FieldKind::Time.accepts(b"235960"));
        assert!(FieldKind::Time.accepts(b"235961"));
        assert!(!FieldKind::Time.accepts(b"235962"));
        assert!(!FieldKind::Time.accepts(b"240000"));
        assert!(!FieldKind::Time.accepts(b"126000"));
        assert!(!FieldKind::Time.accepts(b"12 000"));
    }

    #[test]
    fn test_field_kind_literal_and_code() {
        assert!(FieldKind::Literal("ITAG").accepts(b"ITAG"));
        assert!(!FieldKind::Literal("ITAG").accepts(b"itag"));
        assert!(FieldKind::Code(STATUS_CODES).accepts(b"3"));
        assert!(!FieldKind::Code(STATUS_CODES).accepts(b"0"));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(b"00000003"), Some(3));
        assert_eq!(parse_number(b"99999999"), Some(99_999_999));
        assert_eq!(parse_number(b"0000000A"), None);
        assert_eq!(parse_number(b""), None);
    }
}
