//! Append-only error log for rejected lines and reconciliation findings
//!
//! Entries accumulate in memory for the whole run and are written out once,
//! after the run completes, and only if there is something to write.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::info;

use super::header_parser::HeaderOutcome;
use super::reconciler::ReconciliationFinding;
use crate::constants::{END_OF_RUN_MARKER, HEADER_LINE_NUMBER};
use crate::models::ValidationOutcome;
use crate::{Error, Result};

/// Where an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineId {
    Line(u64),
    EndOfRun,
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineId::Line(number) => write!(f, "{}", number),
            LineId::EndOfRun => write!(f, "{}", END_OF_RUN_MARKER),
        }
    }
}

/// Non-fatal error classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    HeaderFormat,
    RecordFormat,
    ReconciliationMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub line: LineId,
    pub kind: IssueKind,
    pub reason: String,
    pub content: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line {}: {} | Content: {}",
            self.line, self.reason, self.content
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    entries: Vec<LogEntry>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        line: LineId,
        kind: IssueKind,
        reason: impl Into<String>,
        content: impl Into<String>,
    ) {
        self.entries.push(LogEntry {
            line,
            kind,
            reason: reason.into(),
            content: content.into(),
        });
    }

    /// One entry per header issue, all on line 1
    pub fn append_header(&mut self, outcome: &HeaderOutcome) {
        for issue in &outcome.issues {
            self.append(
                LineId::Line(HEADER_LINE_NUMBER),
                IssueKind::HeaderFormat,
                issue.reason.clone(),
                outcome.raw.clone(),
            );
        }
    }

    /// Log a rejected detail line; accepted outcomes are ignored
    pub fn append_rejection(&mut self, outcome: &ValidationOutcome) {
        if let ValidationOutcome::Rejected {
            line_number,
            reasons,
            raw,
        } = outcome
        {
            self.append(
                LineId::Line(*line_number),
                IssueKind::RecordFormat,
                reasons.join("; "),
                raw.clone(),
            );
        }
    }

    pub fn append_findings(&mut self, findings: &[ReconciliationFinding]) {
        for finding in findings {
            self.append(
                LineId::EndOfRun,
                IssueKind::ReconciliationMismatch,
                finding.to_string(),
                "",
            );
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_of(&self, kind: IssueKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// All entries rendered one per line
    pub fn render(&self) -> String {
        let mut text = String::new();
        for entry in &self.entries {
            text.push_str(&entry.to_string());
            text.push('\n');
        }
        text
    }

    /// Append the log to `path`, creating it if needed; no-op when empty
    ///
    /// Returns the number of entries written.
    pub async fn persist(&self, path: &Path) -> Result<usize> {
        if self.is_empty() {
            return Ok(0);
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| Error::io(format!("Failed to open error log {}", path.display()), e))?;

        file.write_all(self.render().as_bytes())
            .await
            .map_err(|e| Error::io(format!("Failed to write error log {}", path.display()), e))?;
        file.flush()
            .await
            .map_err(|e| Error::io(format!("Failed to flush error log {}", path.display()), e))?;

        info!(
            "Wrote {} error log entries to {}",
            self.entries.len(),
            path.display()
        );
        Ok(self.entries.len())
    }
}
