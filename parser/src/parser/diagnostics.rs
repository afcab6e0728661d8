//! Per-line parse issues.
//!
//! Parsing never fails on malformed text; every line or span the strategies
//! could not turn into a record is noted here instead.

use serde::{Deserialize, Serialize};

/// Why a line or span did not (fully) become a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Line or span not recognized by any strategy; dropped.
    NoMatch,
    /// Grammar matched but some sub-tokens did not decode.
    PartialMatch,
    /// Positional tuple rejected (weekday or lesson-range shape).
    InvalidSchedule,
    /// Date range missing or undecodable; fallback weeks used.
    MalformedDateRange,
    /// Record removed by the profile's record policy.
    DroppedByPolicy,
}

impl IssueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoMatch => "no_match",
            Self::PartialMatch => "partial_match",
            Self::InvalidSchedule => "invalid_schedule",
            Self::MalformedDateRange => "malformed_date_range",
            Self::DroppedByPolicy => "dropped_by_policy",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One issue, tied to a 1-based input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    pub line: usize,
    pub kind: IssueKind,
    pub text: String,
}

impl ParseIssue {
    pub fn new(line: usize, kind: IssueKind, text: impl Into<String>) -> Self {
        Self {
            line,
            kind,
            text: text.into(),
        }
    }
}

/// Summary warnings for a set of issues, one per kind present.
pub fn issue_warnings(issues: &[ParseIssue]) -> Vec<String> {
    let count = |kind: IssueKind| issues.iter().filter(|issue| issue.kind == kind).count();
    let mut warnings = Vec::new();

    let skipped = count(IssueKind::NoMatch);
    if skipped > 0 {
        warnings.push(format!("Skipped {skipped} unrecognized lines"));
    }

    let partial = count(IssueKind::PartialMatch);
    if partial > 0 {
        warnings.push(format!("{partial} lines matched only partially"));
    }

    let invalid = count(IssueKind::InvalidSchedule);
    if invalid > 0 {
        warnings.push(format!("Rejected {invalid} schedule entries with invalid weekday or lessons"));
    }

    let malformed = count(IssueKind::MalformedDateRange);
    if malformed > 0 {
        warnings.push(format!(
            "{malformed} date ranges could not be decoded; default weeks used"
        ));
    }

    let dropped = count(IssueKind::DroppedByPolicy);
    if dropped > 0 {
        warnings.push(format!("Dropped {dropped} incomplete records"));
    }

    warnings
}
