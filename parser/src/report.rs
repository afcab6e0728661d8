//! Structured parse reporting.

use serde::{Deserialize, Serialize};

use crate::parser::diagnostics::ParseIssue;
use crate::parser::{FormatScore, ParseDiagnostics};

/// Structured failure code for parse runs that produced no records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    /// Input was empty or whitespace only.
    EmptyInput,
    /// Input had content but no record survived parsing.
    NoRecords,
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "empty_input"),
            Self::NoRecords => write!(f, "no_records"),
        }
    }
}

/// Weighted score entry for a detected input layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatScoreReport {
    pub format: String,
    pub score: f64,
}

pub fn to_format_score_reports(scores: &[FormatScore]) -> Vec<FormatScoreReport> {
    scores
        .iter()
        .map(|score| FormatScoreReport {
            format: score.format.to_string(),
            score: score.score,
        })
        .collect()
}

/// Per-input parse report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseReport {
    pub profile: String,
    pub success: bool,
    /// Structured failure code when no records were produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_code: Option<FailureCode>,
    pub selected_format: Option<String>,
    pub format_scores: Vec<FormatScoreReport>,
    pub parsers_used: Vec<String>,
    pub coverage: f64,
    pub relevant_lines: usize,
    pub recognized_lines: usize,
    pub record_count: usize,
    /// Whether records sharing meeting times were merged.
    pub merged: bool,
    pub issues: Vec<ParseIssue>,
    pub warnings: Vec<String>,
    /// Semantic problems found in emitted records (`record N: ...`).
    pub validation_errors: Vec<String>,
}

impl ParseReport {
    /// Fills the diagnostic fields from a finished parse.
    pub fn from_diagnostics(profile: &str, diagnostics: &ParseDiagnostics) -> Self {
        Self {
            profile: profile.to_string(),
            success: false,
            failure_code: None,
            selected_format: diagnostics
                .format_scores
                .first()
                .map(|score| score.format.to_string()),
            format_scores: to_format_score_reports(&diagnostics.format_scores),
            parsers_used: diagnostics.parsers_used.clone(),
            coverage: diagnostics.coverage(),
            relevant_lines: diagnostics.relevant_lines,
            recognized_lines: diagnostics.recognized_lines,
            record_count: 0,
            merged: false,
            issues: diagnostics.issues.clone(),
            warnings: Vec::new(),
            validation_errors: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::InputFormat;
    use crate::parser::diagnostics::IssueKind;

    #[test]
    fn test_failure_code_display_matches_serde() {
        let codes = [
            (FailureCode::EmptyInput, "empty_input"),
            (FailureCode::NoRecords, "no_records"),
        ];

        for (code, expected) in codes {
            assert_eq!(code.to_string(), expected);
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{expected}\""));
            let back: FailureCode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, code);
        }
    }

    #[test]
    fn test_report_from_diagnostics() {
        let diagnostics = ParseDiagnostics {
            format_scores: vec![
                FormatScore {
                    format: InputFormat::Positional,
                    score: 0.9,
                },
                FormatScore {
                    format: InputFormat::Unknown,
                    score: 0.05,
                },
            ],
            parsers_used: vec!["positional".to_string()],
            relevant_lines: 4,
            recognized_lines: 2,
            issues: vec![ParseIssue::new(3, IssueKind::NoMatch, "Tổng số tín chỉ")],
        };

        let report = ParseReport::from_diagnostics("ufl", &diagnostics);
        assert_eq!(report.selected_format.as_deref(), Some("positional"));
        assert_eq!(report.format_scores[1].format, "unknown");
        assert!((report.coverage - 0.5).abs() < f64::EPSILON);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn test_report_omits_none_failure_code() {
        let mut report = ParseReport::from_diagnostics("dut", &ParseDiagnostics::default());
        report.success = true;
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("failure_code"));

        report.failure_code = Some(FailureCode::NoRecords);
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"failure_code\":\"no_records\""));
    }
}
