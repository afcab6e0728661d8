//! Timetable text parser for multiple export layouts.
//!
//! Students copy their timetable straight out of the university portal, so
//! the input is whatever the browser put on the clipboard: tab-separated
//! table rows, stray page chrome, and one of several layouts depending on
//! the institution and the page it came from:
//!
//! - **Grammar**: one course per line, matched by the profile's named-group
//!   pattern (`Thứ 2,4-5,C128` slots, `29-44` week ranges)
//! - **Preview**: the registration preview, `Thứ 6: 1-2,F207` slots
//! - **Positional**: one course over 2, 6/7 or 12 lines with absolute
//!   `dd/mm/yyyy-dd/mm/yyyy` date ranges
//!
//! # Architecture
//!
//! The input is normalized and scored against the known layouts, then routed
//! by the institution profile to a [`ParserStrategy`]. The profile decides
//! the layout; classification scores are diagnostic and only produce a
//! warning when they disagree. Records then pass the profile's record policy
//! and, optionally, the time-range merger.
//!
//! The primary entry point is [`ScheduleParser::new`] followed by
//! [`ScheduleParser::parse`], but most consumers should use
//! [`parse_schedule_text`](crate::parse_schedule_text) instead.

mod classify;
pub mod diagnostics;
mod normalize;
pub mod strategies;

use serde::{Deserialize, Serialize};
use tkb_core::{CourseMeeting, merge_records};
use tkb_profiles::{InstitutionProfile, Layout, RecordPolicy};
use tracing::{debug, info};

pub use classify::classify_formats;
pub use normalize::{normalize_input, to_indexed_lines};

use diagnostics::{IssueKind, ParseIssue, issue_warnings};
use strategies::grammar::GrammarStrategy;
use strategies::positional::PositionalStrategy;
use strategies::preview::PreviewStrategy;
use strategies::{Candidate, ParserStrategy};

/// Layout an input looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    Grammar,
    Preview,
    Positional,
    Unknown,
}

impl InputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grammar => "grammar",
            Self::Preview => "preview",
            Self::Positional => "positional",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weighted score for a detected input layout.
#[derive(Debug, Clone)]
pub struct FormatScore {
    pub format: InputFormat,
    pub score: f64,
}

/// Diagnostics for a single parse run.
#[derive(Debug, Clone, Default)]
pub struct ParseDiagnostics {
    pub format_scores: Vec<FormatScore>,
    pub parsers_used: Vec<String>,
    pub relevant_lines: usize,
    pub recognized_lines: usize,
    pub issues: Vec<ParseIssue>,
}

impl ParseDiagnostics {
    pub fn coverage(&self) -> f64 {
        if self.relevant_lines == 0 {
            return 0.0;
        }
        self.recognized_lines as f64 / self.relevant_lines as f64
    }

    pub fn record(&mut self, issue: ParseIssue) {
        self.issues.push(issue);
    }

    /// 1-based numbers of lines no strategy recognized.
    pub fn skipped_lines(&self) -> Vec<usize> {
        self.issues
            .iter()
            .filter(|issue| issue.kind == IssueKind::NoMatch)
            .map(|issue| issue.line)
            .collect()
    }
}

/// One physical input line with its 0-based position.
#[derive(Debug, Clone)]
pub struct IndexedLine {
    pub index: usize,
    pub text: String,
}

/// Per-call parse settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Coalesce records that meet at the same times.
    pub merge_records: bool,
}

impl ParseOptions {
    /// Options seeded from the profile's feature defaults.
    pub fn for_profile(profile: &InstitutionProfile) -> Self {
        Self {
            merge_records: profile.merges_by_default(),
        }
    }
}

/// Records parsed from one input, with the layout it was detected as.
#[derive(Debug, Clone, Serialize)]
pub struct ParseResult {
    pub profile: String,
    pub records: Vec<CourseMeeting>,
    pub detected_format: Option<InputFormat>,
    pub warnings: Vec<String>,
}

impl ParseResult {
    pub fn success(&self) -> bool {
        !self.records.is_empty()
    }
}

/// Parser for pasted timetable text, bound to one institution profile.
///
/// A parser holds no state between inputs; build a new one per call.
pub struct ScheduleParser<'a> {
    profile: &'a InstitutionProfile,
    raw_input: String,
    options: ParseOptions,
    detected_format: Option<InputFormat>,
    warnings: Vec<String>,
    diagnostics: ParseDiagnostics,
}

impl<'a> ScheduleParser<'a> {
    /// Creates a parser with options taken from the profile defaults.
    pub fn new(profile: &'a InstitutionProfile, input: &str) -> Self {
        Self {
            profile,
            raw_input: input.to_string(),
            options: ParseOptions::for_profile(profile),
            detected_format: None,
            warnings: Vec::new(),
            diagnostics: ParseDiagnostics::default(),
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Parses the input into course records.
    ///
    /// Never fails: unrecognized lines end up in [`diagnostics`](Self::diagnostics)
    /// and a summary is added to [`warnings`](Self::warnings). Parsing is total
    /// over any input (indexing is bounds-checked and nothing unwraps), so no panic
    /// guard wraps it.
    pub fn parse(&mut self) -> Vec<CourseMeeting> {
        if self.raw_input.trim().is_empty() {
            self.warnings.push("Empty input".to_string());
            return Vec::new();
        }

        let normalized = normalize_input(&self.raw_input);
        let indexed_lines = to_indexed_lines(&normalized);
        let line_refs: Vec<&str> = indexed_lines
            .iter()
            .map(|line| line.text.as_str())
            .collect();

        let format_scores = classify_formats(&line_refs);
        self.detected_format = format_scores.first().map(|score| score.format);
        debug!(
            profile = self.profile.id(),
            format = ?self.detected_format,
            scores = ?format_scores.iter().map(|s| (s.format, s.score)).collect::<Vec<_>>(),
            "Detected input format"
        );
        self.diagnostics.format_scores = format_scores;

        let expected: &[InputFormat] = match self.profile.layout() {
            Layout::Grammar(_) => &[InputFormat::Grammar, InputFormat::Preview],
            Layout::Positional(_) => &[InputFormat::Positional],
        };
        if let Some(detected) = self
            .detected_format
            .filter(|format| *format != InputFormat::Unknown && !expected.contains(format))
        {
            self.warnings.push(format!(
                "Input looks like {detected} text but profile {} expects {}",
                self.profile.id(),
                expected[0]
            ));
        }

        let candidates = self.run_strategy(&indexed_lines);
        let mut records = self.apply_policy(candidates);

        if self.options.merge_records {
            let before = records.len();
            records = merge_records(records);
            debug!(before, after = records.len(), "Merged time ranges");
        }

        self.warnings.extend(issue_warnings(&self.diagnostics.issues));
        info!(
            profile = self.profile.id(),
            records = records.len(),
            coverage = self.diagnostics.coverage(),
            issues = self.diagnostics.issues.len(),
            "Parsed timetable text"
        );
        records
    }

    fn run_strategy(&mut self, lines: &[IndexedLine]) -> Vec<Candidate> {
        let mut diagnostics = std::mem::take(&mut self.diagnostics);
        let candidates = match self.profile.layout() {
            Layout::Grammar(grammar) => {
                let fallback = self.profile.preview_fallback().then_some(PreviewStrategy);
                let strategy = GrammarStrategy::new(grammar, fallback);
                diagnostics.parsers_used.push(strategy.name().to_string());
                strategy.collect(lines, &mut diagnostics)
            }
            Layout::Positional(spec) => {
                let strategy = PositionalStrategy::new(spec, self.profile.calendar());
                diagnostics.parsers_used.push(strategy.name().to_string());
                strategy.collect(lines, &mut diagnostics)
            }
        };
        self.diagnostics = diagnostics;
        candidates
    }

    fn apply_policy(&mut self, candidates: Vec<Candidate>) -> Vec<CourseMeeting> {
        match self.profile.record_policy() {
            RecordPolicy::KeepPartial => candidates.into_iter().map(|c| c.record).collect(),
            RecordPolicy::DropIncomplete => {
                let mut kept = Vec::with_capacity(candidates.len());
                for candidate in candidates {
                    if candidate.record.is_complete() {
                        kept.push(candidate.record);
                    } else {
                        self.diagnostics.record(ParseIssue::new(
                            candidate.line,
                            IssueKind::DroppedByPolicy,
                            candidate.record.name,
                        ));
                    }
                }
                kept
            }
        }
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn detected_format(&self) -> Option<InputFormat> {
        self.detected_format
    }

    pub fn diagnostics(&self) -> &ParseDiagnostics {
        &self.diagnostics
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tkb_profiles::builtin;

    const DUT_ROW: &str = "6\t5070040.2420.24.99\tTiếng Nhật 2 (CNTT)\t1\t\t\tTrần Thị Kim Ngân\tThứ 2,4-5,C128; Thứ 4,4-5,C128; Thứ 6,4-5,C128\t29-44";
    const UFL_TWO_LINE: &str = "1\tCơ sở văn hóa Việt Nam\t2\tCơ sở văn hóa Việt Nam- 09\t\r\n16/09/2024- 29/12/2024\t3\t6-7\tDB303\tPhạm Thị Tú Trinh\r\n";

    fn dut() -> InstitutionProfile {
        InstitutionProfile::from_spec(builtin::dut_spec()).unwrap()
    }

    fn ufl() -> InstitutionProfile {
        InstitutionProfile::from_spec(builtin::ufl_spec()).unwrap()
    }

    #[test]
    fn test_empty_input_warns() {
        let profile = dut();
        let mut parser = ScheduleParser::new(&profile, "  \n\t ");
        assert!(parser.parse().is_empty());
        assert_eq!(parser.warnings(), ["Empty input".to_string()]);
        assert_eq!(parser.detected_format(), None);
    }

    #[test]
    fn test_grammar_profile_routes_to_grammar() {
        let profile = dut();
        let mut parser = ScheduleParser::new(&profile, DUT_ROW);
        let records = parser.parse();

        assert_eq!(records.len(), 1);
        assert_eq!(parser.detected_format(), Some(InputFormat::Grammar));
        assert_eq!(parser.diagnostics().parsers_used, vec!["grammar"]);
        assert!(parser.warnings().is_empty());
        assert!((parser.diagnostics().coverage() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_positional_profile_handles_crlf() {
        let profile = ufl();
        let mut parser = ScheduleParser::new(&profile, UFL_TWO_LINE);
        let records = parser.parse();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].meetings[0].room, "DB303");
        assert_eq!(parser.detected_format(), Some(InputFormat::Positional));
        assert_eq!(parser.diagnostics().parsers_used, vec!["positional"]);
    }

    #[test]
    fn test_layout_mismatch_warns() {
        let profile = ufl();
        let mut parser = ScheduleParser::new(&profile, DUT_ROW);
        assert!(parser.parse().is_empty());
        assert!(
            parser
                .warnings()
                .iter()
                .any(|w| w.starts_with("Input looks like grammar text"))
        );
    }

    #[test]
    fn test_keep_partial_policy_emits_blank_record() {
        let line = "6\t5070040\tTiếng Nhật 2 (CNTT)\t1\t\t\tTrần Thị Kim Ngân\tThứ 2,4-5,C128\t29-44";
        let profile = dut();
        let mut parser = ScheduleParser::new(&profile, line);
        let records = parser.parse();

        assert_eq!(records, vec![CourseMeeting::default()]);
        assert_eq!(parser.diagnostics().issues[0].kind, IssueKind::PartialMatch);
        assert_eq!(parser.warnings(), ["1 lines matched only partially".to_string()]);
    }

    #[test]
    fn test_merge_option_coalesces_ranges() {
        let text = "1\tNghe 1\t2\tNghe 1-01\n\
01/09/2024-30/10/2024\t2\t1-3\tA101\tGV A\n\
2\tNghe 1\t2\tNghe 1-01\n\
01/11/2024-29/12/2024\t2\t1-3\tB202\tGV A";
        let profile = ufl();

        let merged = ScheduleParser::new(&profile, text).parse();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].active_date_ranges.len(), 2);
        assert_eq!(
            merged[0].display_range_label.as_deref(),
            Some("01/09/24 - 29/12/24")
        );

        let separate = ScheduleParser::new(&profile, text)
            .with_options(ParseOptions::default())
            .parse();
        assert_eq!(separate.len(), 2);
    }

    #[test]
    fn test_options_default_from_profile() {
        assert!(ParseOptions::for_profile(&ufl()).merge_records);
        assert!(!ParseOptions::for_profile(&dut()).merge_records);
        let profile = dut();
        assert_eq!(ScheduleParser::new(&profile, "").options(), ParseOptions::default());
    }

    #[test]
    fn test_input_format_display_matches_serde() {
        for format in [
            InputFormat::Grammar,
            InputFormat::Preview,
            InputFormat::Positional,
            InputFormat::Unknown,
        ] {
            let json = serde_json::to_string(&format).unwrap();
            assert_eq!(json, format!("\"{format}\""));
        }
    }
}
