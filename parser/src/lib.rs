//! Multi-format parsing of copy-pasted university timetables.
//!
//! This crate turns the text students paste from their portal's timetable
//! page into [`CourseMeeting`] records. Which layout it expects is decided by
//! the [`InstitutionProfile`]: single-line grammar exports (with a
//! registration-preview fallback) or multi-line positional exports with
//! absolute date ranges.
//!
//! # Main entry points
//!
//! - [`parse_schedule_text`]: parse with the profile's default options.
//! - [`parse_schedule_text_with_options`]: same, with explicit
//!   [`ParseOptions`].
//! - [`parse_schedule_text_with_report`]: same, plus a [`ParseReport`] with
//!   coverage, per-line issues and record validation.
//!
//! # Example
//!
//! ```
//! use tkb_parser::parse_schedule_text;
//! use tkb_profiles::ProfileRegistry;
//!
//! let registry = ProfileRegistry::builtin().unwrap();
//! let dut = registry.require("dut").unwrap();
//!
//! let text = "6\t5070040.2420.24.99\tTiếng Nhật 2 (CNTT)\t1\t\t\tTrần Thị Kim Ngân\tThứ 2,4-5,C128; Thứ 4,4-5,C128\t29-44";
//! let result = parse_schedule_text(dut, text);
//! assert!(result.success());
//! assert_eq!(result.records[0].meetings.len(), 2);
//! assert_eq!(result.records[0].active_weeks[0].to, 44);
//! ```
//!
//! [`CourseMeeting`]: tkb_core::CourseMeeting

pub mod output;
pub mod parser;
pub mod report;

use tkb_core::validate_records;
use tkb_profiles::InstitutionProfile;

pub use parser::{
    FormatScore, InputFormat, ParseDiagnostics, ParseOptions, ParseResult, ScheduleParser,
};
use report::{FailureCode, ParseReport};

/// Result and report of one parse run.
#[derive(Debug, Clone)]
pub struct ParseRun {
    pub result: ParseResult,
    pub report: ParseReport,
}

/// Parses pasted timetable text with the profile's default options.
///
/// Never fails; unusable lines are reported through
/// [`ParseResult::warnings`].
pub fn parse_schedule_text(profile: &InstitutionProfile, input: &str) -> ParseResult {
    parse_schedule_text_with_options(profile, input, ParseOptions::for_profile(profile))
}

/// Parses pasted timetable text with explicit options.
pub fn parse_schedule_text_with_options(
    profile: &InstitutionProfile,
    input: &str,
    options: ParseOptions,
) -> ParseResult {
    let mut parser = ScheduleParser::new(profile, input).with_options(options);
    let records = parser.parse();

    ParseResult {
        profile: profile.id().to_string(),
        records,
        detected_format: parser.detected_format(),
        warnings: parser.warnings().to_vec(),
    }
}

/// Parses pasted timetable text and builds a [`ParseReport`].
///
/// Records are also checked against the profile's lesson catalog; findings
/// go to [`ParseReport::validation_errors`] and do not remove records.
///
/// # Examples
///
/// ```
/// use tkb_parser::{ParseOptions, parse_schedule_text_with_report};
/// use tkb_profiles::ProfileRegistry;
///
/// let registry = ProfileRegistry::builtin().unwrap();
/// let ufl = registry.require("ufl").unwrap();
///
/// let text = "1\tCơ sở văn hóa Việt Nam\t2\tCơ sở văn hóa Việt Nam- 09\t\n16/09/2024- 29/12/2024\t3\t6-7\tDB303\tPhạm Thị Tú Trinh";
/// let run = parse_schedule_text_with_report(ufl, text, ParseOptions::for_profile(ufl));
/// assert!(run.report.success);
/// assert_eq!(run.report.selected_format.as_deref(), Some("positional"));
/// assert_eq!(run.result.records[0].active_weeks[0].from, 3);
/// ```
pub fn parse_schedule_text_with_report(
    profile: &InstitutionProfile,
    input: &str,
    options: ParseOptions,
) -> ParseRun {
    let mut parser = ScheduleParser::new(profile, input).with_options(options);
    let records = parser.parse();
    let warnings = parser.warnings().to_vec();
    let detected_format = parser.detected_format();

    let (success, failure_code) = if input.trim().is_empty() {
        (false, Some(FailureCode::EmptyInput))
    } else if records.is_empty() {
        (false, Some(FailureCode::NoRecords))
    } else {
        (true, None)
    };

    let validation_errors = validate_records(&records, profile.lessons().max_lesson())
        .into_iter()
        .map(|(index, error)| format!("record {index}: {error}"))
        .collect();

    let mut report = ParseReport::from_diagnostics(profile.id(), parser.diagnostics());
    report.success = success;
    report.failure_code = failure_code;
    report.record_count = records.len();
    report.merged = options.merge_records;
    report.warnings = warnings.clone();
    report.validation_errors = validation_errors;

    ParseRun {
        result: ParseResult {
            profile: profile.id().to_string(),
            records,
            detected_format,
            warnings,
        },
        report,
    }
}
