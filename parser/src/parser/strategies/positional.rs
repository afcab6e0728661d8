//! Positional multi-line strategy.
//!
//! Date-range exports spread one course over several physical lines. The
//! course-info line starts with `<seq>\t`; the lines after it carry one, two
//! or three stacked `(date range, weekday, lessons, room, instructor)` tuples
//! in a fixed diagonal layout:
//!
//! ```text
//! 1  Cơ sở văn hóa Việt Nam  2  Cơ sở văn hóa Việt Nam- 09
//! 16/09/2024- 29/12/2024  3  6-7  DB303  Phạm Thị Tú Trinh
//! ```
//!
//! Stacked formats shift every field one line down per tuple, so tuple `j` of
//! field `f` sits on line `1 + f*(k-1) + j` of a `k`-tuple span.

use std::sync::LazyLock;

use regex::Regex;
use tkb_core::{CourseMeeting, Meeting, parse_date_range};
use tkb_profiles::{PositionalSpec, SemesterCalendar, SpanFormat};
use tracing::{debug, warn};

use super::{Candidate, ParserStrategy};
use crate::parser::diagnostics::{IssueKind, ParseIssue};
use crate::parser::{IndexedLine, ParseDiagnostics};

static COURSE_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\t").expect("static regex must compile"));
static LESSONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-(\d+)$").expect("static regex must compile"));

const DATE: usize = 0;
const WEEKDAY: usize = 1;
const LESSONS: usize = 2;
const ROOM: usize = 3;
const INSTRUCTOR: usize = 4;

/// Columns a course-info line needs (seq, name, credits, id).
const COURSE_COLUMNS: usize = 4;
/// Lines inspected when classifying a span.
const LOOKAHEAD: usize = 4;
/// Next-line length at or below which a span is treated as stacked.
const SHORT_LINE: usize = 30;

/// Returns true for a `<digits>\t` line with enough columns to be a course.
///
/// Stacked weekday/lesson lines such as `3\t1-5` share the prefix but have
/// only two columns.
pub fn is_course_start(line: &str) -> bool {
    COURSE_START_RE.is_match(line) && line.split('\t').count() >= COURSE_COLUMNS
}

fn is_date_shaped(line: &str) -> bool {
    line.contains('/') && line.contains('-')
}

fn is_bare_url(line: &str) -> bool {
    (line.starts_with("http://") || line.starts_with("https://") || line.starts_with("www."))
        && !line.contains(char::is_whitespace)
}

/// Picks the span format for the course starting at `lines[start]`.
pub fn classify_span(lines: &[&str], start: usize) -> SpanFormat {
    let date_lines = lines
        .iter()
        .skip(start + 1)
        .take(LOOKAHEAD)
        .take_while(|line| !is_course_start(line) && is_date_shaped(line))
        .count();

    let stacked_hint = lines.get(start + 1).is_some_and(|next| {
        !next.contains('\t') && (next.contains('/') || next.chars().count() <= SHORT_LINE)
    });

    if date_lines >= 3 {
        SpanFormat::ThreeTimeline
    } else if date_lines >= 2 || stacked_hint {
        SpanFormat::MultiDateRange
    } else {
        SpanFormat::TwoLine
    }
}

/// Whole-blob parser for positional date-range exports.
pub struct PositionalStrategy<'a> {
    spec: &'a PositionalSpec,
    calendar: &'a SemesterCalendar,
}

impl<'a> PositionalStrategy<'a> {
    pub fn new(spec: &'a PositionalSpec, calendar: &'a SemesterCalendar) -> Self {
        Self { spec, calendar }
    }

    fn is_noise(&self, line: &str) -> bool {
        self.spec.noise_tokens.iter().any(|token| token == line) || is_bare_url(line)
    }

    /// Returns true for a line that can only be a bare instructor cell.
    fn is_instructor_cell(&self, line: &str) -> bool {
        !line.contains('\t')
            && !line.contains(':')
            && !is_date_shaped(line)
            && !is_course_start(line)
            && !self.is_noise(line)
    }

    /// Exclusive end of the span starting at `start`.
    ///
    /// The window never swallows the next course-info line. A stacked
    /// two-tuple span also takes its optional trailing instructor line when
    /// the line after the window is a bare instructor cell.
    fn span_end(&self, lines: &[&str], start: usize, format: SpanFormat) -> usize {
        let window = start + 1 + format.advance();
        let mut end = (start + 1..window.min(lines.len()))
            .find(|&index| is_course_start(lines[index]))
            .unwrap_or(window.min(lines.len()));

        if window > lines.len() && end == lines.len() {
            warn!(
                line = start + 1,
                format = %format,
                "course span truncated by end of input"
            );
        }

        if format == SpanFormat::MultiDateRange
            && end == window
            && lines.get(end).is_some_and(|line| self.is_instructor_cell(line))
        {
            end += 1;
        }
        end
    }

    /// Decodes the span `start..end` into records, one per valid tuple.
    fn decode_span(
        &self,
        rows: &[(usize, &str)],
        start: usize,
        end: usize,
        format: SpanFormat,
        diagnostics: &mut ParseDiagnostics,
    ) -> Vec<CourseMeeting> {
        let columns: Vec<&str> = rows[start].1.split('\t').map(str::trim).collect();
        let name = columns.get(1).copied().unwrap_or_default();
        let id = match columns.get(3).copied().unwrap_or_default() {
            "" => name,
            id => id,
        };

        let tuples = format.tuple_count();
        let cell = |field: usize, tuple: usize| {
            let offset = 1 + field * (tuples - 1) + tuple;
            let column = if tuples == 1 {
                field
            } else if tuple == 0 && field > 0 {
                1
            } else {
                0
            };
            let index = start + offset;
            if index >= end {
                return None;
            }
            rows[index].1.split('\t').nth(column).map(str::trim)
        };

        let mut records: Vec<CourseMeeting> = Vec::new();
        for tuple in 0..tuples {
            let weekday = cell(WEEKDAY, tuple);
            let lessons = cell(LESSONS, tuple);
            if weekday.is_none() && lessons.is_none() {
                continue;
            }

            let weekday = weekday
                .and_then(|raw| raw.parse::<u8>().ok())
                .filter(|day| (2..=7).contains(day));
            let lessons = lessons.and_then(|raw| LESSONS_RE.captures(raw)).and_then(|caps| {
                Some((caps[1].parse::<u32>().ok()?, caps[2].parse::<u32>().ok()?))
            });
            let (Some(weekday), Some((lesson_start, lesson_end))) = (weekday, lessons) else {
                let line = rows[(start + 1 + tuple).min(end - 1)].0 + 1;
                diagnostics.record(ParseIssue::new(
                    line,
                    IssueKind::InvalidSchedule,
                    format!(
                        "{name}: weekday {:?}, lessons {:?}",
                        cell(WEEKDAY, tuple).unwrap_or_default(),
                        cell(LESSONS, tuple).unwrap_or_default()
                    ),
                ));
                continue;
            };

            let instructor = match cell(INSTRUCTOR, tuple) {
                Some(instructor) if !instructor.is_empty() => instructor,
                _ => self.spec.unknown_instructor.as_str(),
            };
            let mut record = CourseMeeting::new(id, name, instructor);
            record.meetings.push(Meeting::new(
                weekday,
                cell(ROOM, tuple).unwrap_or_default(),
                lesson_start,
                lesson_end,
            ));

            let raw_range = cell(DATE, tuple).unwrap_or_default();
            match parse_date_range(raw_range) {
                Some(span) => {
                    let anchor = self.calendar.anchor_for(span.start, format);
                    record.active_weeks.push(span.weeks_from(anchor));
                    record.active_date_ranges.push(raw_range.to_string());
                    record.display_range_label = Some(span.label());
                }
                None => {
                    record.active_weeks.push(self.spec.fallback_weeks);
                    diagnostics.record(ParseIssue::new(
                        rows[(start + 1 + tuple).min(end - 1)].0 + 1,
                        IssueKind::MalformedDateRange,
                        raw_range,
                    ));
                }
            }

            if !records.contains(&record) {
                records.push(record);
            }
        }
        records
    }
}

impl ParserStrategy for PositionalStrategy<'_> {
    fn name(&self) -> &'static str {
        "positional"
    }

    fn collect(&self, lines: &[IndexedLine], diagnostics: &mut ParseDiagnostics) -> Vec<Candidate> {
        let rows: Vec<(usize, &str)> = lines
            .iter()
            .map(|line| (line.index, line.text.trim()))
            .filter(|(_, text)| !text.is_empty() && !self.is_noise(text))
            .collect();
        diagnostics.relevant_lines += rows.len();
        if rows.len() < 2 {
            return Vec::new();
        }

        let texts: Vec<&str> = rows.iter().map(|(_, text)| *text).collect();
        let mut candidates = Vec::new();
        let mut cursor = 0;

        while cursor < rows.len() {
            if !is_course_start(texts[cursor]) {
                diagnostics.record(ParseIssue::new(
                    rows[cursor].0 + 1,
                    IssueKind::NoMatch,
                    texts[cursor],
                ));
                cursor += 1;
                continue;
            }

            let format = classify_span(&texts, cursor);
            let end = self.span_end(&texts, cursor, format);
            debug!(
                line = rows[cursor].0 + 1,
                format = %format,
                lines = end - cursor,
                "classified course span"
            );

            let issues_before = diagnostics.issues.len();
            let records = self.decode_span(&rows, cursor, end, format, diagnostics);
            if records.is_empty() {
                if diagnostics.issues.len() == issues_before {
                    diagnostics.record(ParseIssue::new(
                        rows[cursor].0 + 1,
                        IssueKind::NoMatch,
                        texts[cursor],
                    ));
                }
            } else {
                diagnostics.recognized_lines += end - cursor;
            }

            candidates.extend(records.into_iter().map(|record| Candidate {
                line: rows[cursor].0 + 1,
                record,
            }));
            cursor = end;
        }

        candidates
    }
}
