//! Whole-line grammar strategy.
//!
//! One input line describes one course. The profile's grammar captures each
//! column by name; the first column that looks like a section identifier
//! anchors the row, and the four columns after it are read as name,
//! instructor, schedule and week ranges. Leading sequence/identifier columns
//! are optional in the export, which is why the anchor is searched for
//! rather than fixed.

use std::str::FromStr;

use regex::Captures;
use tkb_core::{CourseMeeting, Meeting, SUNDAY, WeekRange};
use tkb_profiles::Grammar;
use tracing::debug;

use super::preview::PreviewStrategy;
use super::{Candidate, ParserStrategy};
use crate::parser::diagnostics::{IssueKind, ParseIssue};
use crate::parser::{IndexedLine, ParseDiagnostics};

/// Outcome of matching one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarMatch {
    /// Whole-line pattern did not match.
    NoMatch,
    /// Line matched but no anchor was found, or no slot/week decoded.
    Partial(CourseMeeting),
    /// Record with at least one meeting and one week range.
    Complete(CourseMeeting),
}

/// Matches one line against `grammar`.
///
/// Undecodable schedule or week tokens are skipped. A slot token without a
/// weekday group (the "Chủ nhật" spelling) is a Sunday.
pub fn match_line(grammar: &Grammar, line: &str) -> GrammarMatch {
    let Some(caps) = grammar.line().captures(line) else {
        return GrammarMatch::NoMatch;
    };

    let values: Vec<Option<&str>> = grammar
        .columns()
        .iter()
        .map(|column| caps.name(column).map(|m| m.as_str()))
        .collect();

    let Some(anchor) = values
        .iter()
        .position(|value| value.is_some_and(|text| grammar.identifier().is_match(text)))
    else {
        return GrammarMatch::Partial(CourseMeeting::default());
    };

    let field = |offset: usize| {
        values
            .get(anchor + offset)
            .copied()
            .flatten()
            .unwrap_or_default()
    };

    let mut record = CourseMeeting::new(field(0), field(1), field(2));

    for token in grammar.date_token_splitter().find_iter(field(3)) {
        let Some(slot) = grammar.single_date_token().captures(token.as_str()) else {
            continue;
        };
        let weekday = match slot.name("weekday") {
            Some(day) => match day.as_str().parse::<u8>() {
                Ok(day) => day,
                Err(_) => continue,
            },
            None => SUNDAY,
        };
        let (Some(start), Some(end), Some(room)) = (
            number(&slot, "start"),
            number(&slot, "end"),
            slot.name("room"),
        ) else {
            continue;
        };
        record
            .meetings
            .push(Meeting::new(weekday, room.as_str().trim(), start, end));
    }

    for piece in field(4).split(';') {
        let Some(range) = grammar.week_range_token().captures(piece) else {
            continue;
        };
        if let (Some(from), Some(to)) = (number(&range, "from"), number(&range, "to")) {
            record.active_weeks.push(WeekRange::new(from, to));
        }
    }

    if record.meetings.is_empty() || record.active_weeks.is_empty() {
        GrammarMatch::Partial(record)
    } else {
        GrammarMatch::Complete(record)
    }
}

/// Parses a named group that may not have participated in the match.
fn number<T: FromStr>(caps: &Captures<'_>, group: &str) -> Option<T> {
    caps.name(group)?.as_str().parse().ok()
}

/// Line-by-line grammar matching, with rejected lines optionally retried in
/// preview mode.
pub struct GrammarStrategy<'a> {
    grammar: &'a Grammar,
    fallback: Option<PreviewStrategy>,
}

impl<'a> GrammarStrategy<'a> {
    pub fn new(grammar: &'a Grammar, fallback: Option<PreviewStrategy>) -> Self {
        Self { grammar, fallback }
    }
}

impl ParserStrategy for GrammarStrategy<'_> {
    fn name(&self) -> &'static str {
        "grammar"
    }

    fn collect(&self, lines: &[IndexedLine], diagnostics: &mut ParseDiagnostics) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        let mut rejected = Vec::new();

        for line in lines {
            if line.text.trim().is_empty() {
                continue;
            }
            match match_line(self.grammar, &line.text) {
                GrammarMatch::Complete(record) => {
                    diagnostics.relevant_lines += 1;
                    diagnostics.recognized_lines += 1;
                    candidates.push(Candidate {
                        line: line.index + 1,
                        record,
                    });
                }
                GrammarMatch::Partial(record) => {
                    diagnostics.relevant_lines += 1;
                    diagnostics.record(ParseIssue::new(
                        line.index + 1,
                        IssueKind::PartialMatch,
                        line.text.trim(),
                    ));
                    candidates.push(Candidate {
                        line: line.index + 1,
                        record,
                    });
                }
                GrammarMatch::NoMatch => rejected.push(line.clone()),
            }
        }

        if rejected.is_empty() {
            return candidates;
        }

        match &self.fallback {
            Some(preview) => {
                debug!(lines = rejected.len(), "retrying unmatched lines in preview mode");
                let recovered = preview.collect(&rejected, diagnostics);
                if !recovered.is_empty() {
                    diagnostics.parsers_used.push(preview.name().to_string());
                }
                candidates.extend(recovered);
                candidates.sort_by_key(|candidate| candidate.line);
            }
            None => {
                for line in rejected {
                    diagnostics.relevant_lines += 1;
                    diagnostics.record(ParseIssue::new(
                        line.index + 1,
                        IssueKind::NoMatch,
                        line.text.trim(),
                    ));
                }
            }
        }

        candidates
    }
}
