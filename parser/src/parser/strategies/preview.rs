//! Preview-mode strategy.
//!
//! The portal's registration preview renders schedules as `Thứ 6: 1-2,F207`,
//! with follow-up slots of the same row abbreviated to `4: 7-8,C128`:
//!
//! ```text
//! 1  2090160.2520.24.16  Chủ nghĩa Xã hội khoa học  2  Trương Thị Thu Hiền  Thứ 6: 1-2,F207  22-27;31-40
//! ```

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tkb_core::{CourseMeeting, Meeting, SUNDAY, WeekRange};

use super::{Candidate, ParserStrategy};
use crate::parser::diagnostics::{IssueKind, ParseIssue};
use crate::parser::{IndexedLine, ParseDiagnostics};

static FULL_SLOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<day>Thứ \d|Chủ nhật):\s*(?P<start>\d+)-(?P<end>\d+),(?P<room>[^;]+)")
        .expect("static regex must compile")
});
static SHORT_SLOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<day>\d):\s*(?P<start>\d+)-(?P<end>\d+),(?P<room>[^;]+)")
        .expect("static regex must compile")
});
static WEEK_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)-(\d+)").expect("static regex must compile"));

const MIN_COLUMNS: usize = 7;

pub struct PreviewStrategy;

impl PreviewStrategy {
    /// Decodes one preview row.
    ///
    /// Returns `None` unless the row has at least 7 columns, non-empty name,
    /// instructor, schedule and weeks, and at least one slot and one week
    /// range decode.
    pub fn parse_line(&self, line: &str) -> Option<CourseMeeting> {
        let columns: Vec<&str> = line.trim().split('\t').map(str::trim).collect();
        if columns.len() < MIN_COLUMNS {
            return None;
        }

        let (id, name, instructor, schedule, weeks) =
            (columns[1], columns[2], columns[4], columns[5], columns[6]);
        if [name, instructor, schedule, weeks].iter().any(|value| value.is_empty()) {
            return None;
        }

        let mut record = CourseMeeting::new(id, name, instructor);
        record.meetings = schedule.split(';').filter_map(decode_slot).collect();
        record.active_weeks = weeks
            .split(';')
            .filter_map(|piece| {
                let caps = WEEK_RANGE_RE.captures(piece)?;
                Some(WeekRange::new(caps[1].parse().ok()?, caps[2].parse().ok()?))
            })
            .collect();

        record.is_complete().then_some(record)
    }
}

fn decode_slot(slot: &str) -> Option<Meeting> {
    if let Some(caps) = FULL_SLOT_RE.captures(slot) {
        let weekday = match caps["day"].strip_prefix("Thứ ") {
            Some(digit) => digit.parse().ok().filter(|day| (2..=7).contains(day)),
            None => None,
        };
        return meeting(&caps, weekday.unwrap_or(SUNDAY));
    }

    let caps = SHORT_SLOT_RE.captures(slot)?;
    let weekday = caps["day"].parse().ok()?;
    meeting(&caps, weekday)
}

fn meeting(caps: &Captures<'_>, weekday: u8) -> Option<Meeting> {
    Some(Meeting::new(
        weekday,
        caps["room"].trim(),
        caps["start"].parse().ok()?,
        caps["end"].parse().ok()?,
    ))
}

impl ParserStrategy for PreviewStrategy {
    fn name(&self) -> &'static str {
        "preview"
    }

    fn collect(&self, lines: &[IndexedLine], diagnostics: &mut ParseDiagnostics) -> Vec<Candidate> {
        let mut candidates = Vec::new();
        for line in lines {
            if line.text.trim().is_empty() {
                continue;
            }
            diagnostics.relevant_lines += 1;

            match self.parse_line(&line.text) {
                Some(record) => {
                    diagnostics.recognized_lines += 1;
                    candidates.push(Candidate {
                        line: line.index + 1,
                        record,
                    });
                }
                None => diagnostics.record(ParseIssue::new(
                    line.index + 1,
                    IssueKind::NoMatch,
                    line.text.trim(),
                )),
            }
        }
        candidates
    }
}
