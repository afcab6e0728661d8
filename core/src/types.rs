//! Record type definitions for parsed timetable text.
//!
//! Every parser in the workspace emits [`CourseMeeting`] values. The types
//! derive [`serde`] traits so they can be written as JSON/YAML and persisted
//! by a host application (for example as user-defined custom courses).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::parse_date_range;

/// Weekday number used for Sunday.
///
/// Weekdays follow the Vietnamese numbering: `2` is Monday ("Thứ 2") through
/// `7` for Saturday ("Thứ 7"), and Sunday ("Chủ nhật") is `8`.
pub const SUNDAY: u8 = 8;

/// First valid weekday number (Monday).
pub const MONDAY: u8 = 2;

/// Placeholder used when an export row carries no instructor.
pub const UNKNOWN_INSTRUCTOR: &str = "Chưa xác định";

/// Returns the display label for a weekday number.
///
/// # Examples
///
/// ```
/// use tkb_core::weekday_label;
///
/// assert_eq!(weekday_label(2), "Thứ 2");
/// assert_eq!(weekday_label(8), "Chủ nhật");
/// ```
pub fn weekday_label(weekday: u8) -> String {
    if weekday == SUNDAY {
        "Chủ nhật".to_string()
    } else {
        format!("Thứ {weekday}")
    }
}

/// One weekday/lesson-slot/room occurrence of a course.
///
/// # Examples
///
/// ```
/// use tkb_core::Meeting;
///
/// let meeting = Meeting::new(2, "C128", 4, 5);
/// assert!(meeting.covers(2, 4));
/// assert!(meeting.covers(2, 5));
/// assert!(!meeting.covers(3, 4));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Meeting {
    /// Weekday number (2 = Monday … 7 = Saturday, 8 = Sunday).
    pub weekday: u8,
    /// Room code as written in the export (may be empty).
    pub room: String,
    /// First lesson slot (inclusive).
    pub lesson_start: u32,
    /// Last lesson slot (inclusive).
    pub lesson_end: u32,
}

impl Meeting {
    /// Creates a meeting.
    pub fn new(weekday: u8, room: &str, lesson_start: u32, lesson_end: u32) -> Self {
        Self {
            weekday,
            room: room.to_string(),
            lesson_start,
            lesson_end,
        }
    }

    /// Returns true when this meeting occupies `lesson` on `weekday`.
    ///
    /// A reversed slot range (`lesson_start > lesson_end`) covers nothing.
    pub fn covers(&self, weekday: u8, lesson: u32) -> bool {
        self.weekday == weekday && self.lesson_start <= lesson && lesson <= self.lesson_end
    }

    /// The `(weekday, start, end)` tuple used as a merge key.
    pub fn time_key(&self) -> (u8, u32, u32) {
        (self.weekday, self.lesson_start, self.lesson_end)
    }
}

/// Inclusive range of academic week numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekRange {
    pub from: u32,
    pub to: u32,
}

impl WeekRange {
    /// Creates a week range.
    pub fn new(from: u32, to: u32) -> Self {
        Self { from, to }
    }

    /// Returns true when `week` lies inside the range.
    pub fn contains(&self, week: u32) -> bool {
        self.from <= week && week <= self.to
    }
}

impl Default for WeekRange {
    /// The full-semester range used when a date range cannot be decoded.
    fn default() -> Self {
        Self { from: 1, to: 16 }
    }
}

/// A parsed course with its meetings and active period.
///
/// Grammar-based institutions fill [`active_weeks`](Self::active_weeks);
/// date-range-native institutions fill
/// [`active_date_ranges`](Self::active_date_ranges) and also carry the
/// derived week numbers.
///
/// # Examples
///
/// ```
/// use tkb_core::{CourseMeeting, Meeting, WeekRange};
///
/// let mut course = CourseMeeting::new("5070040.2420.24.99", "Tiếng Nhật 2 (CNTT)", "Trần Thị Kim Ngân");
/// course.meetings.push(Meeting::new(2, "C128", 4, 5));
/// course.active_weeks.push(WeekRange::new(29, 44));
///
/// assert!(course.is_active_in_week(30));
/// assert!(!course.is_active_in_week(45));
/// assert_eq!(course.meetings_at(2, 5).count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CourseMeeting {
    /// Course/section identifier.
    pub id: String,
    /// Course title.
    pub name: String,
    /// Instructor, or [`UNKNOWN_INSTRUCTOR`] when the export had none.
    pub instructor: String,
    /// Weekday/slot/room occurrences, in input order.
    #[serde(default)]
    pub meetings: Vec<Meeting>,
    /// Active week ranges relative to the semester start.
    #[serde(default)]
    pub active_weeks: Vec<WeekRange>,
    /// Raw `dd/mm/yyyy - dd/mm/yyyy` strings from date-range exports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_date_ranges: Vec<String>,
    /// Human-readable label for the active date range(s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_range_label: Option<String>,
}

impl CourseMeeting {
    /// Creates a record without meetings or active periods.
    pub fn new(id: &str, name: &str, instructor: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            instructor: instructor.to_string(),
            ..Self::default()
        }
    }

    /// Returns true when the record has meetings and some active period.
    pub fn is_complete(&self) -> bool {
        !self.meetings.is_empty()
            && (!self.active_weeks.is_empty() || !self.active_date_ranges.is_empty())
    }

    /// Returns true when any week range contains `week`.
    pub fn is_active_in_week(&self, week: u32) -> bool {
        self.active_weeks.iter().any(|range| range.contains(week))
    }

    /// Returns true when any decodable date range contains `date`.
    ///
    /// Records without date ranges are never active on a specific date.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.active_date_ranges
            .iter()
            .filter_map(|raw| parse_date_range(raw))
            .any(|span| span.contains(date))
    }

    /// Iterates the meetings that occupy `lesson` on `weekday`.
    pub fn meetings_at(&self, weekday: u8, lesson: u32) -> impl Iterator<Item = &Meeting> {
        self.meetings
            .iter()
            .filter(move |meeting| meeting.covers(weekday, lesson))
    }
}
