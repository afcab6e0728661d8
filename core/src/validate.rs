//! Record validation.
//!
//! The parsers accept whatever shape the export text has; a reversed slot
//! range such as `10-9` is kept as written. Validation reports those records
//! so a caller can decide what to show, without rewriting them.
//!
//! # Examples
//!
//! ```
//! use tkb_core::*;
//!
//! let mut record = CourseMeeting::new("x", "Course", "Teacher");
//! record.meetings.push(Meeting::new(2, "C128", 4, 5));
//! record.active_weeks.push(WeekRange::new(1, 16));
//! assert!(validate_record(&record, 14).is_empty());
//!
//! record.meetings.push(Meeting::new(3, "C128", 10, 9));
//! let errors = validate_record(&record, 14);
//! assert!(errors.contains(&ValidationError::LessonOrder { start: 10, end: 9 }));
//! ```

use thiserror::Error;

use crate::types::{CourseMeeting, MONDAY, SUNDAY};

/// Structural problems found in a parsed record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Course name is empty or whitespace-only.
    #[error("course name cannot be empty")]
    EmptyName,
    /// Record carries no meetings.
    #[error("course has no meetings")]
    NoMeetings,
    /// Record carries neither week ranges nor date ranges.
    #[error("course has no active weeks or date ranges")]
    NoActivePeriod,
    /// Weekday outside 2..=8.
    #[error("weekday out of range: {0}")]
    WeekdayOutOfRange(u8),
    /// Meeting starts after it ends.
    #[error("lesson start {start} is after lesson end {end}")]
    LessonOrder { start: u32, end: u32 },
    /// Lesson number outside the institution's catalog.
    #[error("lesson {lesson} outside catalog 1..={max}")]
    LessonOutOfRange { lesson: u32, max: u32 },
    /// Week range starts after it ends.
    #[error("week range {from}-{to} is reversed")]
    ReversedWeekRange { from: u32, to: u32 },
}

/// Validates one record against a lesson catalog of `max_lesson` slots.
pub fn validate_record(record: &CourseMeeting, max_lesson: u32) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if record.name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }
    if record.meetings.is_empty() {
        errors.push(ValidationError::NoMeetings);
    }
    if record.active_weeks.is_empty() && record.active_date_ranges.is_empty() {
        errors.push(ValidationError::NoActivePeriod);
    }

    for meeting in &record.meetings {
        if !(MONDAY..=SUNDAY).contains(&meeting.weekday) {
            errors.push(ValidationError::WeekdayOutOfRange(meeting.weekday));
        }
        if meeting.lesson_start > meeting.lesson_end {
            errors.push(ValidationError::LessonOrder {
                start: meeting.lesson_start,
                end: meeting.lesson_end,
            });
        }
        for lesson in [meeting.lesson_start, meeting.lesson_end] {
            if lesson == 0 || lesson > max_lesson {
                errors.push(ValidationError::LessonOutOfRange {
                    lesson,
                    max: max_lesson,
                });
            }
        }
    }

    for weeks in &record.active_weeks {
        if weeks.from > weeks.to {
            errors.push(ValidationError::ReversedWeekRange {
                from: weeks.from,
                to: weeks.to,
            });
        }
    }

    errors
}

/// Validates every record, pairing each error with the record's position.
pub fn validate_records(
    records: &[CourseMeeting],
    max_lesson: u32,
) -> Vec<(usize, ValidationError)> {
    records
        .iter()
        .enumerate()
        .flat_map(|(idx, record)| {
            validate_record(record, max_lesson)
                .into_iter()
                .map(move |err| (idx, err))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Meeting, WeekRange};

    fn valid() -> CourseMeeting {
        let mut record = CourseMeeting::new("5070040.2420.24.99", "Tiếng Nhật 2", "Teacher");
        record.meetings.push(Meeting::new(2, "C128", 4, 5));
        record.active_weeks.push(WeekRange::new(29, 44));
        record
    }

    #[test]
    fn test_blank_record_reports_every_gap() {
        let errors = validate_record(&CourseMeeting::default(), 14);
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyName,
                ValidationError::NoMeetings,
                ValidationError::NoActivePeriod,
            ]
        );
    }

    #[test]
    fn test_sunday_is_a_valid_weekday() {
        let mut record = valid();
        record.meetings[0].weekday = 8;
        assert!(validate_record(&record, 14).is_empty());

        record.meetings[0].weekday = 1;
        assert_eq!(
            validate_record(&record, 14),
            vec![ValidationError::WeekdayOutOfRange(1)]
        );
    }

    #[test]
    fn test_lessons_outside_catalog() {
        let mut record = valid();
        record.meetings[0].lesson_end = 15;
        assert_eq!(
            validate_record(&record, 14),
            vec![ValidationError::LessonOutOfRange { lesson: 15, max: 14 }]
        );
    }

    #[test]
    fn test_validate_records_keeps_positions() {
        let mut reversed = valid();
        reversed.active_weeks[0] = WeekRange::new(10, 2);
        let errors = validate_records(&[valid(), reversed], 14);
        assert_eq!(
            errors,
            vec![(1, ValidationError::ReversedWeekRange { from: 10, to: 2 })]
        );
    }
}
