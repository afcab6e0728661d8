//! Core record types for parsed timetable text.
//!
//! This crate defines the data every timetable parser in the workspace
//! produces, plus the pure operations callers run on it:
//!
//! - [`CourseMeeting`]: one course with its [`Meeting`]s (weekday, room,
//!   lesson-slot range) and active period ([`WeekRange`]s and/or raw date
//!   ranges).
//! - [`merge_records`]: coalesces records that differ only in their active
//!   period, as emitted by date-range exports.
//! - [`validate_record`]: reports structural problems such as reversed slot
//!   ranges without rewriting the record.
//! - Date-range helpers ([`parse_date_range`], [`week_number`],
//!   [`spanning_label`]).
//!
//! # Example
//!
//! ```
//! use tkb_core::*;
//!
//! let mut course = CourseMeeting::new("5070040.2420.24.99", "Tiếng Nhật 2 (CNTT)", "Trần Thị Kim Ngân");
//! course.meetings.push(Meeting::new(2, "C128", 4, 5));
//! course.meetings.push(Meeting::new(8, "C128", 1, 2));
//! course.active_weeks.push(WeekRange::new(29, 44));
//!
//! assert_eq!(weekday_label(course.meetings[1].weekday), "Chủ nhật");
//! assert!(validate_record(&course, 14).is_empty());
//! ```

mod dates;
mod merge;
mod types;
mod validate;

pub use dates::{DateSpan, parse_date_range, spanning_label, week_number};
pub use merge::merge_records;
pub use types::*;
pub use validate::{ValidationError, validate_record, validate_records};
