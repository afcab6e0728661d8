//! Semester calendars for date-range exports.
//!
//! Institutions that export absolute date ranges still need week numbers for
//! week-based filtering. A [`SemesterCalendar`] picks the anchor date that
//! week 1 starts on, from the year a range starts in and the physical layout
//! the course was exported with.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};

/// Number of physical lines a positional course occupies.
///
/// `TwoLine` courses carry one schedule tuple on the line after the course
/// info; `MultiDateRange` courses stack two tuples over 6 lines (plus an
/// optional trailing instructor line); `ThreeTimeline` courses stack three
/// tuples over 11 lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanFormat {
    TwoLine,
    MultiDateRange,
    ThreeTimeline,
}

impl SpanFormat {
    /// Number of schedule tuples the format carries.
    pub fn tuple_count(self) -> usize {
        match self {
            Self::TwoLine => 1,
            Self::MultiDateRange => 2,
            Self::ThreeTimeline => 3,
        }
    }

    /// Lines consumed after the course-info line.
    pub fn advance(self) -> usize {
        match self {
            Self::TwoLine => 1,
            Self::MultiDateRange => 5,
            Self::ThreeTimeline => 11,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TwoLine => "two_line",
            Self::MultiDateRange => "multi_date_range",
            Self::ThreeTimeline => "three_timeline",
        }
    }
}

impl std::fmt::Display for SpanFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anchor selection rule.
///
/// Matches when `year` is unset or equals the range's start year, and
/// `formats` is empty or contains the course's span format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<SpanFormat>,
    pub month: u32,
    pub day: u32,
}

impl AnchorRule {
    fn matches(&self, year: i32, format: SpanFormat) -> bool {
        self.year.is_none_or(|rule_year| rule_year == year)
            && (self.formats.is_empty() || self.formats.contains(&format))
    }
}

/// Ordered anchor rules plus a fallback month/day.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use tkb_profiles::{AnchorRule, SemesterCalendar, SpanFormat};
///
/// let calendar = SemesterCalendar {
///     rules: vec![AnchorRule { year: Some(2024), formats: vec![], month: 9, day: 1 }],
///     ..SemesterCalendar::default()
/// };
/// let start = NaiveDate::from_ymd_opt(2024, 9, 16).unwrap();
/// assert_eq!(
///     calendar.anchor_for(start, SpanFormat::TwoLine),
///     NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
/// );
///
/// let next_year = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
/// assert_eq!(
///     calendar.anchor_for(next_year, SpanFormat::TwoLine),
///     NaiveDate::from_ymd_opt(2025, 2, 3).unwrap()
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterCalendar {
    #[serde(default)]
    pub rules: Vec<AnchorRule>,
    #[serde(default = "default_fallback_month")]
    pub fallback_month: u32,
    #[serde(default = "default_fallback_day")]
    pub fallback_day: u32,
}

fn default_fallback_month() -> u32 {
    2
}

fn default_fallback_day() -> u32 {
    3
}

impl Default for SemesterCalendar {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            fallback_month: default_fallback_month(),
            fallback_day: default_fallback_day(),
        }
    }
}

impl SemesterCalendar {
    /// Week-1 anchor for a range starting on `start`, in `start`'s year.
    pub fn anchor_for(&self, start: NaiveDate, format: SpanFormat) -> NaiveDate {
        let year = start.year();
        let (month, day) = self
            .rules
            .iter()
            .find(|rule| rule.matches(year, format))
            .map_or((self.fallback_month, self.fallback_day), |rule| {
                (rule.month, rule.day)
            });

        NaiveDate::from_ymd_opt(year, month, day)
            .or_else(|| NaiveDate::from_ymd_opt(year, self.fallback_month, self.fallback_day))
            .unwrap_or(start)
    }

    /// Rejects month/day pairs that are not a date even in a leap year.
    pub fn validate(&self) -> Result<()> {
        let pairs = self
            .rules
            .iter()
            .map(|rule| (rule.month, rule.day))
            .chain(std::iter::once((self.fallback_month, self.fallback_day)));

        for (month, day) in pairs {
            if NaiveDate::from_ymd_opt(2024, month, day).is_none() {
                return Err(ProfileError::InvalidAnchor { month, day });
            }
        }
        Ok(())
    }
}
