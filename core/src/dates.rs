//! Calendar date-range helpers.
//!
//! Date-range exports write periods as `dd/mm/yyyy-dd/mm/yyyy`, with optional
//! whitespace around the dash. These helpers decode them, format the short
//! `dd/mm/yy` labels shown to users, and convert them to relative week numbers.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::types::WeekRange;

static DATE_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}/\d{2}/\d{4})\s*-\s*(\d{2}/\d{2}/\d{4})").expect("static regex must compile")
});

/// Decoded calendar period (inclusive on both ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    /// Returns true when `date` lies inside the span.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Short `dd/mm/yy - dd/mm/yy` label.
    ///
    /// # Examples
    ///
    /// ```
    /// use tkb_core::parse_date_range;
    ///
    /// let span = parse_date_range("16/09/2024- 29/12/2024").unwrap();
    /// assert_eq!(span.label(), "16/09/24 - 29/12/24");
    /// ```
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%d/%m/%y"),
            self.end.format("%d/%m/%y")
        )
    }

    /// Converts the span into week numbers counted from `anchor`.
    pub fn weeks_from(&self, anchor: NaiveDate) -> WeekRange {
        WeekRange::new(week_number(anchor, self.start), week_number(anchor, self.end))
    }

    /// Smallest span covering every span in `spans`.
    pub fn spanning<I>(spans: I) -> Option<DateSpan>
    where
        I: IntoIterator<Item = DateSpan>,
    {
        spans.into_iter().reduce(|acc, span| DateSpan {
            start: acc.start.min(span.start),
            end: acc.end.max(span.end),
        })
    }
}

/// Decodes a `dd/mm/yyyy - dd/mm/yyyy` range found anywhere in `text`.
///
/// Returns `None` when no range is present or either date is not a real
/// calendar date.
pub fn parse_date_range(text: &str) -> Option<DateSpan> {
    let captures = DATE_RANGE_RE.captures(text)?;
    let start = NaiveDate::parse_from_str(captures.get(1)?.as_str(), "%d/%m/%Y").ok()?;
    let end = NaiveDate::parse_from_str(captures.get(2)?.as_str(), "%d/%m/%Y").ok()?;
    Some(DateSpan { start, end })
}

/// One-based week number of `date` relative to `anchor`, never below 1.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use tkb_core::week_number;
///
/// let anchor = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
/// assert_eq!(week_number(anchor, anchor), 1);
/// assert_eq!(week_number(anchor, NaiveDate::from_ymd_opt(2024, 9, 16).unwrap()), 3);
/// assert_eq!(week_number(anchor, NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()), 1);
/// ```
pub fn week_number(anchor: NaiveDate, date: NaiveDate) -> u32 {
    let days = (date - anchor).num_days();
    let week = days.div_euclid(7) + 1;
    u32::try_from(week.max(1)).unwrap_or(1)
}

/// Label spanning every decodable range in `ranges`, if any.
pub fn spanning_label<S: AsRef<str>>(ranges: &[S]) -> Option<String> {
    DateSpan::spanning(ranges.iter().filter_map(|raw| parse_date_range(raw.as_ref())))
        .map(|span| span.label())
}
