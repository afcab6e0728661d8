//! Lesson-slot time catalogs.
//!
//! Each institution numbers its daily teaching periods from 1 and publishes a
//! fixed wall-clock start/end for every slot. The catalog is pure lookup data;
//! parsers only ever produce slot numbers, and renderers resolve them here.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};

/// One numbered lesson slot with `H:MM` start and end times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSlot {
    pub lesson_number: u32,
    pub start: String,
    pub end: String,
}

/// Ordered lesson-slot table for one institution.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use tkb_profiles::LessonCatalog;
///
/// let catalog = LessonCatalog::from_table(&[("7:00", "7:50"), ("8:00", "8:50")]);
/// assert_eq!(catalog.max_lesson(), 2);
/// assert_eq!(
///     catalog.span(1, 2),
///     Some((
///         NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
///         NaiveTime::from_hms_opt(8, 50, 0).unwrap()
///     ))
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonCatalog {
    slots: Vec<LessonSlot>,
}

impl LessonCatalog {
    pub fn new(slots: Vec<LessonSlot>) -> Self {
        Self { slots }
    }

    /// Builds a catalog numbering `(start, end)` pairs from 1.
    pub fn from_table(table: &[(&str, &str)]) -> Self {
        let slots = table
            .iter()
            .zip(1..)
            .map(|((start, end), lesson_number)| LessonSlot {
                lesson_number,
                start: (*start).to_string(),
                end: (*end).to_string(),
            })
            .collect();
        Self { slots }
    }

    pub fn slots(&self) -> &[LessonSlot] {
        &self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Looks up slot `lesson`.
    pub fn slot(&self, lesson: u32) -> Option<&LessonSlot> {
        self.slots.iter().find(|slot| slot.lesson_number == lesson)
    }

    /// Decoded start/end times of slot `lesson`.
    pub fn times(&self, lesson: u32) -> Option<(NaiveTime, NaiveTime)> {
        let slot = self.slot(lesson)?;
        Some((parse_clock(&slot.start)?, parse_clock(&slot.end)?))
    }

    /// Wall-clock interval from the start of `start` to the end of `end`.
    ///
    /// Returns `None` for unknown slots or a reversed range.
    pub fn span(&self, start: u32, end: u32) -> Option<(NaiveTime, NaiveTime)> {
        if start > end {
            return None;
        }
        let (from, _) = self.times(start)?;
        let (_, to) = self.times(end)?;
        Some((from, to))
    }

    /// Highest slot number in the catalog (0 when empty).
    pub fn max_lesson(&self) -> u32 {
        self.slots
            .iter()
            .map(|slot| slot.lesson_number)
            .max()
            .unwrap_or(0)
    }

    /// Checks that every slot carries decodable times and a unique number.
    pub fn validate(&self) -> Result<()> {
        let mut seen = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            if seen.contains(&slot.lesson_number) {
                return Err(ProfileError::InvalidProfile(format!(
                    "lesson {} listed twice",
                    slot.lesson_number
                )));
            }
            seen.push(slot.lesson_number);

            for value in [&slot.start, &slot.end] {
                if parse_clock(value).is_none() {
                    return Err(ProfileError::InvalidLessonTime {
                        lesson: slot.lesson_number,
                        value: value.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Parses `H:MM` or `HH:MM`.
fn parse_clock(value: &str) -> Option<NaiveTime> {
    let (hours, minutes) = value.trim().split_once(':')?;
    if minutes.len() != 2 {
        return None;
    }
    NaiveTime::from_hms_opt(hours.parse().ok()?, minutes.parse().ok()?, 0)
}
