//! Record merging for split date-range exports.
//!
//! Date-range exports emit one record per date range even when the course is
//! otherwise identical. [`merge_records`] coalesces records that share a
//! course name, instructor and identical meeting times, combining their
//! active periods into one record.
//!
//! # Example
//!
//! ```
//! use tkb_core::*;
//!
//! let mut first = CourseMeeting::new("GDQP-01", "Giáo dục quốc phòng", "Nguyễn Văn A");
//! first.meetings.push(Meeting::new(3, "DB303", 1, 5));
//! first.active_date_ranges.push("01/09/2024-30/10/2024".into());
//!
//! let mut second = first.clone();
//! second.meetings[0].room = "DC202".into();
//! second.active_date_ranges = vec!["01/11/2024-29/12/2024".into()];
//!
//! let merged = merge_records(vec![first, second]);
//! assert_eq!(merged.len(), 1);
//! assert_eq!(merged[0].active_date_ranges.len(), 2);
//! assert_eq!(merged[0].display_range_label.as_deref(), Some("01/09/24 - 29/12/24"));
//! ```

use std::collections::HashMap;

use crate::dates::spanning_label;
use crate::types::CourseMeeting;

/// Identity used to decide whether two records describe the same course.
///
/// Rooms and active periods are not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MergeKey {
    name: String,
    instructor: String,
    times: Vec<(u8, u32, u32)>,
}

impl MergeKey {
    fn of(record: &CourseMeeting) -> Self {
        Self {
            name: record.name.clone(),
            instructor: record.instructor.clone(),
            times: record.meetings.iter().map(|m| m.time_key()).collect(),
        }
    }
}

/// Coalesces records sharing name, instructor and meeting times.
///
/// Groups keep the position of their first member. A group of one is
/// returned unchanged; larger groups keep the first record's identity and
/// meetings, append the other members' date ranges and week ranges (skipping
/// exact duplicates) and get a label spanning the earliest start to the
/// latest end. Running the merge on its own output changes nothing.
pub fn merge_records(records: Vec<CourseMeeting>) -> Vec<CourseMeeting> {
    let mut index: HashMap<MergeKey, usize> = HashMap::new();
    let mut groups: Vec<Vec<CourseMeeting>> = Vec::new();

    for record in records {
        let key = MergeKey::of(&record);
        match index.get(&key) {
            Some(&slot) => groups[slot].push(record),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![record]);
            }
        }
    }

    groups.into_iter().filter_map(combine_group).collect()
}

fn combine_group(group: Vec<CourseMeeting>) -> Option<CourseMeeting> {
    let mut members = group.into_iter();
    let mut merged = members.next()?;
    let mut absorbed = false;

    for member in members {
        absorbed = true;
        for range in member.active_date_ranges {
            if !merged.active_date_ranges.contains(&range) {
                merged.active_date_ranges.push(range);
            }
        }
        for weeks in member.active_weeks {
            if !merged.active_weeks.contains(&weeks) {
                merged.active_weeks.push(weeks);
            }
        }
    }

    if absorbed {
        if let Some(label) = spanning_label(&merged.active_date_ranges) {
            merged.display_range_label = Some(label);
        }
    }

    Some(merged)
}
