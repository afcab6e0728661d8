//! Built-in institution profiles.
//!
//! - `dut`: Đại học Bách khoa, single-line tab-separated export decoded with
//!   a whole-line grammar, preview-mode lines accepted as a fallback.
//! - `ufl`: Đại học Ngoại Ngữ, multi-line export with absolute date ranges.

use tkb_core::{UNKNOWN_INSTRUCTOR, WeekRange};

use crate::calendar::{AnchorRule, SemesterCalendar, SpanFormat};
use crate::catalog::LessonCatalog;
use crate::profile::{
    CustomFeature, FeatureFlags, GrammarSpec, LayoutSpec, MERGE_TIME_RANGES, PositionalSpec,
    ProfileSpec, RecordPolicy,
};

/// Matches "Chủ nhật" with loose casing/spacing as pasted from the portal.
const SUNDAY_WORD: &str = r"[Cc][Hh][Ủủ][ ]?[Nn][Hh][Ậậ][Tt]";

const DUT_LESSONS: &[(&str, &str)] = &[
    ("7:00", "7:50"),
    ("8:00", "8:50"),
    ("9:00", "9:50"),
    ("10:00", "10:50"),
    ("11:00", "11:50"),
    ("12:30", "13:20"),
    ("13:30", "14:20"),
    ("14:30", "15:20"),
    ("15:30", "16:20"),
    ("16:30", "17:20"),
    ("17:30", "18:15"),
    ("18:15", "19:00"),
    ("19:10", "19:55"),
    ("19:55", "20:40"),
];

const UFL_LESSONS: &[(&str, &str)] = &[
    ("7:00", "7:50"),
    ("7:50", "8:40"),
    ("8:50", "9:40"),
    ("9:45", "10:35"),
    ("10:35", "11:25"),
    ("11:30", "12:20"),
    ("13:00", "13:50"),
    ("14:50", "15:40"),
    ("15:45", "16:35"),
    ("16:35", "17:25"),
    ("17:30", "18:20"),
    ("18:20", "19:10"),
    ("19:20", "20:10"),
    ("20:10", "21:00"),
];

/// Portal chrome that shows up when the UFL timetable page is copied whole.
const UFL_NOISE: &[&str] = &[
    "Trang chủ",
    "Thời khóa biểu",
    "Thời khóa biểu cá nhân",
    "Đăng xuất",
];

/// Grammar for the DUT export.
///
/// Columns: optional sequence number, optional section id, name, three
/// ignored columns (credits and two blanks), instructor, schedule
/// (`Thứ N,a-b,Room` joined by `; `) and week ranges (`a-b` joined by `;`).
pub fn dut_grammar() -> GrammarSpec {
    GrammarSpec {
        line: format!(
            r"^(?:(?P<seq>\d+)\t)?(?:(?P<id>[A-Za-z0-9.]+)\t)?(?P<name>[^\t]+)\t(?:[^\t]*\t){{3}}(?P<instructor>[^\t]+)\t(?P<schedule>(?:Thứ \d+|{SUNDAY_WORD}),\d+-\d+,[^\t]+)\t(?P<weeks>[\d;-]+)"
        ),
        identifier: r"^[A-Za-z0-9.]*(?:\d[A-Za-z0-9.]*\.|\.[A-Za-z0-9.]*\d)[A-Za-z0-9.]*$"
            .to_string(),
        date_token_splitter: format!(r"(?:Thứ \d+|{SUNDAY_WORD}),\d+-\d+,[^\t;]+"),
        single_date_token: format!(
            r"^(?:Thứ (?P<weekday>\d+)|{SUNDAY_WORD}),(?P<start>\d+)-(?P<end>\d+),(?P<room>.+)$"
        ),
        week_range_token: r"(?P<from>\d+)-(?P<to>\d+)".to_string(),
        columns: ["seq", "id", "name", "instructor", "schedule", "weeks"]
            .into_iter()
            .map(String::from)
            .collect(),
    }
}

pub fn dut_spec() -> ProfileSpec {
    ProfileSpec {
        id: "dut".to_string(),
        name: "Đại học Bách khoa - Đại học Đà Nẵng".to_string(),
        short_name: "DUT".to_string(),
        url: Some("https://dut.udn.vn".to_string()),
        features: FeatureFlags {
            week_filter: true,
            date_range_filter: false,
            today_filter: true,
            only_available_filter: true,
            custom: Vec::new(),
        },
        lessons: LessonCatalog::from_table(DUT_LESSONS),
        layout: LayoutSpec::Grammar(dut_grammar()),
        calendar: SemesterCalendar::default(),
        record_policy: Some(RecordPolicy::KeepPartial),
        preview_fallback: true,
    }
}

/// Anchors for UFL exports: the 2024 autumn semester counts from Sep 1 for
/// single-range courses and from Dec 1 for courses split across ranges;
/// every other year counts from Feb 3.
pub fn ufl_calendar() -> SemesterCalendar {
    SemesterCalendar {
        rules: vec![
            AnchorRule {
                year: Some(2024),
                formats: vec![SpanFormat::TwoLine],
                month: 9,
                day: 1,
            },
            AnchorRule {
                year: Some(2024),
                formats: vec![SpanFormat::MultiDateRange, SpanFormat::ThreeTimeline],
                month: 12,
                day: 1,
            },
        ],
        fallback_month: 2,
        fallback_day: 3,
    }
}

pub fn ufl_spec() -> ProfileSpec {
    ProfileSpec {
        id: "ufl".to_string(),
        name: "Đại học Ngoại Ngữ - Đại học Đà Nẵng".to_string(),
        short_name: "UFL".to_string(),
        url: Some("https://ufl.udn.vn/".to_string()),
        features: FeatureFlags {
            week_filter: false,
            date_range_filter: true,
            today_filter: false,
            only_available_filter: false,
            custom: vec![CustomFeature {
                id: MERGE_TIME_RANGES.to_string(),
                label: "Gộp các khoảng thời gian".to_string(),
                default: true,
            }],
        },
        lessons: LessonCatalog::from_table(UFL_LESSONS),
        layout: LayoutSpec::Positional(PositionalSpec {
            noise_tokens: UFL_NOISE.iter().map(|token| (*token).to_string()).collect(),
            unknown_instructor: UNKNOWN_INSTRUCTOR.to_string(),
            fallback_weeks: WeekRange::new(1, 16),
        }),
        calendar: ufl_calendar(),
        record_policy: Some(RecordPolicy::DropIncomplete),
        preview_fallback: false,
    }
}

/// Built-in specs in registry order.
pub fn builtin_specs() -> Vec<ProfileSpec> {
    vec![dut_spec(), ufl_spec()]
}
