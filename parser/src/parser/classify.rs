//! Input format classification with weighted scoring.
//!
//! Scores are advisory: the selector always routes by the profile's layout,
//! and only reports a warning when the input looks like a different dialect.

use std::sync::LazyLock;

use regex::Regex;

use super::{FormatScore, InputFormat};

static GRAMMAR_SCHEDULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:Thứ \d+|[Cc][Hh][Ủủ][ ]?[Nn][Hh][Ậậ][Tt]),\d+-\d+,")
        .expect("static regex must compile")
});
static PREVIEW_SCHEDULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:Thứ \d|Chủ nhật):\s*\d+-\d+,").expect("static regex must compile")
});
static DATE_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2}/\d{2}/\d{4}\s*-\s*\d{2}/\d{2}/\d{4}").expect("static regex must compile")
});
static COURSE_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\t").expect("static regex must compile"));

/// Minimum tab count of a single-line course row (7 columns).
const ROW_TABS: usize = 6;

/// Scores the given input lines against known [`InputFormat`] variants.
/// Returns a descending-sorted vector of [`FormatScore`] entries.
pub fn classify_formats(lines: &[&str]) -> Vec<FormatScore> {
    let rows: Vec<&str> = lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect();

    let mut scores = vec![
        FormatScore {
            format: InputFormat::Grammar,
            score: row_share(&rows, &GRAMMAR_SCHEDULE_RE),
        },
        FormatScore {
            format: InputFormat::Preview,
            score: row_share(&rows, &PREVIEW_SCHEDULE_RE),
        },
        FormatScore {
            format: InputFormat::Positional,
            score: score_positional(&rows),
        },
        FormatScore {
            format: InputFormat::Unknown,
            score: 0.05,
        },
    ];

    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scores
}

/// Share of rows that are wide tab rows carrying `schedule`, scaled to 0.1..=1.0.
fn row_share(rows: &[&str], schedule: &Regex) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let hits = rows
        .iter()
        .filter(|row| row.matches('\t').count() >= ROW_TABS && schedule.is_match(row))
        .count();
    if hits == 0 {
        return 0.0;
    }
    0.1 + 0.9 * (hits as f64 / rows.len() as f64)
}

fn score_positional(rows: &[&str]) -> f64 {
    let course_starts = rows.iter().filter(|row| COURSE_START_RE.is_match(row)).count();
    let date_rows = rows.iter().filter(|row| DATE_RANGE_RE.is_match(row)).count();

    let mut score = 0.0;
    if course_starts > 0 && date_rows > 0 {
        score += 0.6;
        if date_rows >= course_starts {
            score += 0.3;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grammar_rows_score_highest() {
        let lines = [
            "6\t5070040.2420.24.99\tTiếng Nhật 2 (CNTT)\t1\t\t\tTrần Thị Kim Ngân\tThứ 2,4-5,C128\t29-44",
        ];
        let scores = classify_formats(&lines);
        assert_eq!(scores[0].format, InputFormat::Grammar);
        assert!(scores[0].score > 0.9);
    }

    #[test]
    fn test_preview_rows_score_highest() {
        let lines = [
            "1\t2090160.2520.24.16\tChủ nghĩa Xã hội khoa học\t2\tTrương Thị Thu Hiền\tThứ 6: 1-2,F207\t22-27;31-40",
            "",
        ];
        let scores = classify_formats(&lines);
        assert_eq!(scores[0].format, InputFormat::Preview);
    }

    #[test]
    fn test_positional_rows_score_highest() {
        let lines = [
            "1\tCơ sở văn hóa Việt Nam\t2\tCơ sở văn hóa Việt Nam- 09\t",
            "16/09/2024- 29/12/2024\t3\t6-7\tDB303\tPhạm Thị Tú Trinh",
        ];
        let scores = classify_formats(&lines);
        assert_eq!(scores[0].format, InputFormat::Positional);
        assert!(scores[0].score > 0.85);
    }

    #[test]
    fn test_unrecognized_text_is_unknown() {
        let scores = classify_formats(&["hello", "world"]);
        assert_eq!(scores[0].format, InputFormat::Unknown);
        assert_eq!(classify_formats(&[])[0].format, InputFormat::Unknown);
    }
}
