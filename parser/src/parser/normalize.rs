//! Input normalization utilities.

use super::IndexedLine;

/// Unifies line endings and strips paste artifacts.
///
/// Browsers copy table cells with `\r\n` or bare `\r` line breaks and
/// sometimes non-breaking spaces; a leading byte-order mark shows up when the
/// text went through a file first. Tabs are kept as-is since they delimit
/// columns.
pub fn normalize_input(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{a0}', " ")
}

pub fn to_indexed_lines(normalized: &str) -> Vec<IndexedLine> {
    normalized
        .lines()
        .enumerate()
        .map(|(index, text)| IndexedLine {
            index,
            text: text.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_input("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test]
    fn test_normalize_keeps_tabs_and_drops_nbsp() {
        assert_eq!(
            normalize_input("\u{feff}1\tThứ\u{a0}2,4-5,C128"),
            "1\tThứ 2,4-5,C128"
        );
    }

    #[test]
    fn test_indexed_lines_keep_blank_positions() {
        let lines = to_indexed_lines("first\n\nthird");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].index, 2);
        assert_eq!(lines[2].text, "third");
        assert!(lines[1].text.is_empty());
    }
}
