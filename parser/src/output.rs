//! Output formatting for records, reports and profiles.

use tkb_core::{CourseMeeting, weekday_label};
use tkb_profiles::{InstitutionProfile, LessonCatalog, ProfileSpec};

use crate::report::ParseReport;

/// Supported output formats.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Markdown,
    Table,
}

/// Formats parsed records in the requested output format.
///
/// Markdown and table output resolve lesson slots to wall-clock times with
/// the profile's lesson catalog.
pub fn format_records(
    records: &[CourseMeeting],
    profile: &InstitutionProfile,
    format: OutputFormat,
) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(records)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(records).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(records_to_markdown(records, profile)),
        OutputFormat::Table => Ok(records_to_table(records, profile)),
    }
}

/// Formats a parse report in the requested output format.
pub fn format_report(report: &ParseReport, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(report).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(report_to_markdown(report)),
        OutputFormat::Table => Ok(report_to_table(report)),
    }
}

/// Formats institution profiles; JSON/YAML emit the full specs.
pub fn format_profiles(
    profiles: &[InstitutionProfile],
    format: OutputFormat,
) -> Result<String, String> {
    let specs: Vec<&ProfileSpec> = profiles.iter().map(InstitutionProfile::spec).collect();
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&specs)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(&specs).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(profiles_to_markdown(profiles)),
        OutputFormat::Table => Ok(profiles_to_table(profiles)),
    }
}

fn clock_range(lessons: &LessonCatalog, start: u32, end: u32) -> String {
    lessons
        .span(start, end)
        .map(|(from, to)| format!("{}-{}", from.format("%H:%M"), to.format("%H:%M")))
        .unwrap_or_else(|| "?".to_string())
}

fn active_period(record: &CourseMeeting) -> String {
    if let Some(ref label) = record.display_range_label {
        return label.clone();
    }
    record
        .active_weeks
        .iter()
        .map(|range| format!("{}-{}", range.from, range.to))
        .collect::<Vec<_>>()
        .join(", ")
}

fn records_to_markdown(records: &[CourseMeeting], profile: &InstitutionProfile) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Timetable: {}\n\n", profile.name()));
    out.push_str(&format!("**Courses:** {}\n\n", records.len()));

    if records.is_empty() {
        return out;
    }

    out.push_str("| Course | Instructor | Day | Lessons | Time | Room | Active |\n");
    out.push_str("|--------|------------|-----|---------|------|------|--------|\n");
    for record in records {
        let active = active_period(record);
        for meeting in &record.meetings {
            out.push_str(&format!(
                "| {} | {} | {} | {}-{} | {} | {} | {active} |\n",
                record.name,
                record.instructor,
                weekday_label(meeting.weekday),
                meeting.lesson_start,
                meeting.lesson_end,
                clock_range(profile.lessons(), meeting.lesson_start, meeting.lesson_end),
                meeting.room,
            ));
        }
    }
    out.push('\n');

    out
}

fn records_to_table(records: &[CourseMeeting], profile: &InstitutionProfile) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Profile: {}  Courses: {}\n",
        profile.short_name(),
        records.len()
    ));

    let max_name = records
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(6);

    for record in records {
        let active = active_period(record);
        for meeting in &record.meetings {
            let padding = max_name.saturating_sub(record.name.chars().count());
            out.push_str(&format!(
                "  {}{}  {:<8} {:>5}  {:<11}  {:<6}  {active}\n",
                record.name,
                " ".repeat(padding),
                weekday_label(meeting.weekday),
                format!("{}-{}", meeting.lesson_start, meeting.lesson_end),
                clock_range(profile.lessons(), meeting.lesson_start, meeting.lesson_end),
                meeting.room,
            ));
        }
    }

    out
}

fn report_to_markdown(report: &ParseReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("# Parse Report: {}\n\n", report.profile));
    out.push_str(&format!(
        "- **Success:** {}\n",
        if report.success { "yes" } else { "no" }
    ));
    if let Some(ref format) = report.selected_format {
        out.push_str(&format!("- **Detected Format:** {format}\n"));
    }
    out.push_str(&format!("- **Records:** {}\n", report.record_count));
    out.push_str(&format!("- **Coverage:** {:.2}\n", report.coverage));

    if let Some(ref code) = report.failure_code {
        out.push_str(&format!("- **Failure Code:** {code}\n"));
    }

    if !report.issues.is_empty() {
        out.push_str("\n## Issues\n\n");
        out.push_str("| Line | Kind | Text |\n");
        out.push_str("|------|------|------|\n");
        for issue in &report.issues {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                issue.line, issue.kind, issue.text
            ));
        }
    }

    if !report.warnings.is_empty() {
        out.push_str("\n## Warnings\n\n");
        for w in &report.warnings {
            out.push_str(&format!("- {w}\n"));
        }
    }

    if !report.validation_errors.is_empty() {
        out.push_str("\n## Validation Errors\n\n");
        for e in &report.validation_errors {
            out.push_str(&format!("- {e}\n"));
        }
    }

    out
}

fn report_to_table(report: &ParseReport) -> String {
    let mut out = String::new();
    let status = if report.success { "OK" } else { "FAIL" };
    out.push_str(&format!(
        "{:<8} {:<6} {:<12} records={} cov={:.2}",
        report.profile,
        status,
        report.selected_format.as_deref().unwrap_or("-"),
        report.record_count,
        report.coverage,
    ));
    if let Some(ref code) = report.failure_code {
        out.push_str(&format!("  [{code}]"));
    }
    out.push('\n');
    out
}

fn profiles_to_markdown(profiles: &[InstitutionProfile]) -> String {
    let mut out = String::new();

    out.push_str("# Institutions\n\n");
    out.push_str("| Id | Short | Name | Layout | Lessons |\n");
    out.push_str("|----|-------|------|--------|---------|\n");
    for profile in profiles {
        out.push_str(&format!(
            "| `{}` | {} | {} | {} | {} |\n",
            profile.id(),
            profile.short_name(),
            profile.name(),
            layout_label(profile),
            profile.lessons().max_lesson(),
        ));
    }

    out
}

fn profiles_to_table(profiles: &[InstitutionProfile]) -> String {
    let mut out = String::new();
    let max_id = profiles
        .iter()
        .map(|p| p.id().len())
        .max()
        .unwrap_or(2);

    for profile in profiles {
        out.push_str(&format!(
            "{:<width$}  {:<6}  {:<10}  {}\n",
            profile.id(),
            profile.short_name(),
            layout_label(profile),
            profile.name(),
            width = max_id
        ));
    }

    out
}

fn layout_label(profile: &InstitutionProfile) -> &'static str {
    if profile.grammar().is_some() {
        "grammar"
    } else {
        "positional"
    }
}
