//! Institution profiles.
//!
//! A [`ProfileSpec`] is the serializable description of one institution: its
//! optional UI features, lesson catalog, export layout and record policy.
//! [`InstitutionProfile::from_spec`] validates a spec and compiles its grammar
//! patterns once, so parse calls only ever see ready-to-use regexes.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tkb_core::{UNKNOWN_INSTRUCTOR, WeekRange};

use crate::calendar::SemesterCalendar;
use crate::catalog::LessonCatalog;
use crate::error::{ProfileError, Result};

/// Custom feature id that makes merging split date-range records the default.
pub const MERGE_TIME_RANGES: &str = "merge_time_ranges";

/// Institution-specific toggle exposed to the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFeature {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub default: bool,
}

/// Optional UI features an institution supports.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default)]
    pub week_filter: bool,
    #[serde(default)]
    pub date_range_filter: bool,
    #[serde(default)]
    pub today_filter: bool,
    #[serde(default)]
    pub only_available_filter: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom: Vec<CustomFeature>,
}

impl FeatureFlags {
    /// Default value of every custom feature, keyed by id.
    pub fn custom_defaults(&self) -> BTreeMap<String, bool> {
        self.custom
            .iter()
            .map(|feature| (feature.id.clone(), feature.default))
            .collect()
    }

    pub fn custom_default(&self, id: &str) -> Option<bool> {
        self.custom
            .iter()
            .find(|feature| feature.id == id)
            .map(|feature| feature.default)
    }
}

/// What the selector does with records that are missing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordPolicy {
    /// Emit partially matched records with blank fields.
    KeepPartial,
    /// Drop records without meetings or without any active period.
    DropIncomplete,
}

/// Whole-line grammar for single-line-per-course exports.
///
/// `line` must define a named capture group for every entry of `columns`.
/// `single_date_token` must define `start`, `end` and `room` (and may define
/// `weekday`); `week_range_token` must define `from` and `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarSpec {
    pub line: String,
    pub identifier: String,
    pub date_token_splitter: String,
    pub single_date_token: String,
    pub week_range_token: String,
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
}

fn default_columns() -> Vec<String> {
    ["seq", "id", "name", "instructor", "schedule", "weeks"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Settings for multi-line positional exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionalSpec {
    /// Lines dropped before span detection (page chrome, portal footers).
    #[serde(default)]
    pub noise_tokens: Vec<String>,
    #[serde(default = "default_unknown_instructor")]
    pub unknown_instructor: String,
    /// Week range used when a date range cannot be decoded.
    #[serde(default)]
    pub fallback_weeks: WeekRange,
}

fn default_unknown_instructor() -> String {
    UNKNOWN_INSTRUCTOR.to_string()
}

impl Default for PositionalSpec {
    fn default() -> Self {
        Self {
            noise_tokens: Vec::new(),
            unknown_instructor: default_unknown_instructor(),
            fallback_weeks: WeekRange::default(),
        }
    }
}

/// Export layout, tagged by `kind` in YAML/JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutSpec {
    Grammar(GrammarSpec),
    Positional(PositionalSpec),
}

/// Serializable institution description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSpec {
    pub id: String,
    pub name: String,
    pub short_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub features: FeatureFlags,
    pub lessons: LessonCatalog,
    pub layout: LayoutSpec,
    #[serde(default)]
    pub calendar: SemesterCalendar,
    /// Defaults to `keep_partial` for grammar layouts and `drop_incomplete`
    /// for positional layouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_policy: Option<RecordPolicy>,
    /// Retry lines the grammar rejects with the preview-mode format.
    #[serde(default)]
    pub preview_fallback: bool,
}

/// Compiled [`GrammarSpec`].
#[derive(Debug, Clone)]
pub struct Grammar {
    line: Regex,
    identifier: Regex,
    date_token_splitter: Regex,
    single_date_token: Regex,
    week_range_token: Regex,
    columns: Vec<String>,
}

impl Grammar {
    /// Compiles and checks every pattern of `spec`.
    ///
    /// # Errors
    ///
    /// [`ProfileError::InvalidPattern`] when a pattern does not compile,
    /// [`ProfileError::MissingCaptureGroup`] when a required named group is
    /// absent, [`ProfileError::InvalidProfile`] when fewer than five columns
    /// are declared.
    pub fn compile(profile: &str, spec: &GrammarSpec) -> Result<Self> {
        if spec.columns.len() < 5 {
            return Err(ProfileError::InvalidProfile(format!(
                "profile '{profile}': grammar needs at least 5 columns, got {}",
                spec.columns.len()
            )));
        }

        let line = compile_pattern(profile, "line", &spec.line)?;
        let column_refs: Vec<&str> = spec.columns.iter().map(String::as_str).collect();
        require_groups(profile, "line", &line, &column_refs)?;

        let identifier = compile_pattern(profile, "identifier", &spec.identifier)?;
        let date_token_splitter =
            compile_pattern(profile, "date_token_splitter", &spec.date_token_splitter)?;

        let single_date_token =
            compile_pattern(profile, "single_date_token", &spec.single_date_token)?;
        require_groups(
            profile,
            "single_date_token",
            &single_date_token,
            &["start", "end", "room"],
        )?;

        let week_range_token = compile_pattern(profile, "week_range_token", &spec.week_range_token)?;
        require_groups(profile, "week_range_token", &week_range_token, &["from", "to"])?;

        Ok(Self {
            line,
            identifier,
            date_token_splitter,
            single_date_token,
            week_range_token,
            columns: spec.columns.clone(),
        })
    }

    pub fn line(&self) -> &Regex {
        &self.line
    }

    pub fn identifier(&self) -> &Regex {
        &self.identifier
    }

    pub fn date_token_splitter(&self) -> &Regex {
        &self.date_token_splitter
    }

    pub fn single_date_token(&self) -> &Regex {
        &self.single_date_token
    }

    pub fn week_range_token(&self) -> &Regex {
        &self.week_range_token
    }

    /// Named line-pattern groups in left-to-right column order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

fn compile_pattern(profile: &str, field: &'static str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| ProfileError::InvalidPattern {
        profile: profile.to_string(),
        field,
        source,
    })
}

fn require_groups(profile: &str, field: &'static str, regex: &Regex, groups: &[&str]) -> Result<()> {
    for group in groups {
        let present = regex.capture_names().flatten().any(|name| name == *group);
        if !present {
            return Err(ProfileError::MissingCaptureGroup {
                profile: profile.to_string(),
                field,
                group: (*group).to_string(),
            });
        }
    }
    Ok(())
}

/// Compiled export layout.
#[derive(Debug, Clone)]
pub enum Layout {
    Grammar(Grammar),
    Positional(PositionalSpec),
}

/// Validated institution profile, ready to be passed to the parsers.
///
/// # Examples
///
/// ```
/// use tkb_profiles::{InstitutionProfile, RecordPolicy, builtin};
///
/// let dut = InstitutionProfile::from_spec(builtin::dut_spec()).unwrap();
/// assert_eq!(dut.id(), "dut");
/// assert!(dut.grammar().is_some());
/// assert_eq!(dut.record_policy(), RecordPolicy::KeepPartial);
/// assert_eq!(dut.lessons().max_lesson(), 14);
/// ```
#[derive(Debug, Clone)]
pub struct InstitutionProfile {
    spec: ProfileSpec,
    layout: Layout,
}

impl InstitutionProfile {
    /// Validates `spec` and compiles its layout.
    pub fn from_spec(spec: ProfileSpec) -> Result<Self> {
        if spec.id.trim().is_empty() {
            return Err(ProfileError::InvalidProfile(
                "profile id cannot be empty".to_string(),
            ));
        }
        if spec.lessons.is_empty() {
            return Err(ProfileError::InvalidProfile(format!(
                "profile '{}': lesson catalog is empty",
                spec.id
            )));
        }
        spec.lessons.validate()?;
        spec.calendar.validate()?;

        let layout = match &spec.layout {
            LayoutSpec::Grammar(grammar) => Layout::Grammar(Grammar::compile(&spec.id, grammar)?),
            LayoutSpec::Positional(positional) => Layout::Positional(positional.clone()),
        };

        Ok(Self { spec, layout })
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn short_name(&self) -> &str {
        &self.spec.short_name
    }

    pub fn spec(&self) -> &ProfileSpec {
        &self.spec
    }

    pub fn features(&self) -> &FeatureFlags {
        &self.spec.features
    }

    pub fn lessons(&self) -> &LessonCatalog {
        &self.spec.lessons
    }

    pub fn calendar(&self) -> &SemesterCalendar {
        &self.spec.calendar
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Explicit policy, or the layout's default.
    pub fn record_policy(&self) -> RecordPolicy {
        self.spec.record_policy.unwrap_or(match self.layout {
            Layout::Grammar(_) => RecordPolicy::KeepPartial,
            Layout::Positional(_) => RecordPolicy::DropIncomplete,
        })
    }

    pub fn preview_fallback(&self) -> bool {
        self.spec.preview_fallback
    }

    pub fn grammar(&self) -> Option<&Grammar> {
        match &self.layout {
            Layout::Grammar(grammar) => Some(grammar),
            Layout::Positional(_) => None,
        }
    }

    pub fn positional(&self) -> Option<&PositionalSpec> {
        match &self.layout {
            Layout::Positional(positional) => Some(positional),
            Layout::Grammar(_) => None,
        }
    }

    /// Whether parse runs merge split date-range records unless told otherwise.
    pub fn merges_by_default(&self) -> bool {
        self.features()
            .custom_default(MERGE_TIME_RANGES)
            .unwrap_or(false)
    }
}
