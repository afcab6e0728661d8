//! Error types for profile configuration and session persistence.

use thiserror::Error;

/// Errors raised while building profiles, loading registries or persisting
/// session state.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A grammar pattern failed to compile.
    #[error("profile '{profile}': invalid {field} pattern: {source}")]
    InvalidPattern {
        profile: String,
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    /// A grammar pattern lacks a named capture group the parser reads.
    #[error("profile '{profile}': {field} pattern has no capture group named '{group}'")]
    MissingCaptureGroup {
        profile: String,
        field: &'static str,
        group: String,
    },

    /// A lesson slot time is not a valid `H:MM` clock time.
    #[error("lesson {lesson}: invalid time '{value}'")]
    InvalidLessonTime { lesson: u32, value: String },

    /// A semester anchor rule names an impossible month/day.
    #[error("invalid semester anchor {month}/{day}")]
    InvalidAnchor { month: u32, day: u32 },

    /// Profile spec is structurally invalid (e.g., empty id).
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// Two profiles in one registry share an id.
    #[error("duplicate profile id: {0}")]
    DuplicateProfile(String),

    /// Requested profile id is not registered.
    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    /// Registry ended up with no profiles.
    #[error("registry contains no profiles")]
    EmptyRegistry,
}

/// Convenience alias for results with [`ProfileError`].
pub type Result<T> = std::result::Result<T, ProfileError>;
