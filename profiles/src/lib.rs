//! Institution profiles for timetable text parsing.
//!
//! A profile tells the parsers how one institution's portal exports its
//! timetable: a whole-line grammar for single-line exports, or positional
//! settings for multi-line exports with absolute date ranges. Profiles also
//! carry the lesson-slot time catalog, the semester calendar used to turn
//! dates into week numbers, and the UI features a host may offer.
//!
//! # Quick start
//!
//! ```
//! use tkb_profiles::{MemoryStore, ProfileRegistry};
//!
//! let registry = ProfileRegistry::builtin().unwrap();
//! let profile = registry.default_profile(&MemoryStore::default());
//! assert_eq!(profile.short_name(), "DUT");
//! assert_eq!(profile.lessons().slot(1).unwrap().start, "7:00");
//! ```

pub mod builtin;
mod calendar;
mod catalog;
mod error;
mod profile;
mod registry;
mod state;

pub use calendar::{AnchorRule, SemesterCalendar, SpanFormat};
pub use catalog::{LessonCatalog, LessonSlot};
pub use error::{ProfileError, Result};
pub use profile::{
    CustomFeature, FeatureFlags, Grammar, GrammarSpec, InstitutionProfile, Layout, LayoutSpec,
    MERGE_TIME_RANGES, PositionalSpec, ProfileSpec, RecordPolicy,
};
pub use registry::{ProfileRegistry, RegistryConfig};
pub use state::{
    JsonFileStore, KeyValueStore, MemoryStore, SessionState, StateKey, load_custom_courses,
    load_custom_features, save_custom_courses, save_custom_features,
};
