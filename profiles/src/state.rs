//! Persisted session state.
//!
//! Hosts keep the pasted text, filter toggles and the selected institution in
//! a string key-value store between sessions. Key names are fixed so state
//! written by one host can be read by another.

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tkb_core::CourseMeeting;

use crate::error::Result;

/// Persisted keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateKey {
    /// Raw pasted timetable text.
    Data,
    ByWeek,
    Week,
    ShowOnlyAvailable,
    OnlyToday,
    SelectedUniversity,
    /// User-added courses for one institution (JSON array of records).
    CustomCourses(String),
    /// Custom feature toggles for one institution (JSON object of booleans).
    CustomFeatures(String),
}

impl StateKey {
    /// Key string as stored.
    ///
    /// # Examples
    ///
    /// ```
    /// use tkb_profiles::StateKey;
    ///
    /// assert_eq!(StateKey::ShowOnlyAvailable.as_key(), "showOnlyAvailable");
    /// assert_eq!(StateKey::CustomCourses("ufl".into()).as_key(), "customCourses_ufl");
    /// ```
    pub fn as_key(&self) -> String {
        match self {
            Self::Data => "data".to_string(),
            Self::ByWeek => "byWeek".to_string(),
            Self::Week => "week".to_string(),
            Self::ShowOnlyAvailable => "showOnlyAvailable".to_string(),
            Self::OnlyToday => "onlyToday".to_string(),
            Self::SelectedUniversity => "selectedUniversity".to_string(),
            Self::CustomCourses(id) => format!("customCourses_{id}"),
            Self::CustomFeatures(id) => format!("customFeatures_{id}"),
        }
    }
}

/// String key-value store collaborator.
pub trait KeyValueStore {
    fn get(&self, key: &StateKey) -> Option<String>;
    fn set(&mut self, key: &StateKey, value: String);
    fn remove(&mut self, key: &StateKey);
}

/// Volatile store, mainly for tests and one-shot runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &StateKey) -> Option<String> {
        self.entries.get(&key.as_key()).cloned()
    }

    fn set(&mut self, key: &StateKey, value: String) {
        self.entries.insert(key.as_key(), value);
    }

    fn remove(&mut self, key: &StateKey) {
        self.entries.remove(&key.as_key());
    }
}

/// Store backed by one JSON object file.
///
/// Changes stay in memory until [`persist`](Self::persist) is called.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    ///
    /// # Errors
    ///
    /// I/O errors other than a missing file, or malformed JSON.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::File::open(&path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes all entries back to the file.
    pub fn persist(&self) -> Result<()> {
        let file = std::fs::File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.entries)?;
        writer.flush()?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &StateKey) -> Option<String> {
        self.entries.get(&key.as_key()).cloned()
    }

    fn set(&mut self, key: &StateKey, value: String) {
        self.entries.insert(key.as_key(), value);
    }

    fn remove(&mut self, key: &StateKey) {
        self.entries.remove(&key.as_key());
    }
}

/// Host session toggles and the raw input they apply to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub data: String,
    pub by_week: bool,
    pub week: u32,
    pub show_only_available: bool,
    pub only_today: bool,
    pub selected_university: Option<String>,
}

impl SessionState {
    /// Reads the session; absent or unreadable values take their defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let flag = |key: StateKey| store.get(&key).is_some_and(|value| value == "true");
        Self {
            data: store.get(&StateKey::Data).unwrap_or_default(),
            by_week: flag(StateKey::ByWeek),
            week: store
                .get(&StateKey::Week)
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(0),
            show_only_available: flag(StateKey::ShowOnlyAvailable),
            only_today: flag(StateKey::OnlyToday),
            selected_university: store
                .get(&StateKey::SelectedUniversity)
                .filter(|id| !id.is_empty()),
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        store.set(&StateKey::Data, self.data.clone());
        store.set(&StateKey::ByWeek, self.by_week.to_string());
        store.set(&StateKey::Week, self.week.to_string());
        store.set(&StateKey::ShowOnlyAvailable, self.show_only_available.to_string());
        store.set(&StateKey::OnlyToday, self.only_today.to_string());
        match &self.selected_university {
            Some(id) => store.set(&StateKey::SelectedUniversity, id.clone()),
            None => store.remove(&StateKey::SelectedUniversity),
        }
    }
}

/// Saved custom feature toggles for `profile_id`.
pub fn load_custom_features(
    store: &dyn KeyValueStore,
    profile_id: &str,
) -> Result<BTreeMap<String, bool>> {
    match store.get(&StateKey::CustomFeatures(profile_id.to_string())) {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(BTreeMap::new()),
    }
}

pub fn save_custom_features(
    store: &mut dyn KeyValueStore,
    profile_id: &str,
    features: &BTreeMap<String, bool>,
) -> Result<()> {
    let raw = serde_json::to_string(features)?;
    store.set(&StateKey::CustomFeatures(profile_id.to_string()), raw);
    Ok(())
}

/// Saved user-added courses for `profile_id`.
pub fn load_custom_courses(
    store: &dyn KeyValueStore,
    profile_id: &str,
) -> Result<Vec<CourseMeeting>> {
    match store.get(&StateKey::CustomCourses(profile_id.to_string())) {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

pub fn save_custom_courses(
    store: &mut dyn KeyValueStore,
    profile_id: &str,
    courses: &[CourseMeeting],
) -> Result<()> {
    let raw = serde_json::to_string(courses)?;
    store.set(&StateKey::CustomCourses(profile_id.to_string()), raw);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProfileError;
    use tkb_core::{Meeting, WeekRange};

    #[test]
    fn test_session_defaults_from_empty_store() {
        let store = MemoryStore::default();
        assert_eq!(SessionState::load(&store), SessionState::default());
    }

    #[test]
    fn test_session_tolerates_garbage_values() {
        let mut store = MemoryStore::default();
        store.set(&StateKey::Week, "next".to_string());
        store.set(&StateKey::ByWeek, "yes".to_string());
        store.set(&StateKey::SelectedUniversity, String::new());

        let state = SessionState::load(&store);
        assert_eq!(state.week, 0);
        assert!(!state.by_week);
        assert_eq!(state.selected_university, None);
    }

    #[test]
    fn test_session_save_writes_fixed_keys() {
        let state = SessionState {
            data: "1\tCourse".to_string(),
            by_week: true,
            week: 7,
            show_only_available: false,
            only_today: true,
            selected_university: Some("ufl".to_string()),
        };
        let mut store = MemoryStore::default();
        state.save(&mut store);

        assert_eq!(store.get(&StateKey::ByWeek).as_deref(), Some("true"));
        assert_eq!(store.get(&StateKey::Week).as_deref(), Some("7"));
        assert_eq!(store.get(&StateKey::ShowOnlyAvailable).as_deref(), Some("false"));
        assert_eq!(SessionState::load(&store), state);
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        assert!(store.get(&StateKey::Data).is_none());

        let mut course = CourseMeeting::new("x", "Course", "Teacher");
        course.meetings.push(Meeting::new(8, "F207", 1, 2));
        course.active_weeks.push(WeekRange::new(1, 16));
        save_custom_courses(&mut store, "dut", std::slice::from_ref(&course)).unwrap();

        let mut toggles = BTreeMap::new();
        toggles.insert("merge_time_ranges".to_string(), false);
        save_custom_features(&mut store, "ufl", &toggles).unwrap();
        store.persist().unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(load_custom_courses(&reopened, "dut").unwrap(), vec![course]);
        assert!(load_custom_courses(&reopened, "ufl").unwrap().is_empty());
        assert_eq!(load_custom_features(&reopened, "ufl").unwrap(), toggles);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("customCourses_dut"));
        assert!(raw.contains("customFeatures_ufl"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_persist_reports_write_failure() {
        let mut store = JsonFileStore {
            path: PathBuf::from("/dev/full"),
            entries: BTreeMap::new(),
        };
        store.set(&StateKey::SelectedUniversity, "ufl".to_string());
        assert!(matches!(store.persist(), Err(ProfileError::IoError(_))));
    }

    #[test]
    fn test_persist_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::open(dir.path().join("state.json")).unwrap();
        store.path = dir.path().join("missing").join("state.json");
        store.set(&StateKey::Week, "3".to_string());
        assert!(matches!(store.persist(), Err(ProfileError::IoError(_))));
    }

    #[test]
    fn test_corrupt_custom_courses_is_an_error() {
        let mut store = MemoryStore::default();
        store.set(&StateKey::CustomCourses("dut".into()), "{not json".to_string());
        assert!(matches!(
            load_custom_courses(&store, "dut"),
            Err(ProfileError::JsonError(_))
        ));
    }

    #[test]
    fn test_corrupt_state_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(ProfileError::JsonError(_))
        ));
    }
}
