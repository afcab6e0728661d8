//! Ordered profile registry with optional file configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! include_builtin: true
//! profiles:
//!   - id: ufl
//!     name: Đại học Ngoại Ngữ - Đại học Đà Nẵng
//!     short_name: UFL
//!     lessons:
//!       - { lesson_number: 1, start: "7:00", end: "7:50" }
//!     layout:
//!       kind: positional
//!       noise_tokens: [Trang chủ]
//!     calendar:
//!       rules:
//!         - { year: 2025, month: 8, day: 25 }
//! ```
//!
//! Loaded specs replace built-ins with the same id and are appended otherwise.

use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builtin::builtin_specs;
use crate::error::{ProfileError, Result};
use crate::profile::{InstitutionProfile, ProfileSpec};
use crate::state::{KeyValueStore, StateKey};

/// File form of a registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_include_builtin")]
    pub include_builtin: bool,
    #[serde(default)]
    pub profiles: Vec<ProfileSpec>,
}

fn default_include_builtin() -> bool {
    true
}

impl RegistryConfig {
    /// Reads a registry file; `.json` files are parsed as JSON, anything else
    /// as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ProfileError::IoError) if the file cannot be read,
    /// or [`JsonError`](ProfileError::JsonError) /
    /// [`YamlError`](ProfileError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config = if is_json {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        Ok(config)
    }
}

/// Ordered collection of compiled profiles. The first profile is the default.
///
/// # Examples
///
/// ```
/// use tkb_profiles::ProfileRegistry;
///
/// let registry = ProfileRegistry::builtin().unwrap();
/// assert_eq!(registry.ids(), vec!["dut", "ufl"]);
/// assert_eq!(registry.get_or_default("ufl").short_name(), "UFL");
/// assert_eq!(registry.get_or_default("missing").id(), "dut");
/// ```
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<InstitutionProfile>,
}

impl ProfileRegistry {
    /// Compiles `specs` in order.
    ///
    /// # Errors
    ///
    /// [`ProfileError::EmptyRegistry`] for an empty list,
    /// [`ProfileError::DuplicateProfile`] for a repeated id, or any error from
    /// [`InstitutionProfile::from_spec`].
    pub fn from_specs(specs: Vec<ProfileSpec>) -> Result<Self> {
        if specs.is_empty() {
            return Err(ProfileError::EmptyRegistry);
        }

        let mut profiles: Vec<InstitutionProfile> = Vec::with_capacity(specs.len());
        for spec in specs {
            if profiles.iter().any(|p| p.id() == spec.id) {
                return Err(ProfileError::DuplicateProfile(spec.id));
            }
            profiles.push(InstitutionProfile::from_spec(spec)?);
        }
        Ok(Self { profiles })
    }

    /// Registry holding the built-in profiles (`dut`, `ufl`).
    pub fn builtin() -> Result<Self> {
        Self::from_specs(builtin_specs())
    }

    /// Builds a registry from a loaded configuration.
    pub fn from_config(config: RegistryConfig) -> Result<Self> {
        let mut specs = if config.include_builtin {
            builtin_specs()
        } else {
            Vec::new()
        };

        let mut seen = Vec::new();
        for spec in config.profiles {
            if seen.contains(&spec.id) {
                return Err(ProfileError::DuplicateProfile(spec.id));
            }
            seen.push(spec.id.clone());

            match specs.iter_mut().find(|existing| existing.id == spec.id) {
                Some(existing) => {
                    debug!(profile = %spec.id, "configured profile replaces built-in");
                    *existing = spec;
                }
                None => specs.push(spec),
            }
        }

        Self::from_specs(specs)
    }

    /// Loads a YAML or JSON [`RegistryConfig`] and compiles it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(RegistryConfig::load(path)?)
    }

    pub fn profiles(&self) -> &[InstitutionProfile] {
        &self.profiles
    }

    pub fn ids(&self) -> Vec<&str> {
        self.profiles.iter().map(InstitutionProfile::id).collect()
    }

    pub fn find(&self, id: &str) -> Option<&InstitutionProfile> {
        self.profiles.iter().find(|profile| profile.id() == id)
    }

    /// Like [`find`](Self::find) but reports unknown ids as errors.
    pub fn require(&self, id: &str) -> Result<&InstitutionProfile> {
        self.find(id)
            .ok_or_else(|| ProfileError::UnknownProfile(id.to_string()))
    }

    pub fn first(&self) -> &InstitutionProfile {
        // Construction rejects empty registries.
        &self.profiles[0]
    }

    /// Profile `id`, or the first profile when `id` is unknown.
    pub fn get_or_default(&self, id: &str) -> &InstitutionProfile {
        self.find(id).unwrap_or_else(|| self.first())
    }

    /// Profile saved under `selectedUniversity`, or the first profile.
    pub fn default_profile(&self, store: &dyn KeyValueStore) -> &InstitutionProfile {
        store
            .get(&StateKey::SelectedUniversity)
            .and_then(|id| self.find(&id))
            .unwrap_or_else(|| self.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;
    use crate::profile::LayoutSpec;
    use crate::state::MemoryStore;
    use std::io::Write;

    #[test]
    fn test_builtin_order() {
        let registry = ProfileRegistry::builtin().unwrap();
        assert_eq!(registry.first().id(), "dut");
        assert!(registry.find("ufl").is_some());
        assert!(registry.find("UFL").is_none());
    }

    #[test]
    fn test_require_unknown() {
        let registry = ProfileRegistry::builtin().unwrap();
        assert!(matches!(
            registry.require("hust"),
            Err(ProfileError::UnknownProfile(id)) if id == "hust"
        ));
    }

    #[test]
    fn test_default_profile_prefers_saved_selection() {
        let registry = ProfileRegistry::builtin().unwrap();
        let mut store = MemoryStore::default();
        assert_eq!(registry.default_profile(&store).id(), "dut");

        store.set(&StateKey::SelectedUniversity, "ufl".to_string());
        assert_eq!(registry.default_profile(&store).id(), "ufl");

        store.set(&StateKey::SelectedUniversity, "gone".to_string());
        assert_eq!(registry.default_profile(&store).id(), "dut");
    }

    #[test]
    fn test_empty_and_duplicate_specs() {
        assert!(matches!(
            ProfileRegistry::from_specs(Vec::new()),
            Err(ProfileError::EmptyRegistry)
        ));
        assert!(matches!(
            ProfileRegistry::from_specs(vec![builtin::dut_spec(), builtin::dut_spec()]),
            Err(ProfileError::DuplicateProfile(id)) if id == "dut"
        ));
    }

    #[test]
    fn test_config_without_builtins_and_no_profiles_is_empty() {
        let config = RegistryConfig {
            include_builtin: false,
            profiles: Vec::new(),
        };
        assert!(matches!(
            ProfileRegistry::from_config(config),
            Err(ProfileError::EmptyRegistry)
        ));
    }

    #[test]
    fn test_load_yaml_overrides_builtin() {
        let yaml = r#"
profiles:
  - id: ufl
    name: Đại học Ngoại Ngữ
    short_name: UFL
    lessons:
      - { lesson_number: 1, start: "7:00", end: "7:50" }
    layout:
      kind: positional
      noise_tokens: [Trang chủ]
    calendar:
      rules:
        - { year: 2025, month: 8, day: 25 }
  - id: demo
    name: Demo
    short_name: DEMO
    lessons:
      - { lesson_number: 1, start: "7:00", end: "7:45" }
    layout:
      kind: positional
"#;
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let registry = ProfileRegistry::load(file.path()).unwrap();
        assert_eq!(registry.ids(), vec!["dut", "ufl", "demo"]);

        let ufl = registry.find("ufl").unwrap();
        assert_eq!(ufl.lessons().max_lesson(), 1);
        assert_eq!(ufl.calendar().rules[0].year, Some(2025));
        assert!(matches!(ufl.spec().layout, LayoutSpec::Positional(_)));
        assert!(!ufl.merges_by_default());
    }

    #[test]
    fn test_load_json_config() {
        let spec = serde_json::to_value(builtin::ufl_spec()).unwrap();
        let mut renamed = spec.clone();
        renamed["id"] = "ufl2".into();
        let config = serde_json::json!({ "include_builtin": false, "profiles": [spec, renamed] });

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(config.to_string().as_bytes()).unwrap();

        let registry = ProfileRegistry::load(file.path()).unwrap();
        assert_eq!(registry.ids(), vec!["ufl", "ufl2"]);
        assert_eq!(registry.first().spec(), &builtin::ufl_spec());
    }

    #[test]
    fn test_invalid_profile_in_config_fails_load() {
        let yaml = "profiles:\n  - id: bad\n    name: Bad\n    short_name: BAD\n    lessons: []\n    layout:\n      kind: positional\n";
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        assert!(matches!(
            ProfileRegistry::load(file.path()),
            Err(ProfileError::InvalidProfile(_))
        ));
    }
}
