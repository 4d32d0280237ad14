use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Key under which the theme preference is stored.
pub const THEME_KEY: &str = "theme";

// ---------------------------------------------------------------------------
// Theme values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    pub const ALL: [ThemePreference; 3] = [
        ThemePreference::Light,
        ThemePreference::Dark,
        ThemePreference::System,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    /// Next theme in the light → dark → system cycle.
    pub fn cycle(self) -> Self {
        match self {
            ThemePreference::Light => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::System,
            ThemePreference::System => ThemePreference::Light,
        }
    }

    /// Concrete theme to render with, given what the OS currently shows.
    pub fn resolve(self, system: SystemTheme) -> SystemTheme {
        match self {
            ThemePreference::Light => SystemTheme::Light,
            ThemePreference::Dark => SystemTheme::Dark,
            ThemePreference::System => system,
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            "system" => Ok(ThemePreference::System),
            other => Err(format!("Unknown theme: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemTheme {
    Light,
    Dark,
}

impl SystemTheme {
    pub fn from_dark(dark: bool) -> Self {
        if dark {
            SystemTheme::Dark
        } else {
            SystemTheme::Light
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SystemTheme::Light => "light",
            SystemTheme::Dark => "dark",
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Client-local key-value storage, persisted as a JSON object.
///
/// Every write goes straight to disk. A missing or corrupt file reads as an
/// empty store.
pub struct PreferenceStore {
    path: Option<PathBuf>,
    values: Mutex<BTreeMap<String, String>>,
}

/// Default location: `<data_dir>/mack/preferences.json`.
pub fn default_store_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("mack").join("preferences.json"))
}

impl PreferenceStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable preferences {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        PreferenceStore {
            path: Some(path),
            values: Mutex::new(values),
        }
    }

    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        PreferenceStore {
            path: None,
            values: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    /// Store `value` under `key`. Memory only changes once the write to disk
    /// has succeeded.
    pub fn set(&self, key: &str, value: &str) -> Result<(), String> {
        let mut values = self.values.lock();
        let mut next = values.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), String> {
        let mut values = self.values.lock();
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    pub fn theme(&self) -> ThemePreference {
        self.get(THEME_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }

    pub fn set_theme(&self, theme: ThemePreference) -> Result<(), String> {
        self.set(THEME_KEY, theme.as_str())
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), String> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {}", parent.display(), e))?;
        }
        let json = serde_json::to_string_pretty(values)
            .map_err(|e| format!("Failed to serialize preferences: {}", e))?;
        std::fs::write(path, json)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_defaults_to_system() {
        let store = PreferenceStore::in_memory();
        assert_eq!(store.theme(), ThemePreference::System);
    }

    #[test]
    fn theme_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let store = PreferenceStore::open(&path);
        store.set_theme(ThemePreference::Dark).unwrap();
        drop(store);

        let reopened = PreferenceStore::open(&path);
        assert_eq!(reopened.theme(), ThemePreference::Dark);
        assert_eq!(reopened.get(THEME_KEY).as_deref(), Some("dark"));
    }

    #[test]
    fn unknown_stored_theme_reads_as_system() {
        let store = PreferenceStore::in_memory();
        store.set(THEME_KEY, "solarized").unwrap();
        assert_eq!(store.theme(), ThemePreference::System);
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = PreferenceStore::open(&path);
        assert_eq!(store.get(THEME_KEY), None);
    }

    #[test]
    fn remove_deletes_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let store = PreferenceStore::open(&path);
        store.set("sidebar", "hidden").unwrap();
        store.remove("sidebar").unwrap();
        assert_eq!(PreferenceStore::open(&path).get("sidebar"), None);
    }

    #[test]
    fn failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("mack");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = PreferenceStore::open(blocker.join("preferences.json"));

        assert!(store.set_theme(ThemePreference::Dark).is_err());
        assert_eq!(store.theme(), ThemePreference::System);
        assert_eq!(store.get(THEME_KEY), None);
    }

    #[test]
    fn failed_write_is_not_flushed_by_a_later_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let store = PreferenceStore::open(&path);
        store.set("sidebar", "hidden").unwrap();

        // A directory where the file should be makes every write fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        assert!(store.set_theme(ThemePreference::Dark).is_err());
        assert!(store.remove("sidebar").is_err());
        assert_eq!(store.get("sidebar").as_deref(), Some("hidden"));

        std::fs::remove_dir(&path).unwrap();
        store.set("voice", "on").unwrap();
        let reopened = PreferenceStore::open(&path);
        assert_eq!(reopened.theme(), ThemePreference::System);
        assert_eq!(reopened.get("voice").as_deref(), Some("on"));
    }

    #[test]
    fn theme_parsing_and_cycle() {
        assert_eq!("light".parse::<ThemePreference>(), Ok(ThemePreference::Light));
        assert!("Dark".parse::<ThemePreference>().is_err());
        assert_eq!(ThemePreference::System.cycle(), ThemePreference::Light);
        assert_eq!(
            serde_json::to_string(&ThemePreference::Dark).unwrap(),
            "\"dark\""
        );
    }

    #[test]
    fn system_preference_follows_os() {
        assert_eq!(
            ThemePreference::System.resolve(SystemTheme::Dark),
            SystemTheme::Dark
        );
        assert_eq!(
            ThemePreference::Light.resolve(SystemTheme::Dark),
            SystemTheme::Light
        );
    }
}
