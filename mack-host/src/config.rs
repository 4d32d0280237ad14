use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Isolation settings for the content view. All three must stay at their
/// defaults for the bridge to be the view's only way out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebPreferences {
    pub node_integration: bool,
    pub context_isolation: bool,
    pub sandbox: bool,
}

impl Default for WebPreferences {
    fn default() -> Self {
        WebPreferences {
            node_integration: false,
            context_isolation: true,
            sandbox: true,
        }
    }
}

impl WebPreferences {
    pub fn is_isolated(&self) -> bool {
        !self.node_integration && self.context_isolation && self.sandbox
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutConfig {
    pub activate_app: String,
    pub voice_input: String,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        ShortcutConfig {
            activate_app: String::from("CommandOrControl+Shift+Space"),
            voice_input: String::from("Alt+Space"),
        }
    }
}

/// Host configuration, read from `~/.config/mack/config.json`.
///
/// `#[serde(default)]` fills any missing field, so a partial file (or an
/// older one) still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    // ── Window ───────────────────────────────────────────────────────────
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,

    // ── Chrome (macOS) ───────────────────────────────────────────────────
    pub title_bar_style: String,
    pub traffic_light_position: Position,
    pub vibrancy: Option<String>,
    pub background_color: String,

    // ── Content ──────────────────────────────────────────────────────────
    pub entry: String,
    pub web_preferences: WebPreferences,

    // ── Shortcuts ────────────────────────────────────────────────────────
    pub shortcuts: ShortcutConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            width: 1200,
            height: 800,
            min_width: 800,
            min_height: 600,

            title_bar_style: String::from("hiddenInset"),
            traffic_light_position: Position { x: 20, y: 20 },
            vibrancy: if cfg!(target_os = "macos") {
                Some(String::from("under-window"))
            } else {
                None
            },
            background_color: String::from("#00000000"),

            entry: String::from("src/index.html"),
            web_preferences: WebPreferences::default(),

            shortcuts: ShortcutConfig::default(),
        }
    }
}

impl AppConfig {
    /// Clamp the initial size to the minimum size.
    pub fn initial_size(&self) -> (u32, u32) {
        (
            self.width.max(self.min_width),
            self.height.max(self.min_height),
        )
    }
}

/// Whether dev tools should open alongside the window.
pub fn is_development() -> bool {
    std::env::var("MACK_ENV")
        .map(|v| v == "development")
        .unwrap_or(false)
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mack").join("config.json"))
}

pub fn load() -> AppConfig {
    match config_path() {
        Some(path) => load_from(&path),
        None => AppConfig::default(),
    }
}

pub fn load_from(path: &Path) -> AppConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            log::warn!("Ignoring invalid config {}: {}", path.display(), e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_window() {
        let config = AppConfig::default();
        assert_eq!(config.initial_size(), (1200, 800));
        assert_eq!(config.traffic_light_position, Position { x: 20, y: 20 });
        assert!(config.web_preferences.is_isolated());
        assert_eq!(config.shortcuts.voice_input, "Alt+Space");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"width": 640, "shortcuts": {"voice_input": "Alt+V"}}"#).unwrap();

        let config = load_from(&path);
        assert_eq!(config.width, 640);
        assert_eq!(config.initial_size(), (800, 800));
        assert_eq!(config.shortcuts.voice_input, "Alt+V");
        assert_eq!(
            config.shortcuts.activate_app,
            "CommandOrControl+Shift+Space"
        );
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "width = 3").unwrap();
        assert_eq!(load_from(&path), AppConfig::default());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_from(&dir.path().join("absent.json")),
            AppConfig::default()
        );
    }

    #[test]
    fn loosened_isolation_is_detected() {
        let prefs = WebPreferences {
            node_integration: true,
            ..WebPreferences::default()
        };
        assert!(!prefs.is_isolated());
    }
}
