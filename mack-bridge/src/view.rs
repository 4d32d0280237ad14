use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use mack_core::preferences::{PreferenceStore, SystemTheme, ThemePreference};

use crate::bridge::ViewBridge;
use crate::protocol::{from_payload, sections, FileHandle, SaveRequest};

/// Presentation state the content view keeps in response to host messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub section: String,
    pub theme: ThemePreference,
    pub sidebar_collapsed: bool,
    pub listening: bool,
    pub search_focused: bool,
    pub last_opened: Option<String>,
    pub last_saved: Option<String>,
}

impl Default for ViewSnapshot {
    fn default() -> Self {
        ViewSnapshot {
            section: sections::DASHBOARD.to_string(),
            theme: ThemePreference::System,
            sidebar_collapsed: false,
            listening: false,
            search_focused: false,
            last_opened: None,
            last_saved: None,
        }
    }
}

/// The view's side of the chrome: wires the standard inbound channels to
/// local state and exposes the controls the view offers the user.
pub struct ViewState {
    bridge: ViewBridge,
    store: Arc<PreferenceStore>,
    state: Arc<Mutex<ViewSnapshot>>,
}

impl ViewState {
    /// Load the stored theme, register handlers and announce readiness.
    pub fn attach(bridge: ViewBridge, store: Arc<PreferenceStore>) -> Self {
        let snapshot = ViewSnapshot {
            theme: store.theme(),
            ..ViewSnapshot::default()
        };
        let view = ViewState {
            bridge,
            store,
            state: Arc::new(Mutex::new(snapshot)),
        };
        view.register_handlers();
        view.bridge.send("app-ready", None);
        view
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.state.lock().clone()
    }

    /// The theme actually rendered: the stored preference, with `system`
    /// following the appearance the host reports.
    pub fn effective_theme(&self) -> SystemTheme {
        let system = SystemTheme::from_dark(self.bridge.is_dark_mode());
        self.state.lock().theme.resolve(system)
    }

    fn register_handlers(&self) {
        let state = self.state.clone();
        self.bridge.receive("navigate", move |payload| {
            if let Some(section) = from_payload::<String>(payload.as_ref()) {
                let mut s = state.lock();
                s.section = section;
                s.search_focused = false;
            }
        });

        for (channel, section) in [
            ("new-conversation", sections::CONVERSATION),
            ("new-project", sections::NEW_PROJECT),
        ] {
            let state = self.state.clone();
            self.bridge.receive(channel, move |_| {
                let mut s = state.lock();
                s.section = section.to_string();
                s.search_focused = false;
            });
        }

        let state = self.state.clone();
        self.bridge.receive("open-preferences", move |_| {
            state.lock().section = sections::SETTINGS.to_string();
        });

        let state = self.state.clone();
        let store = self.store.clone();
        self.bridge.receive("set-theme", move |payload| {
            if let Some(theme) = from_payload::<ThemePreference>(payload.as_ref()) {
                apply_theme(&state, &store, theme);
            }
        });

        let state = self.state.clone();
        self.bridge.receive("toggle-sidebar", move |_| {
            let mut s = state.lock();
            s.sidebar_collapsed = !s.sidebar_collapsed;
        });

        let state = self.state.clone();
        self.bridge.receive("toggle-voice", move |_| {
            let mut s = state.lock();
            s.listening = !s.listening;
        });

        let state = self.state.clone();
        self.bridge.receive("focus-search", move |_| {
            state.lock().search_focused = true;
        });

        let state = self.state.clone();
        self.bridge.receive("file-opened", move |payload| {
            if let Some(file) = from_payload::<FileHandle>(payload.as_ref()) {
                let mut s = state.lock();
                s.last_opened = Some(file.path);
                s.section = sections::CODE.to_string();
            }
        });

        let state = self.state.clone();
        self.bridge.receive("file-saved", move |payload| {
            if let Some(path) = payload
                .as_ref()
                .and_then(|p| p.get("path"))
                .and_then(Value::as_str)
            {
                state.lock().last_saved = Some(path.to_string());
            }
        });
    }

    // ── Controls ─────────────────────────────────────────────────────────

    /// Switch theme from inside the view (settings page or theme toggle).
    pub fn set_theme(&self, theme: ThemePreference) {
        apply_theme(&self.state, &self.store, theme);
    }

    /// Advance light → dark → system.
    pub fn cycle_theme(&self) {
        let next = self.state.lock().theme.cycle();
        self.set_theme(next);
    }

    pub fn close_window(&self) {
        self.bridge.send("app-close", None);
    }

    pub fn minimize_window(&self) {
        self.bridge.send("app-minimize", None);
    }

    pub fn maximize_window(&self) {
        self.bridge.send("app-maximize", None);
    }

    pub fn request_open(&self) {
        self.bridge.send("open-file", None);
    }

    pub fn request_save(&self, request: &SaveRequest) {
        self.bridge
            .send("save-file", crate::protocol::to_payload(request));
    }
}

fn apply_theme(state: &Mutex<ViewSnapshot>, store: &PreferenceStore, theme: ThemePreference) {
    state.lock().theme = theme;
    if let Err(e) = store.set_theme(theme) {
        log::warn!("Failed to persist theme preference: {}", e);
    }
}
