use std::collections::HashMap;

use mack_core::native::Platform;

use crate::config::ShortcutConfig;

/// Parsed representation of an accelerator for matching key events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedAccel {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub super_: bool,
    /// The lowercase key name (e.g. "n", "space", ",")
    pub key_lower: String,
}

/// Parse an accelerator like `"Shift+CommandOrControl+N"`.
///
/// `CommandOrControl` resolves to Command on macOS and Control elsewhere.
/// Returns `None` for an empty key or an unknown modifier.
pub fn parse_accelerator(accel: &str, platform: Platform) -> Option<ParsedAccel> {
    let parts: Vec<&str> = accel.split('+').map(str::trim).collect();
    let (key, modifiers) = parts.split_last()?;
    if key.is_empty() {
        return None;
    }

    let mut parsed = ParsedAccel {
        ctrl: false,
        shift: false,
        alt: false,
        super_: false,
        key_lower: key.to_lowercase(),
    };
    for modifier in modifiers {
        match modifier.to_lowercase().as_str() {
            "commandorcontrol" | "cmdorctrl" => {
                if platform.is_mac() {
                    parsed.super_ = true;
                } else {
                    parsed.ctrl = true;
                }
            }
            "command" | "cmd" | "super" | "meta" => parsed.super_ = true,
            "control" | "ctrl" => parsed.ctrl = true,
            "shift" => parsed.shift = true,
            "alt" | "option" => parsed.alt = true,
            _ => return None,
        }
    }
    Some(parsed)
}

/// Human-readable form, e.g. `"Cmd+Shift+N"` on macOS or `"Ctrl+Shift+N"`.
pub fn accel_to_display(parsed: &ParsedAccel, platform: Platform) -> String {
    let mut parts = Vec::new();
    if parsed.ctrl {
        parts.push("Ctrl".to_string());
    }
    if parsed.alt {
        parts.push(if platform.is_mac() { "Option" } else { "Alt" }.to_string());
    }
    if parsed.shift {
        parts.push("Shift".to_string());
    }
    if parsed.super_ {
        parts.push(if platform.is_mac() { "Cmd" } else { "Super" }.to_string());
    }
    let key = match parsed.key_lower.as_str() {
        "space" => "Space".to_string(),
        k if k.chars().count() == 1 => k.to_uppercase(),
        k => {
            let mut chars = k.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    };
    parts.push(key);
    parts.join("+")
}

// ---------------------------------------------------------------------------
// Global shortcuts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalAction {
    /// Bring the app to the foreground from anywhere.
    ActivateApp,
    /// Toggle voice input.
    VoiceInput,
}

/// System-wide shortcuts owned by the host. Cleared on quit.
#[derive(Debug, Default)]
pub struct ShortcutRegistry {
    bindings: HashMap<ParsedAccel, GlobalAction>,
}

impl ShortcutRegistry {
    /// Register the configured shortcuts. Invalid accelerators are logged and
    /// skipped; the first registration of a duplicate accelerator wins.
    pub fn register_defaults(config: &ShortcutConfig, platform: Platform) -> Self {
        let mut registry = ShortcutRegistry::default();
        registry.register(&config.activate_app, GlobalAction::ActivateApp, platform);
        registry.register(&config.voice_input, GlobalAction::VoiceInput, platform);
        registry
    }

    pub fn register(&mut self, accel: &str, action: GlobalAction, platform: Platform) -> bool {
        let Some(parsed) = parse_accelerator(accel, platform) else {
            log::warn!("Invalid global shortcut '{}' for {:?}", accel, action);
            return false;
        };
        if self.bindings.contains_key(&parsed) {
            log::warn!("Global shortcut '{}' is already registered", accel);
            return false;
        }
        self.bindings.insert(parsed, action);
        true
    }

    pub fn lookup(&self, pressed: &ParsedAccel) -> Option<GlobalAction> {
        self.bindings.get(pressed).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn unregister_all(&mut self) {
        self.bindings.clear();
    }
}
