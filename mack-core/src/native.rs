use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Macos,
    Linux,
    Windows,
    Other,
}

impl Platform {
    /// Platform of the running process.
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" => Platform::Macos,
            "linux" => Platform::Linux,
            "windows" => Platform::Windows,
            _ => Platform::Other,
        }
    }

    pub fn is_mac(self) -> bool {
        self == Platform::Macos
    }

    /// Node-style platform identifier (`darwin`, `linux`, `win32`).
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Macos => "darwin",
            Platform::Linux => "linux",
            Platform::Windows => "win32",
            Platform::Other => "unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// Control surface of the main application window.
pub trait WindowControl: Send + Sync {
    fn show(&self);
    fn focus(&self);
    fn close(&self);
    fn minimize(&self);
    fn maximize(&self);
    fn unmaximize(&self);
    fn restore(&self);
    fn is_minimized(&self) -> bool;
    fn is_maximized(&self) -> bool;
    fn is_closed(&self) -> bool;
    fn open_dev_tools(&self) {}
}

/// Bring the window to the foreground, restoring it first if minimized.
pub fn focus_window(window: &dyn WindowControl) {
    if window.is_minimized() {
        window.restore();
    }
    window.focus();
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

pub trait ThemeSource: Send + Sync {
    fn shows_dark_colors(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub silent: bool,
}

pub trait Notifier: Send + Sync {
    fn is_supported(&self) -> bool {
        true
    }

    /// Show `notification`; `on_click` runs if the user activates it.
    fn show(&self, notification: Notification, on_click: Box<dyn FnOnce() + Send>);
}

// ---------------------------------------------------------------------------
// Dialogs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        FileFilter {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Whether `path` is accepted by this filter. `*` accepts everything.
    pub fn accepts(&self, path: &str) -> bool {
        if self.extensions.iter().any(|e| e == "*") {
            return true;
        }
        std::path::Path::new(path)
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy();
                self.extensions.iter().any(|e| ext.eq_ignore_ascii_case(e))
            })
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogKind {
    Open,
    Save { default_path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogOptions {
    pub kind: DialogKind,
    pub filters: Vec<FileFilter>,
}

/// A native file dialog that has been created but not yet dismissed.
pub trait DialogWindow: Send {
    /// Block until the user picks a path or cancels.
    fn run(&mut self) -> Option<PathBuf>;
    /// Release the native dialog.
    fn close(&mut self);
}

pub trait NativeDialogs: Send + Sync {
    fn create(&self, options: &DialogOptions) -> Box<dyn DialogWindow>;
}

/// Owns a [`DialogWindow`] and closes it exactly once on every exit path,
/// including early returns and unwinding.
pub struct DialogGuard {
    dialog: Box<dyn DialogWindow>,
    closed: bool,
}

impl DialogGuard {
    pub fn open(dialogs: &dyn NativeDialogs, options: &DialogOptions) -> Self {
        DialogGuard {
            dialog: dialogs.create(options),
            closed: false,
        }
    }

    pub fn run(&mut self) -> Option<PathBuf> {
        self.dialog.run()
    }

    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.dialog.close();
        }
    }
}

impl Drop for DialogGuard {
    fn drop(&mut self) {
        self.close();
    }
}
