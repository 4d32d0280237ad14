// ---------------------------------------------------------------------------
// Headless native layer
// ---------------------------------------------------------------------------
//
// Stand-ins for the OS services the host drives, used when the shell runs
// in a terminal:
//
//   HeadlessWindow   - window state machine, logs every transition
//   ConsoleDialogs   - file dialogs answered by the next console line
//   LogNotifier      - notifications go to the log
//   SystemThemeProbe - dark/light from MACK_COLOR_SCHEME or GTK_THEME
//   FixedTheme       - constant answer, for tests
//
// A native frontend supplies its own implementations of the same traits.

use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mack_core::native::{
    DialogKind, DialogOptions, DialogWindow, FileFilter, NativeDialogs, Notification, Notifier,
    ThemeSource, WindowControl,
};

// ── Window ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WindowFlags {
    pub visible: bool,
    pub focused: bool,
    pub minimized: bool,
    pub maximized: bool,
    pub closed: bool,
    pub dev_tools: bool,
}

pub struct HeadlessWindow {
    title: String,
    flags: Mutex<WindowFlags>,
}

impl HeadlessWindow {
    pub fn new(title: &str) -> Self {
        HeadlessWindow {
            title: title.to_string(),
            flags: Mutex::new(WindowFlags::default()),
        }
    }

    pub fn flags(&self) -> WindowFlags {
        *self.flags.lock()
    }

    fn update(&self, what: &str, f: impl FnOnce(&mut WindowFlags)) {
        let mut flags = self.flags.lock();
        f(&mut flags);
        log::info!("[{}] {} -> {:?}", self.title, what, *flags);
    }
}

impl WindowControl for HeadlessWindow {
    fn show(&self) {
        self.update("show", |f| {
            f.visible = true;
            f.closed = false;
        });
    }

    fn focus(&self) {
        self.update("focus", |f| f.focused = true);
    }

    fn close(&self) {
        self.update("close", |f| {
            *f = WindowFlags {
                closed: true,
                ..WindowFlags::default()
            }
        });
    }

    fn minimize(&self) {
        self.update("minimize", |f| {
            f.minimized = true;
            f.focused = false;
        });
    }

    fn maximize(&self) {
        self.update("maximize", |f| {
            f.maximized = true;
            f.minimized = false;
        });
    }

    fn unmaximize(&self) {
        self.update("unmaximize", |f| f.maximized = false);
    }

    fn restore(&self) {
        self.update("restore", |f| {
            f.minimized = false;
            f.visible = true;
        });
    }

    fn is_minimized(&self) -> bool {
        self.flags.lock().minimized
    }

    fn is_maximized(&self) -> bool {
        self.flags.lock().maximized
    }

    fn is_closed(&self) -> bool {
        self.flags.lock().closed
    }

    fn open_dev_tools(&self) {
        self.update("dev tools", |f| f.dev_tools = true);
    }
}

// ── Dialogs ─────────────────────────────────────────────────────────────────

type AnswerSlot = Arc<Mutex<Option<Sender<Option<PathBuf>>>>>;

/// File dialogs answered from the console: the next line typed while a
/// dialog is open is the chosen path, an empty line cancels.
#[derive(Default)]
pub struct ConsoleDialogs {
    pending: AnswerSlot,
}

impl ConsoleDialogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Hand `line` to the open dialog. Returns false if none is open.
    pub fn answer(&self, line: &str) -> bool {
        let Some(tx) = self.pending.lock().take() else {
            return false;
        };
        let line = line.trim();
        let choice = (!line.is_empty()).then(|| PathBuf::from(line));
        let _ = tx.send(choice);
        true
    }
}

impl NativeDialogs for ConsoleDialogs {
    fn create(&self, options: &DialogOptions) -> Box<dyn DialogWindow> {
        Box::new(ConsoleDialog {
            options: options.clone(),
            pending: self.pending.clone(),
        })
    }
}

/// Whether `path` matches one of `filters`. No filters means anything goes.
fn within_filters(filters: &[FileFilter], path: &Path) -> bool {
    filters.is_empty()
        || filters
            .iter()
            .any(|filter| filter.accepts(&path.to_string_lossy()))
}

struct ConsoleDialog {
    options: DialogOptions,
    pending: AnswerSlot,
}

impl DialogWindow for ConsoleDialog {
    fn run(&mut self) -> Option<PathBuf> {
        let (tx, rx) = bounded(1);
        *self.pending.lock() = Some(tx);

        let filters: Vec<String> = self
            .options
            .filters
            .iter()
            .map(|f| format!("{} ({})", f.name, f.extensions.join(", ")))
            .collect();
        match &self.options.kind {
            DialogKind::Open => println!("Open file - enter a path (empty to cancel)"),
            DialogKind::Save { default_path } => {
                println!("Save as [{}] - enter a path (empty to cancel)", default_path)
            }
        }
        println!("  filters: {}", filters.join("; "));

        let choice = rx.recv().ok().flatten();
        if let Some(path) = &choice {
            if !within_filters(&self.options.filters, path) {
                log::warn!("{} does not match any offered filter", path.display());
            }
        }
        choice
    }

    fn close(&mut self) {
        self.pending.lock().take();
        log::debug!("Dialog closed");
    }
}

// ── Notifications ───────────────────────────────────────────────────────────

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show(&self, notification: Notification, _on_click: Box<dyn FnOnce() + Send>) {
        log::info!(
            "Notification{}: {} - {}",
            if notification.silent { " (silent)" } else { "" },
            notification.title,
            notification.body
        );
    }
}

// ── Theme ───────────────────────────────────────────────────────────────────

/// Reads the desktop's colour scheme on every call so changes are picked up.
pub struct SystemThemeProbe;

impl ThemeSource for SystemThemeProbe {
    fn shows_dark_colors(&self) -> bool {
        if let Ok(scheme) = std::env::var("MACK_COLOR_SCHEME") {
            return scheme.eq_ignore_ascii_case("dark");
        }
        std::env::var("GTK_THEME")
            .map(|theme| theme.to_lowercase().contains("dark"))
            .unwrap_or(false)
    }
}

/// Theme source with a fixed answer.
#[cfg(test)]
pub struct FixedTheme(pub bool);

#[cfg(test)]
impl ThemeSource for FixedTheme {
    fn shows_dark_colors(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mack_core::filesystem;
    use mack_core::native::{focus_window, DialogGuard};

    #[test]
    fn window_transitions() {
        let window = HeadlessWindow::new("main");
        window.show();
        window.maximize();
        window.minimize();
        assert!(window.is_minimized());
        assert!(window.is_maximized());

        focus_window(&window);
        let flags = window.flags();
        assert!(!flags.minimized && flags.focused && flags.visible);

        window.close();
        assert_eq!(
            window.flags(),
            WindowFlags {
                closed: true,
                ..WindowFlags::default()
            }
        );
        window.show();
        assert!(!window.is_closed());
    }

    #[test]
    fn console_dialog_takes_next_line() {
        let dialogs = Arc::new(ConsoleDialogs::new());
        assert!(!dialogs.answer("/tmp/x"));

        let worker = {
            let dialogs = dialogs.clone();
            std::thread::spawn(move || {
                let options = DialogOptions {
                    kind: DialogKind::Open,
                    filters: filesystem::default_filters(),
                };
                let mut guard = DialogGuard::open(dialogs.as_ref(), &options);
                guard.run()
            })
        };
        while !dialogs.is_waiting() {
            std::thread::yield_now();
        }
        assert!(dialogs.answer("  /tmp/notes.md "));
        assert_eq!(worker.join().unwrap(), Some(PathBuf::from("/tmp/notes.md")));
        assert!(!dialogs.is_waiting());
    }

    #[test]
    fn filter_check() {
        let text = vec![FileFilter::new("Text Files", &["txt", "md"])];
        assert!(within_filters(&text, Path::new("/tmp/notes.md")));
        assert!(!within_filters(&text, Path::new("/tmp/run.sh")));
        assert!(within_filters(&filesystem::default_filters(), Path::new("/tmp/run.sh")));
        assert!(within_filters(&[], Path::new("/tmp/run.sh")));
    }

    #[test]
    fn empty_line_cancels() {
        let dialogs = Arc::new(ConsoleDialogs::new());
        let worker = {
            let dialogs = dialogs.clone();
            std::thread::spawn(move || {
                let options = DialogOptions {
                    kind: DialogKind::Save {
                        default_path: "untitled.txt".to_string(),
                    },
                    filters: Vec::new(),
                };
                DialogGuard::open(dialogs.as_ref(), &options).run()
            })
        };
        while !dialogs.is_waiting() {
            std::thread::yield_now();
        }
        dialogs.answer("");
        assert_eq!(worker.join().unwrap(), None);
    }
}
