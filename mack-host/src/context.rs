use parking_lot::Mutex;
use std::sync::Arc;

use mack_core::native::{NativeDialogs, Notifier, Platform, ThemeSource, WindowControl};

use crate::config::AppConfig;
use crate::menu::{self, MenuItem};
use crate::shortcuts::ShortcutRegistry;
use crate::touch_bar::{self, TouchBarItem};

/// Native services the host drives.
#[derive(Clone)]
pub struct NativeServices {
    pub window: Arc<dyn WindowControl>,
    pub dialogs: Arc<dyn NativeDialogs>,
    pub notifier: Arc<dyn Notifier>,
    pub theme: Arc<dyn ThemeSource>,
}

/// Everything the host's components share for the lifetime of one run.
///
/// Created when the app starts and dropped when it stops; the menu builder,
/// shortcut registrar and dialog handlers all receive it explicitly.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub platform: Platform,
    pub native: NativeServices,
    pub menu: Arc<Vec<MenuItem>>,
    /// Empty off macOS.
    pub touch_bar: Arc<Vec<TouchBarItem>>,
    pub shortcuts: Arc<Mutex<ShortcutRegistry>>,
}

impl AppContext {
    pub fn new(config: AppConfig, platform: Platform, native: NativeServices) -> Self {
        let touch_bar = if platform.is_mac() {
            touch_bar::build_touch_bar()
        } else {
            Vec::new()
        };
        let shortcuts = ShortcutRegistry::register_defaults(&config.shortcuts, platform);
        log::info!(
            "Registered {} global shortcut(s) for {}",
            shortcuts.len(),
            platform.as_str()
        );
        AppContext {
            menu: Arc::new(menu::build_menu(platform)),
            touch_bar: Arc::new(touch_bar),
            shortcuts: Arc::new(Mutex::new(shortcuts)),
            config: Arc::new(config),
            platform,
            native,
        }
    }

    pub fn window(&self) -> &dyn WindowControl {
        self.native.window.as_ref()
    }
}
