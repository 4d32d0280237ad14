mod config;
mod console;
mod context;
mod controller;
mod headless;
mod lifecycle;
mod menu;
mod shortcuts;
mod touch_bar;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use mack_bridge::view::ViewState;
use mack_core::native::Platform;
use mack_core::preferences::{self, PreferenceStore};

use crate::console::Console;
use crate::context::{AppContext, NativeServices};
use crate::controller::HostController;
use crate::headless::{ConsoleDialogs, HeadlessWindow, LogNotifier, SystemThemeProbe};
use crate::lifecycle::AppEvent;

/// Wait until a quit is requested. Returns false if the signal was lost
/// instead, which also ends the wait.
async fn wait_for_quit(mut quit: watch::Receiver<bool>) -> bool {
    match quit.wait_for(|requested| *requested).await {
        Ok(_) => true,
        Err(e) => {
            log::error!("Quit signal lost, shutting down: {}", e);
            false
        }
    }
}

fn main() {
    env_logger::init();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let config = config::load();
    let platform = Platform::current();
    let (width, height) = config.initial_size();
    log::info!(
        "Starting {} on {} ({}x{}, entry {})",
        menu::APP_NAME,
        platform.as_str(),
        width,
        height,
        config.entry
    );
    if platform.is_mac() {
        log::debug!(
            "Chrome: title bar {}, traffic lights at {:?}, vibrancy {:?}, background {}",
            config.title_bar_style,
            config.traffic_light_position,
            config.vibrancy,
            config.background_color
        );
    }
    if !config.web_preferences.is_isolated() {
        log::warn!("Content view is not isolated from the host");
    }

    let dialogs = Arc::new(ConsoleDialogs::new());
    let theme = Arc::new(SystemThemeProbe);
    let native = NativeServices {
        window: Arc::new(HeadlessWindow::new(menu::APP_NAME)),
        dialogs: dialogs.clone(),
        notifier: Arc::new(LogNotifier),
        theme: theme.clone(),
    };
    let ctx = AppContext::new(config, platform, native);

    let (view, pump, host) = mack_bridge::bridge(platform, theme);
    let controller = Arc::new(HostController::new(ctx, host.inbound()));
    controller.on_app_event(AppEvent::Ready);

    runtime.spawn(pump.run());
    let host_loop = {
        let controller = controller.clone();
        runtime.spawn(async move { controller.run(host).await })
    };

    let store = match preferences::default_store_path() {
        Some(path) => PreferenceStore::open(path),
        None => PreferenceStore::in_memory(),
    };
    match store.path() {
        Some(path) => log::info!("Preferences at {}", path.display()),
        None => log::info!("Preferences kept in memory"),
    }
    let state = ViewState::attach(view.clone(), Arc::new(store));

    let console = Console::new(
        controller.clone(),
        view,
        state,
        dialogs,
        runtime.handle().clone(),
    );
    if let Err(e) = console.spawn() {
        log::error!("Failed to start console: {}", e);
        std::process::exit(1);
    }

    let quit = controller.quit_signal();
    runtime.block_on(async {
        wait_for_quit(quit).await;
        // The loop may be parked in a dialog nobody will answer now.
        match tokio::time::timeout(Duration::from_millis(500), host_loop).await {
            Ok(Err(e)) => log::error!("Host loop failed: {}", e),
            Ok(Ok(())) => {}
            Err(_) => log::warn!("Host loop still busy at exit"),
        }
    });

    controller.on_app_event(AppEvent::WillQuit);
    log::info!("Goodbye");
    std::process::exit(0);
}
