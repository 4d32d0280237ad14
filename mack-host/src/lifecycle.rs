use mack_core::native::Platform;

/// Application-level events delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Ready,
    WindowAllClosed,
    /// Dock icon clicked or app re-launched.
    Activate { open_windows: usize },
    WillQuit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    CreateWindow,
    Quit,
    UnregisterShortcuts,
    Nothing,
}

/// What the host does in response to `event`.
///
/// macOS apps stay alive with no windows and recreate one on activation;
/// everywhere else closing the last window quits.
pub fn on_event(event: AppEvent, platform: Platform) -> LifecycleAction {
    match event {
        AppEvent::Ready => LifecycleAction::CreateWindow,
        AppEvent::WindowAllClosed if platform.is_mac() => LifecycleAction::Nothing,
        AppEvent::WindowAllClosed => LifecycleAction::Quit,
        AppEvent::Activate { open_windows: 0 } => LifecycleAction::CreateWindow,
        AppEvent::Activate { .. } => LifecycleAction::Nothing,
        AppEvent::WillQuit => LifecycleAction::UnregisterShortcuts,
    }
}
