use serde_json::Value;
use tokio::sync::watch;

use mack_bridge::protocol::{
    from_payload, to_payload, FileHandle, SaveRequest, SavedFile, SystemTheme,
};
use mack_bridge::{
    HostBridge, HostInput, InboundChannel, InboundMessage, InboundSender, Operation,
    OutboundChannel, OutboundMessage, PendingRequest,
};
use mack_core::native::{focus_window, Notification};
use mack_core::{filesystem, HostError};

use crate::config;
use crate::context::AppContext;
use crate::lifecycle::{self, AppEvent, LifecycleAction};
use crate::menu::{self, MenuAction};
use crate::shortcuts::{GlobalAction, ParsedAccel};
use crate::touch_bar::{self, TouchBarItem};

/// The host's half of the bridge: the only place a channel name turns into
/// a privileged action.
pub struct HostController {
    ctx: AppContext,
    inbound: InboundSender,
    quit: watch::Sender<bool>,
}

impl HostController {
    pub fn new(ctx: AppContext, inbound: InboundSender) -> Self {
        let (quit, _) = watch::channel(false);
        HostController { ctx, inbound, quit }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Serve the view until it goes away or a quit is requested.
    ///
    /// On quit, requests still queued are answered with
    /// [`HostError::Unavailable`] and queued messages are dropped.
    pub async fn run(&self, mut bridge: HostBridge) {
        let mut quit = self.quit_signal();
        loop {
            tokio::select! {
                biased;
                _ = async { quit.wait_for(|requested| *requested).await.map(drop) } => break,
                input = bridge.next() => match input {
                    Some(input) => self.dispatch(input).await,
                    None => {
                        log::info!("View disconnected; host loop finished");
                        return;
                    }
                },
            }
        }

        let mut refused = 0;
        while let Some(input) = bridge.try_next() {
            if let HostInput::Request(request) = input {
                request.respond(Err(HostError::Unavailable));
                refused += 1;
            }
        }
        log::info!("Quit requested; host loop finished ({} request(s) refused)", refused);
    }

    pub async fn dispatch(&self, input: HostInput) {
        match input {
            HostInput::Message(message) => self.handle_message(message).await,
            HostInput::Request(request) => self.handle_request(request).await,
        }
    }

    // ── Outbound messages ────────────────────────────────────────────────

    pub async fn handle_message(&self, message: OutboundMessage) {
        let window = self.ctx.window();
        match message.channel {
            OutboundChannel::AppReady => {
                log::info!("Content view ready");
                window.show();
                window.focus();
            }
            OutboundChannel::AppClose => {
                window.close();
                self.on_app_event(AppEvent::WindowAllClosed);
            }
            OutboundChannel::AppMinimize => window.minimize(),
            OutboundChannel::AppMaximize => {
                if window.is_maximized() {
                    window.unmaximize();
                } else {
                    window.maximize();
                }
            }
            OutboundChannel::OpenFile => self.open_and_announce().await,
            OutboundChannel::SaveFile => {
                match from_payload::<SaveRequest>(message.payload.as_ref()) {
                    Some(request) => {
                        if let Ok(Some(saved)) = self.save_file(request).await {
                            self.inbound.emit_message(InboundMessage::with_payload(
                                InboundChannel::FileSaved,
                                &saved,
                            ));
                        }
                    }
                    None => log::warn!("save-file without a {{path?, content}} payload; ignored"),
                }
            }
            OutboundChannel::ExportFile => log::debug!("export-file has no host action"),
            channel => {
                if let Some(reflected) = channel.reflected() {
                    self.inbound.emit(reflected, message.payload);
                }
            }
        }
    }

    // ── Request/response ─────────────────────────────────────────────────

    pub async fn handle_request(&self, request: PendingRequest) {
        let result = match request.operation {
            Operation::OpenFile => self
                .open_file()
                .await
                .map(|file| file.and_then(|f| to_payload(&f))),
            Operation::SaveFile => match from_payload::<SaveRequest>(request.payload.as_ref()) {
                Some(save) => self
                    .save_file(save)
                    .await
                    .map(|saved| saved.and_then(|s| to_payload(&s))),
                None => {
                    log::error!("File save error: request has no content");
                    Err(HostError::SaveFailed)
                }
            },
            Operation::GetSystemTheme => Ok(Some(Value::String(
                self.system_theme().as_str().to_string(),
            ))),
        };
        request.respond(result);
    }

    pub fn system_theme(&self) -> SystemTheme {
        SystemTheme::from_dark(self.ctx.native.theme.shows_dark_colors())
    }

    pub async fn open_file(&self) -> Result<Option<FileHandle>, HostError> {
        filesystem::open_file(self.ctx.native.dialogs.clone()).await
    }

    pub async fn save_file(&self, request: SaveRequest) -> Result<Option<SavedFile>, HostError> {
        let saved = filesystem::save_file(self.ctx.native.dialogs.clone(), request).await?;
        if let Some(saved) = &saved {
            if self.ctx.platform.is_mac() {
                self.notify(
                    "File Saved",
                    &format!("Saved to {}", mack_core::display_name(&saved.path)),
                );
            }
        }
        Ok(saved)
    }

    async fn open_and_announce(&self) {
        if let Ok(Some(file)) = self.open_file().await {
            self.inbound.emit_message(InboundMessage::with_payload(
                InboundChannel::FileOpened,
                &file,
            ));
        }
    }

    fn notify(&self, title: &str, body: &str) {
        let notifier = &self.ctx.native.notifier;
        if !notifier.is_supported() {
            return;
        }
        let window = self.ctx.native.window.clone();
        notifier.show(
            Notification {
                title: title.to_string(),
                body: body.to_string(),
                silent: true,
            },
            Box::new(move || focus_window(window.as_ref())),
        );
    }

    // ── OS events → inbound messages ─────────────────────────────────────

    pub async fn run_menu_action(&self, action: &MenuAction) {
        match action {
            MenuAction::Emit { channel, payload } => self.inbound.emit(*channel, payload.clone()),
            MenuAction::OpenFile => self.open_and_announce().await,
        }
    }

    /// Click the menu item at `path`. Returns false for unknown or
    /// disabled items.
    pub async fn click_menu(&self, path: &str) -> bool {
        let Some(action) = menu::find_action(&self.ctx.menu, path).cloned() else {
            return false;
        };
        self.run_menu_action(&action).await;
        true
    }

    pub fn tap_touch_bar(&self, name: &str) -> bool {
        match touch_bar::find_button(&self.ctx.touch_bar, name) {
            Some(TouchBarItem::Button {
                channel, payload, ..
            }) => {
                self.inbound.emit(*channel, payload.clone());
                true
            }
            _ => false,
        }
    }

    pub fn press_shortcut(&self, pressed: &ParsedAccel) -> bool {
        let action = self.ctx.shortcuts.lock().lookup(pressed);
        match action {
            Some(GlobalAction::ActivateApp) => focus_window(self.ctx.window()),
            Some(GlobalAction::VoiceInput) => self.inbound.emit(InboundChannel::ToggleVoice, None),
            None => return false,
        }
        true
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    pub fn on_app_event(&self, event: AppEvent) -> LifecycleAction {
        let action = lifecycle::on_event(event, self.ctx.platform);
        match action {
            LifecycleAction::CreateWindow => {
                let window = self.ctx.window();
                window.show();
                if config::is_development() {
                    window.open_dev_tools();
                }
            }
            LifecycleAction::Quit => self.request_quit(),
            LifecycleAction::UnregisterShortcuts => self.ctx.shortcuts.lock().unregister_all(),
            LifecycleAction::Nothing => {}
        }
        action
    }

    pub fn request_quit(&self) {
        self.quit.send_replace(true);
    }

    pub fn quit_signal(&self) -> watch::Receiver<bool> {
        self.quit.subscribe()
    }
}
