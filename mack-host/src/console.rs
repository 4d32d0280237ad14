// ---------------------------------------------------------------------------
// Interactive console
// ---------------------------------------------------------------------------
//
// Drives the view side of the bridge from stdin when the shell runs without
// a native frontend. Every line is offered to an open file dialog first;
// otherwise it is parsed as one of:
//
//   <channel> [payload]       send on an outbound channel
//   invoke <op> [payload]     request/response, result printed when it lands
//   menu [A/B/C]              click a menu item, or list menu shortcuts
//   touch <name>              tap a touch bar button
//   touchbar                  list the touch bar
//   shortcut <accelerator>    press a global shortcut
//   theme <light|dark|system|cycle>
//   state                     print the view state
//   activate                  as if the dock icon were clicked
//   quit
//
// Payloads are JSON; anything that does not parse is sent as a string.

use serde_json::Value;
use std::io::BufRead;
use std::sync::Arc;
use std::thread::JoinHandle;

use mack_bridge::protocol::InboundChannel;
use mack_bridge::view::ViewState;
use mack_bridge::ViewBridge;
use mack_core::preferences::ThemePreference;

use crate::controller::HostController;
use crate::headless::ConsoleDialogs;
use crate::lifecycle::AppEvent;
use crate::menu;
use crate::shortcuts::{accel_to_display, parse_accelerator};
use crate::touch_bar::TouchBarItem;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send {
        channel: String,
        payload: Option<Value>,
    },
    Invoke {
        operation: String,
        payload: Option<Value>,
    },
    Menu(String),
    Touch(String),
    TouchBar,
    Shortcut(String),
    Theme(String),
    State,
    Activate,
    Help,
    Quit,
}

fn parse_payload(raw: &str) -> Option<Value> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
}

/// Parse one console line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match head {
        "quit" | "exit" => Command::Quit,
        "help" | "?" => Command::Help,
        "state" => Command::State,
        "activate" => Command::Activate,
        "touchbar" => Command::TouchBar,
        "menu" => Command::Menu(rest.to_string()),
        "touch" => Command::Touch(rest.to_string()),
        "shortcut" => Command::Shortcut(rest.to_string()),
        "theme" => Command::Theme(rest.to_string()),
        "invoke" => {
            let (operation, payload) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            Command::Invoke {
                operation: operation.to_string(),
                payload: parse_payload(payload),
            }
        }
        channel => Command::Send {
            channel: channel.to_string(),
            payload: parse_payload(rest),
        },
    };
    Some(command)
}

pub fn render_touch_bar(items: &[TouchBarItem]) -> String {
    let parts: Vec<String> = items
        .iter()
        .map(|item| match item {
            TouchBarItem::Button {
                label, background, ..
            } => format!("[{} {}]", label, background),
            TouchBarItem::Spacer => " ".to_string(),
        })
        .collect();
    parts.join("")
}

const HELP: &str = "\
commands:
  <channel> [payload]      app-close, app-minimize, app-maximize, open-file, save-file, ...
  invoke <op> [payload]    open-file, save-file, get-system-theme
  menu [A/B/C]             e.g. menu View/Theme/Dark; bare 'menu' lists shortcuts
  touch <name>             e.g. touch Code
  touchbar
  shortcut <accelerator>   e.g. shortcut Alt+Space
  theme <light|dark|system|cycle>
  state
  activate
  quit";

pub struct Console {
    controller: Arc<HostController>,
    view: ViewBridge,
    state: ViewState,
    dialogs: Arc<ConsoleDialogs>,
    runtime: tokio::runtime::Handle,
}

impl Console {
    pub fn new(
        controller: Arc<HostController>,
        view: ViewBridge,
        state: ViewState,
        dialogs: Arc<ConsoleDialogs>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        for channel in InboundChannel::ALL {
            let name = channel.as_str();
            view.receive(name, move |payload| match payload {
                Some(payload) => println!("<- {} {}", name, payload),
                None => println!("<- {}", name),
            });
        }
        Console {
            controller,
            view,
            state,
            dialogs,
            runtime,
        }
    }

    /// Read stdin on a dedicated thread until `quit` or EOF.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("mack-console".to_string())
            .spawn(move || self.read_loop())
    }

    fn read_loop(self) {
        println!(
            "Mack AI on {} ({} mode). Type 'help' for commands.",
            self.view.platform(),
            if self.view.is_dark_mode() { "dark" } else { "light" }
        );
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::error!("Failed to read console input: {}", e);
                    break;
                }
            };
            if self.dialogs.answer(&line) {
                continue;
            }
            let Some(command) = parse_command(&line) else {
                continue;
            };
            if !self.execute(command) {
                return;
            }
        }
        self.controller.request_quit();
    }

    /// Run one command. Returns false when the console should stop.
    ///
    /// Anything that may open a dialog is spawned onto the runtime so this
    /// thread stays free to read the dialog's answer.
    pub fn execute(&self, command: Command) -> bool {
        match command {
            Command::Send { channel, payload } => self.view.send(&channel, payload),
            Command::Invoke { operation, payload } => {
                let view = self.view.clone();
                self.runtime.spawn(async move {
                    match view.invoke(&operation, payload).await {
                        Ok(Some(value)) => println!("{} => {}", operation, value),
                        Ok(None) => println!("{} => (nothing)", operation),
                        Err(e) => println!("{} failed: {}", operation, e),
                    }
                });
            }
            Command::Menu(path) if path.is_empty() => {
                let platform = self.controller.context().platform;
                for (path, accel) in menu::accelerators(&self.controller.context().menu) {
                    let shown = parse_accelerator(&accel, platform)
                        .map(|parsed| accel_to_display(&parsed, platform))
                        .unwrap_or(accel);
                    println!("  {:<32} {}", path, shown);
                }
            }
            Command::Menu(path) => {
                let controller = self.controller.clone();
                self.runtime.spawn(async move {
                    if !controller.click_menu(&path).await {
                        println!("No enabled menu item at '{}'", path);
                    }
                });
            }
            Command::Touch(name) => {
                if !self.controller.tap_touch_bar(&name) {
                    println!("No touch bar button '{}'", name);
                }
            }
            Command::TouchBar => {
                let items = &self.controller.context().touch_bar;
                if items.is_empty() {
                    println!("No touch bar on this platform");
                } else {
                    println!("{}", render_touch_bar(items));
                }
            }
            Command::Shortcut(accel) => {
                let platform = self.controller.context().platform;
                match parse_accelerator(&accel, platform) {
                    Some(parsed) => {
                        if !self.controller.press_shortcut(&parsed) {
                            println!("{} is not registered", accel_to_display(&parsed, platform));
                        }
                    }
                    None => println!("Cannot parse accelerator '{}'", accel),
                }
            }
            Command::Theme(name) => {
                if name == "cycle" {
                    self.state.cycle_theme();
                } else {
                    match name.parse::<ThemePreference>() {
                        Ok(theme) => self.state.set_theme(theme),
                        Err(e) => println!("{}", e),
                    }
                }
            }
            Command::State => {
                println!("{:#?}", self.state.snapshot());
                println!("rendering {}", self.state.effective_theme().as_str());
            }
            Command::Activate => {
                let open_windows = usize::from(!self.controller.context().window().is_closed());
                self.controller
                    .on_app_event(AppEvent::Activate { open_windows });
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => {
                self.controller.request_quit();
                return false;
            }
        }
        true
    }
}
