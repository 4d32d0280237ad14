use serde_json::Value;

use mack_bridge::protocol::{sections, InboundChannel, ThemePreference};
use mack_core::native::Platform;

pub const APP_NAME: &str = "Mack AI";

/// What clicking a menu item asks the host to do.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuAction {
    /// Forward an inbound message to the view.
    Emit {
        channel: InboundChannel,
        payload: Option<Value>,
    },
    /// Run the host's open-file flow; the view gets `file-opened`.
    OpenFile,
}

/// Items whose behaviour the platform supplies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    About,
    Services,
    Hide,
    HideOthers,
    Unhide,
    Quit,
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    Delete,
    SelectAll,
    ToggleFullScreen,
    Minimize,
    Zoom,
    Front,
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MenuItem {
    /// A labelled item. `action: None` renders disabled.
    Action {
        label: String,
        accelerator: Option<String>,
        action: Option<MenuAction>,
    },
    Role(Role),
    Separator,
    Submenu {
        label: String,
        items: Vec<MenuItem>,
    },
}

impl MenuItem {
    pub fn label(&self) -> Option<&str> {
        match self {
            MenuItem::Action { label, .. } | MenuItem::Submenu { label, .. } => Some(label),
            MenuItem::Role(_) | MenuItem::Separator => None,
        }
    }
}

fn emit(label: &str, accelerator: &str, channel: InboundChannel) -> MenuItem {
    emit_with(label, accelerator, channel, None)
}

fn emit_with(
    label: &str,
    accelerator: &str,
    channel: InboundChannel,
    payload: Option<Value>,
) -> MenuItem {
    MenuItem::Action {
        label: label.to_string(),
        accelerator: (!accelerator.is_empty()).then(|| accelerator.to_string()),
        action: Some(MenuAction::Emit { channel, payload }),
    }
}

fn navigate(label: &str, accelerator: &str, section: &str) -> MenuItem {
    emit_with(
        label,
        accelerator,
        InboundChannel::Navigate,
        Some(Value::String(section.to_string())),
    )
}

fn submenu(label: &str, items: Vec<MenuItem>) -> MenuItem {
    MenuItem::Submenu {
        label: label.to_string(),
        items,
    }
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

/// The application menu bar for `platform`.
pub fn build_menu(platform: Platform) -> Vec<MenuItem> {
    vec![
        app_menu(platform),
        file_menu(),
        edit_menu(),
        view_menu(),
        window_menu(platform),
        help_menu(),
    ]
}

fn app_menu(platform: Platform) -> MenuItem {
    let mut items = vec![
        MenuItem::Role(Role::About),
        MenuItem::Separator,
        emit(
            "Preferences...",
            "CommandOrControl+,",
            InboundChannel::OpenPreferences,
        ),
        MenuItem::Separator,
    ];
    if platform.is_mac() {
        items.extend([
            MenuItem::Role(Role::Services),
            MenuItem::Separator,
            MenuItem::Role(Role::Hide),
            MenuItem::Role(Role::HideOthers),
            MenuItem::Role(Role::Unhide),
            MenuItem::Separator,
        ]);
    }
    items.push(MenuItem::Role(Role::Quit));
    submenu(APP_NAME, items)
}

fn file_menu() -> MenuItem {
    submenu(
        "File",
        vec![
            emit(
                "New Conversation",
                "CommandOrControl+N",
                InboundChannel::NewConversation,
            ),
            emit(
                "New Project",
                "Shift+CommandOrControl+N",
                InboundChannel::NewProject,
            ),
            MenuItem::Separator,
            MenuItem::Action {
                label: "Open...".to_string(),
                accelerator: Some("CommandOrControl+O".to_string()),
                action: Some(MenuAction::OpenFile),
            },
            // Saving needs the view's content, so it starts from the view.
            MenuItem::Action {
                label: "Save".to_string(),
                accelerator: Some("CommandOrControl+S".to_string()),
                action: None,
            },
            MenuItem::Action {
                label: "Export...".to_string(),
                accelerator: Some("Shift+CommandOrControl+E".to_string()),
                action: None,
            },
        ],
    )
}

fn edit_menu() -> MenuItem {
    submenu(
        "Edit",
        vec![
            MenuItem::Role(Role::Undo),
            MenuItem::Role(Role::Redo),
            MenuItem::Separator,
            MenuItem::Role(Role::Cut),
            MenuItem::Role(Role::Copy),
            MenuItem::Role(Role::Paste),
            MenuItem::Role(Role::Delete),
            MenuItem::Role(Role::SelectAll),
            MenuItem::Separator,
            emit("Find", "CommandOrControl+F", InboundChannel::Find),
            MenuItem::Separator,
            submenu(
                "Speech",
                vec![
                    emit("Start Speaking", "", InboundChannel::StartSpeaking),
                    emit("Stop Speaking", "", InboundChannel::StopSpeaking),
                ],
            ),
        ],
    )
}

fn view_menu() -> MenuItem {
    let themes = ThemePreference::ALL
        .iter()
        .map(|theme| {
            let label = match theme {
                ThemePreference::Light => "Light",
                ThemePreference::Dark => "Dark",
                ThemePreference::System => "System",
            };
            emit_with(
                label,
                "",
                InboundChannel::SetTheme,
                Some(Value::String(theme.as_str().to_string())),
            )
        })
        .collect();

    submenu(
        "View",
        vec![
            navigate("Dashboard", "CommandOrControl+1", sections::DASHBOARD),
            navigate("Conversation", "CommandOrControl+2", sections::CONVERSATION),
            navigate("Code", "CommandOrControl+3", sections::CODE),
            navigate("Neural Network", "CommandOrControl+4", sections::NEURAL),
            navigate("Speech", "CommandOrControl+5", sections::SPEECH),
            MenuItem::Separator,
            emit(
                "Toggle Sidebar",
                "CommandOrControl+B",
                InboundChannel::ToggleSidebar,
            ),
            emit("Search", "CommandOrControl+K", InboundChannel::FocusSearch),
            emit("Voice Input", "", InboundChannel::ToggleVoice),
            MenuItem::Separator,
            submenu("Theme", themes),
            MenuItem::Separator,
            MenuItem::Role(Role::ToggleFullScreen),
        ],
    )
}

fn window_menu(platform: Platform) -> MenuItem {
    let mut items = vec![MenuItem::Role(Role::Minimize), MenuItem::Role(Role::Zoom)];
    if platform.is_mac() {
        items.push(MenuItem::Separator);
        items.push(MenuItem::Role(Role::Front));
    } else {
        items.push(MenuItem::Role(Role::Close));
    }
    submenu("Window", items)
}

fn help_menu() -> MenuItem {
    submenu(
        "Help",
        vec![
            emit("Documentation", "", InboundChannel::OpenDocumentation),
            emit(
                "Keyboard Shortcuts",
                "CommandOrControl+/",
                InboundChannel::OpenShortcuts,
            ),
            MenuItem::Separator,
            emit("Send Feedback", "", InboundChannel::SendFeedback),
            emit("Check for Updates...", "", InboundChannel::CheckUpdates),
        ],
    )
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Find an item by its label path, e.g. `"Edit/Speech/Start Speaking"`.
pub fn find_item<'a>(menu: &'a [MenuItem], path: &str) -> Option<&'a MenuItem> {
    let mut items = menu;
    let mut segments = path.split('/').peekable();
    while let Some(segment) = segments.next() {
        let item = items.iter().find(|item| item.label() == Some(segment))?;
        if segments.peek().is_none() {
            return Some(item);
        }
        match item {
            MenuItem::Submenu { items: children, .. } => items = children,
            _ => return None,
        }
    }
    None
}

/// The action behind an enabled item at `path`.
pub fn find_action<'a>(menu: &'a [MenuItem], path: &str) -> Option<&'a MenuAction> {
    match find_item(menu, path)? {
        MenuItem::Action { action, .. } => action.as_ref(),
        _ => None,
    }
}

/// Every `(label path, accelerator)` pair in menu order.
pub fn accelerators(menu: &[MenuItem]) -> Vec<(String, String)> {
    fn walk(items: &[MenuItem], prefix: &str, out: &mut Vec<(String, String)>) {
        for item in items {
            match item {
                MenuItem::Action {
                    label,
                    accelerator: Some(accel),
                    ..
                } => out.push((format!("{}{}", prefix, label), accel.clone())),
                MenuItem::Submenu { label, items } => {
                    walk(items, &format!("{}{}/", prefix, label), out)
                }
                _ => {}
            }
        }
    }
    let mut out = Vec::new();
    walk(menu, "", &mut out);
    out
}
