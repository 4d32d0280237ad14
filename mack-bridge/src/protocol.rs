use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub use mack_core::filesystem::{FileHandle, SaveRequest, SavedFile};
pub use mack_core::preferences::{SystemTheme, ThemePreference};

/// Declares a closed set of channel names with their wire spelling.
macro_rules! channels {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownChannel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(UnknownChannel),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// A channel name outside the allow-list for its direction. Carries no
/// detail on purpose; callers drop the message without reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownChannel;

// ---------------------------------------------------------------------------
// Outbound: view → host
// ---------------------------------------------------------------------------

channels! {
    OutboundChannel {
        AppReady => "app-ready",
        AppClose => "app-close",
        AppMinimize => "app-minimize",
        AppMaximize => "app-maximize",
        NewConversation => "new-conversation",
        NewProject => "new-project",
        OpenFile => "open-file",
        SaveFile => "save-file",
        ExportFile => "export-file",
        ToggleSidebar => "toggle-sidebar",
        ToggleVoice => "toggle-voice",
    }
}

// ---------------------------------------------------------------------------
// Inbound: host → view
// ---------------------------------------------------------------------------

channels! {
    InboundChannel {
        Navigate => "navigate",
        FocusSearch => "focus-search",
        ToggleVoice => "toggle-voice",
        OpenPreferences => "open-preferences",
        NewConversation => "new-conversation",
        NewProject => "new-project",
        FileOpened => "file-opened",
        FileSaved => "file-saved",
        Find => "find",
        StartSpeaking => "start-speaking",
        StopSpeaking => "stop-speaking",
        ToggleSidebar => "toggle-sidebar",
        SetTheme => "set-theme",
        OpenDocumentation => "open-documentation",
        OpenShortcuts => "open-shortcuts",
        SendFeedback => "send-feedback",
        CheckUpdates => "check-updates",
    }
}

// ---------------------------------------------------------------------------
// Request/response operations
// ---------------------------------------------------------------------------

channels! {
    Operation {
        OpenFile => "open-file",
        SaveFile => "save-file",
        GetSystemTheme => "get-system-theme",
    }
}

impl OutboundChannel {
    /// Inbound channel that carries the same request back to the view, for
    /// the channels the host simply reflects.
    pub fn reflected(self) -> Option<InboundChannel> {
        match self {
            OutboundChannel::NewConversation => Some(InboundChannel::NewConversation),
            OutboundChannel::NewProject => Some(InboundChannel::NewProject),
            OutboundChannel::ToggleSidebar => Some(InboundChannel::ToggleSidebar),
            OutboundChannel::ToggleVoice => Some(InboundChannel::ToggleVoice),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: OutboundChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub channel: InboundChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl InboundMessage {
    pub fn with_payload(channel: InboundChannel, payload: impl Serialize) -> Self {
        InboundMessage {
            channel,
            payload: to_payload(payload),
        }
    }
}

/// Serialize a typed payload. Types in this module never fail to serialize;
/// anything that does is logged and sent without a payload.
pub fn to_payload(value: impl Serialize) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            log::error!("Failed to serialize payload: {}", e);
            None
        }
    }
}

/// Decode a payload into `T`, treating a missing payload as JSON `null`.
pub fn from_payload<T: serde::de::DeserializeOwned>(payload: Option<&Value>) -> Option<T> {
    serde_json::from_value(payload.cloned().unwrap_or(Value::Null)).ok()
}

// ---------------------------------------------------------------------------
// Navigation targets
// ---------------------------------------------------------------------------

/// Section identifiers the chrome navigates to.
pub mod sections {
    pub const DASHBOARD: &str = "dashboard";
    pub const CONVERSATION: &str = "conversation";
    pub const NEW_PROJECT: &str = "new-project";
    pub const CODE: &str = "code";
    pub const NEURAL: &str = "neural";
    pub const SPEECH: &str = "speech";
    pub const SETTINGS: &str = "settings";
}
