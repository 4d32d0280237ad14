use serde_json::Value;

use mack_bridge::protocol::{sections, InboundChannel};

#[derive(Debug, Clone, PartialEq)]
pub enum TouchBarItem {
    Button {
        label: &'static str,
        background: &'static str,
        channel: InboundChannel,
        payload: Option<Value>,
    },
    /// Small fixed-width gap.
    Spacer,
}

const PRIMARY: &str = "#2563EB";
const SECONDARY: &str = "#3B82F6";

fn button(
    label: &'static str,
    background: &'static str,
    channel: InboundChannel,
    payload: Option<&str>,
) -> TouchBarItem {
    TouchBarItem::Button {
        label,
        background,
        channel,
        payload: payload.map(|p| Value::String(p.to_string())),
    }
}

/// Touch bar layout: section shortcuts, search and voice, separated by
/// small spacers.
pub fn build_touch_bar() -> Vec<TouchBarItem> {
    let buttons = [
        button(
            "🏠 Dashboard",
            PRIMARY,
            InboundChannel::Navigate,
            Some(sections::DASHBOARD),
        ),
        button(
            "💬 Conversation",
            SECONDARY,
            InboundChannel::Navigate,
            Some(sections::CONVERSATION),
        ),
        button(
            "📝 Code",
            SECONDARY,
            InboundChannel::Navigate,
            Some(sections::CODE),
        ),
        button("🔍 Search", SECONDARY, InboundChannel::FocusSearch, None),
        button("🎤 Voice", SECONDARY, InboundChannel::ToggleVoice, None),
    ];

    let mut items = Vec::with_capacity(buttons.len() * 2 - 1);
    for (i, item) in buttons.into_iter().enumerate() {
        if i > 0 {
            items.push(TouchBarItem::Spacer);
        }
        items.push(item);
    }
    items
}

/// Find a button by label, ignoring the leading emoji.
pub fn find_button<'a>(items: &'a [TouchBarItem], name: &str) -> Option<&'a TouchBarItem> {
    items.iter().find(|item| match item {
        TouchBarItem::Button { label, .. } => {
            *label == name || label.split_once(' ').map(|(_, rest)| rest) == Some(name)
        }
        TouchBarItem::Spacer => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_alternate_with_spacers() {
        let items = build_touch_bar();
        assert_eq!(items.len(), 9);
        for (i, item) in items.iter().enumerate() {
            let is_spacer = matches!(item, TouchBarItem::Spacer);
            assert_eq!(is_spacer, i % 2 == 1, "item {}", i);
        }
    }

    #[test]
    fn find_by_plain_name() {
        let items = build_touch_bar();
        match find_button(&items, "Code") {
            Some(TouchBarItem::Button {
                channel, payload, ..
            }) => {
                assert_eq!(*channel, InboundChannel::Navigate);
                assert_eq!(payload.as_ref().and_then(Value::as_str), Some("code"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(find_button(&items, "🎤 Voice").is_some());
        assert!(find_button(&items, "Settings").is_none());
    }
}
