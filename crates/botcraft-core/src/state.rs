//! UI-agnostic session state types
//!
//! This module contains the conversation store and the view selectors that any
//! front end (the terminal UI today) renders from. Nothing here depends on a
//! specific UI framework.

use serde::{Deserialize, Serialize};

/// Number of characters of a message shown in the activity summary
pub const ACTIVITY_PREVIEW_CHARS: usize = 50;

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
        }
    }
}

/// A single entry of the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered, append-only list of exchanged messages
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Which panel occupies the main area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Conversation,
    Help,
    Activity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Whether a request is currently outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Sending,
}

/// Chrome state of the session: tab, sidebar, theme and the simulated deploy link
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub active_tab: Tab,
    pub sidebar_open: bool,
    pub theme: Theme,
    pub last_deploy_link: Option<String>,
}

/// One-line summary of a message for the activity panel.
///
/// Content longer than [`ACTIVITY_PREVIEW_CHARS`] characters is cut there and
/// followed by `...`; shorter content is shown whole without a marker.
pub fn activity_line(message: &Message) -> String {
    let flat: String = message
        .content()
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    let preview = if flat.chars().count() > ACTIVITY_PREVIEW_CHARS {
        let cut: String = flat.chars().take(ACTIVITY_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        flat
    };

    format!("{}: {}", message.role().label(), preview)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_preserves_order() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("first"));
        conversation.push(Message::assistant("second"));
        conversation.push(Message::user("third"));

        let contents: Vec<&str> = conversation.iter().map(|m| m.content()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(conversation.last().map(|m| m.role()), Some(Role::User));
    }

    #[test]
    fn test_push_never_touches_existing_entries() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("hello"));
        let snapshot = conversation.messages().to_vec();

        conversation.push(Message::assistant("hi there"));

        assert_eq!(&conversation.messages()[..1], snapshot.as_slice());
    }

    #[test]
    fn test_clear_empties() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("hello"));
        conversation.clear();
        assert!(conversation.is_empty());
        conversation.clear();
        assert_eq!(conversation.len(), 0);
    }

    #[test]
    fn test_activity_line_short_content_untouched() {
        let line = activity_line(&Message::user("Tell me a joke"));
        assert_eq!(line, "You: Tell me a joke");
    }

    #[test]
    fn test_activity_line_exactly_fifty_has_no_ellipsis() {
        let content = "a".repeat(50);
        let line = activity_line(&Message::assistant(content.clone()));
        assert_eq!(line, format!("Assistant: {}", content));
    }

    #[test]
    fn test_activity_line_forty_nine() {
        let content = "b".repeat(49);
        let line = activity_line(&Message::user(content.clone()));
        assert_eq!(line, format!("You: {}", content));
    }

    #[test]
    fn test_activity_line_fifty_one_truncates() {
        let content = format!("{}Z", "c".repeat(50));
        let line = activity_line(&Message::user(content));
        assert_eq!(line, format!("You: {}...", "c".repeat(50)));
    }

    #[test]
    fn test_activity_line_counts_chars_not_bytes() {
        let content = "é".repeat(60);
        let line = activity_line(&Message::assistant(content));
        assert_eq!(line, format!("Assistant: {}...", "é".repeat(50)));
    }

    #[test]
    fn test_activity_line_flattens_newlines() {
        let line = activity_line(&Message::assistant("line one\nline two"));
        assert_eq!(line, "Assistant: line one line two");
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().toggled(), Theme::Dark);
        assert_eq!(Theme::default(), Theme::Light);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::user("x")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"x"}"#);
    }
}
