//! Conversation messages and their roles.

use serde::{Deserialize, Serialize};

/// Class carried by every rendered message node.
pub const MESSAGE_CLASS: &str = "message";

/// Author of a rendered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Text the user submitted through the form.
    User,
    /// Answer returned by the backend.
    Bot,
}

impl MessageRole {
    /// Style class specific to this role.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::User => "user-message",
            Self::Bot => "bot-message",
        }
    }

    /// Full class list for a node rendering this role, e.g. `message user-message`.
    #[must_use]
    pub fn class_name(self) -> String {
        format!("{MESSAGE_CLASS} {}", self.css_class())
    }

    /// Recover the role from a node's class list.
    #[must_use]
    pub fn from_class_name(class_name: &str) -> Option<Self> {
        class_name
            .split_whitespace()
            .find_map(|class| match class {
                "user-message" => Some(Self::User),
                "bot-message" => Some(Self::Bot),
                _ => None,
            })
    }
}

/// A single message in the conversation view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub role: MessageRole,
    /// Plain text content. Never interpreted as markup.
    pub text: String,
}

impl Message {
    /// Create a user message.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
        }
    }

    /// Create a bot message.
    #[must_use]
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Bot,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_names() {
        assert_eq!(MessageRole::User.class_name(), "message user-message");
        assert_eq!(MessageRole::Bot.class_name(), "message bot-message");
    }

    #[test]
    fn test_role_from_class_name() {
        assert_eq!(
            MessageRole::from_class_name("message bot-message error-message"),
            Some(MessageRole::Bot)
        );
        assert_eq!(
            MessageRole::from_class_name("message user-message"),
            Some(MessageRole::User)
        );
        assert_eq!(MessageRole::from_class_name("message"), None);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::bot("Hi there")).unwrap();
        assert_eq!(json, r#"{"role":"bot","text":"Hi there"}"#);
    }
}
