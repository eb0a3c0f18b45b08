//! Role-tagged chat messages
//!
//! These types are shared between the transport (where they are serialized
//! as the request history) and the UIs (where they are projected into log
//! entries). They don't depend on any specific UI framework.

use serde::{Deserialize, Serialize};

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// The role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Glyph shown in front of each log entry
    pub fn icon(&self) -> &'static str {
        match self {
            Role::User => "🧑",
            Role::Assistant => "🤖",
            Role::System => "⚙️",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = Message::assistant("hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hello"}));
    }

    #[test]
    fn test_message_deserializes_from_wire_shape() {
        let msg: Message = serde_json::from_str(r#"{"role":"system","content":"S"}"#).unwrap();
        assert_eq!(msg, Message::system("S"));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result: Result<Message, _> = serde_json::from_str(r#"{"role":"tool","content":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_icons_are_distinct_per_role() {
        assert_eq!(Role::User.icon(), "🧑");
        assert_eq!(Role::Assistant.icon(), "🤖");
        assert_eq!(Role::System.icon(), "⚙️");
    }
}
