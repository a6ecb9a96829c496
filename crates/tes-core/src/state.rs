//! UI-agnostic message types
//!
//! These are shared by every front end of the chat client and don't depend
//! on any UI framework.

use serde::{Deserialize, Serialize};

/// A single entry in the chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Label shown in front of the message text
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "Me",
            ChatRole::Assistant => "Bot",
        }
    }
}
