//! Chat session state machine
//!
//! A session owns the message history and the draft being composed. Each
//! submission appends the user's message plus an assistant placeholder and
//! hands back a [`RequestId`]; resolving that id later replaces exactly that
//! placeholder, however many other sends are still pending.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::api::ChatRequest;
use crate::attachment::Attachment;
use crate::state::{ChatMessage, ChatRole};

/// Assistant text shown while a reply is pending
pub const PLACEHOLDER_TEXT: &str = "Generating response...";

/// Assistant text shown when a send fails
pub const ERROR_TEXT: &str = "Error generating response";

/// Correlates an in-flight send with its placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Input fields the user is editing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub user_id: String,
    pub query: String,
    pub file: Option<Attachment>,
}

impl Draft {
    pub fn is_sendable(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Clear the message and the selected file. The user id is kept.
    pub fn reset(&mut self) {
        self.query.clear();
        self.file = None;
    }
}

/// A submission ready to go over the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub id: RequestId,
    pub request: ChatRequest,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    draft: Draft,
    // request id -> index of its placeholder in `messages`
    pending: HashMap<RequestId, usize>,
    next_id: u64,
    alerts: VecDeque<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_id(user_id: impl Into<String>) -> Self {
        let mut session = Self::new();
        session.draft.user_id = user_id.into();
        session
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    /// Number of sends still waiting for a reply
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    pub fn is_awaiting(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Oldest failure notice not yet dismissed
    pub fn alert(&self) -> Option<&str> {
        self.alerts.front().map(String::as_str)
    }

    pub fn dismiss_alert(&mut self) {
        self.alerts.pop_front();
    }

    /// Queue a notice for the user without touching the history.
    pub fn push_alert(&mut self, message: impl Into<String>) {
        self.alerts.push_back(message.into());
    }

    /// Start a send from the current draft.
    ///
    /// Returns `None` and changes nothing when the message is empty or only
    /// whitespace. The draft itself stays intact until the send resolves.
    pub fn submit(&mut self) -> Option<Outgoing> {
        if !self.draft.is_sendable() {
            return None;
        }

        let id = RequestId(self.next_id);
        self.next_id += 1;

        self.messages.push(ChatMessage::user(self.draft.query.clone()));
        self.messages.push(ChatMessage::assistant(PLACEHOLDER_TEXT));
        let placeholder = self.messages.len() - 1;
        self.pending.insert(id, placeholder);

        tracing::debug!(%id, placeholder, in_flight = self.pending.len(), "chat send started");

        Some(Outgoing {
            id,
            request: ChatRequest {
                user_id: self.draft.user_id.clone(),
                user_query: self.draft.query.clone(),
                file: self.draft.file.clone(),
            },
        })
    }

    /// Apply the outcome of a send to its placeholder.
    ///
    /// Returns `false` for ids that are unknown or already resolved.
    pub fn resolve(&mut self, id: RequestId, result: anyhow::Result<String>) -> bool {
        let Some(index) = self.pending.remove(&id) else {
            tracing::warn!(%id, "reply for unknown request ignored");
            return false;
        };

        let content = match result {
            Ok(text) => {
                tracing::debug!(%id, "chat send completed");
                text
            }
            Err(e) => {
                tracing::error!(%id, error = %format!("{e:#}"), "error generating response");
                self.alerts.push_back(ERROR_TEXT.to_string());
                ERROR_TEXT.to_string()
            }
        };

        if let Some(message) = self.messages.get_mut(index) {
            debug_assert_eq!(message.role, ChatRole::Assistant);
            message.content = content;
        }

        self.draft.reset();
        true
    }
}
