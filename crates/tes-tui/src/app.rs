use ratatui::layout::Rect;
use tes_core::{ApiClient, Attachment, ChatSession, RequestId};
use tokio::sync::mpsc::UnboundedSender;

use crate::textarea::Caret;
use crate::tui::AppEvent;

/// Form field receiving keyboard input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    UserId,
    File,
    Message,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::UserId => Focus::File,
            Focus::File => Focus::Message,
            Focus::Message => Focus::UserId,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::UserId => Focus::Message,
            Focus::File => Focus::UserId,
            Focus::Message => Focus::File,
        }
    }
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: Focus,
    pub session: ChatSession,

    // Caret positions for the editable fields
    pub user_id_caret: Caret,
    pub file_path_input: String,
    pub file_path_caret: Caret,
    pub message_caret: Caret,

    // Message list scrolling
    pub chat_scroll: u16,
    pub follow_bottom: bool,
    pub chat_height: u16, // visible rows of the message list, set during render

    // Animation state
    pub animation_frame: u8,

    // Panel area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    // Backend
    pub client: ApiClient,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(client: ApiClient, events: UnboundedSender<AppEvent>, user_id: String) -> Self {
        let mut user_id_caret = Caret::default();
        user_id_caret.end(&user_id);

        Self {
            should_quit: false,
            focus: Focus::Message,
            session: ChatSession::with_user_id(user_id),

            user_id_caret,
            file_path_input: String::new(),
            file_path_caret: Caret::default(),
            message_caret: Caret::default(),

            chat_scroll: 0,
            follow_bottom: true,
            chat_height: 0,

            animation_frame: 0,

            chat_area: None,

            client,
            events,
        }
    }

    /// Send the current draft, if it has any text.
    ///
    /// The request runs on its own task and reports back through the event
    /// channel, so the UI keeps accepting input meanwhile.
    pub fn submit(&mut self) -> bool {
        let Some(outgoing) = self.session.submit() else {
            return false;
        };

        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = client
                .generate(outgoing.request)
                .await
                .map(|reply| reply.response);
            let _ = events.send(AppEvent::Reply {
                id: outgoing.id,
                result,
            });
        });

        self.follow_bottom = true;
        true
    }

    /// Apply a reply and bring the carets back inside the cleared draft.
    pub fn apply_reply(&mut self, id: RequestId, result: anyhow::Result<String>) {
        if self.session.resolve(id, result) {
            self.message_caret.clamp(&self.session.draft().query);
            self.file_path_input.clear();
            self.file_path_caret = Caret::default();
        }
    }

    /// Load the file named in the file field as the draft attachment.
    pub async fn select_file(&mut self) {
        let path = self.file_path_input.trim().to_string();
        if path.is_empty() {
            return;
        }

        match Attachment::from_path(&path).await {
            Ok(attachment) => {
                tracing::info!(file = %attachment.file_name, size = attachment.size(), "file selected");
                self.session.draft_mut().file = Some(attachment);
            }
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "file selection failed");
                self.session.push_alert(format!("{e:#}"));
            }
        }
    }

    pub fn clear_file(&mut self) {
        self.session.draft_mut().file = None;
        self.file_path_input.clear();
        self.file_path_caret = Caret::default();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_awaiting() {
            self.animation_frame = (self.animation_frame + 1) % 10;
        }
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.follow_bottom = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(rows);
    }

    /// Clamp the scroll offset against the rendered line count
    pub fn fit_scroll(&mut self, total_lines: u16) {
        let max_scroll = total_lines.saturating_sub(self.chat_height);
        if self.follow_bottom || self.chat_scroll >= max_scroll {
            self.chat_scroll = max_scroll;
            self.follow_bottom = true;
        }
    }
}
