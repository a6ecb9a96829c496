pub mod api;
pub mod attachment;
pub mod config;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use api::{ApiClient, ChatReply, ChatRequest};
pub use attachment::Attachment;
pub use config::Config;
pub use session::{ChatSession, Draft, Outgoing, RequestId, ERROR_TEXT, PLACEHOLDER_TEXT};
pub use state::{ChatMessage, ChatRole};
