pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod logging;
pub mod message;

// Re-export main types for convenience
pub use client::{ChatClient, ThreadEntry};
pub use config::Config;
pub use conversation::{is_blank, Conversation, Outgoing, RequestId, Settlement, Submission};
pub use error::{ChatError, ErrorKind};
pub use message::{Message, Sender};
