//! Conversation state controller
//!
//! [`Conversation`] owns the three pieces of chat state (history, input
//! buffer, in-flight request) and performs no I/O itself. A front end calls
//! [`Conversation::submit`], dispatches the returned [`Outgoing`] request
//! however it likes, and hands the outcome back through
//! [`Conversation::settle`].
//!
//! At most one request is in flight. Settlements are matched by
//! [`RequestId`], so a reply that arrives after the conversation moved on
//! (for example after [`Conversation::clear`]) is dropped.

use tracing::{debug, info, warn};

use crate::error::ChatError;
use crate::message::Message;

/// Identity of one outgoing request, unique within a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

/// A request the front end must send to the chat endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub id: RequestId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Nothing to send; state is unchanged
    Ignored,
    /// Another request is still in flight; state is unchanged
    Busy,
    Sent(Outgoing),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The assistant's reply was appended
    Applied,
    /// The request failed; see [`Conversation::last_error`]
    Failed,
    /// The id no longer matches the pending request; nothing changed
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    id: RequestId,
    text: String,
}

#[derive(Debug, Default)]
pub struct Conversation {
    history: Vec<Message>,
    input: String,
    pending: Option<Pending>,
    next_id: u64,
    last_error: Option<ChatError>,
    failed_text: Option<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_id(&self) -> Option<RequestId> {
        self.pending.as_ref().map(|p| p.id)
    }

    pub fn last_error(&self) -> Option<&ChatError> {
        self.last_error.as_ref()
    }

    pub fn can_retry(&self) -> bool {
        self.pending.is_none() && self.failed_text.is_some()
    }

    /// Submit `text` as the user's next turn.
    ///
    /// Text made only of whitespace and byte-order marks is ignored. The
    /// text itself is recorded and sent untrimmed.
    pub fn submit(&mut self, text: &str) -> Submission {
        if is_blank(text) {
            return Submission::Ignored;
        }
        if let Some(pending) = &self.pending {
            debug!(pending = pending.id.0, "submit rejected while a request is in flight");
            return Submission::Busy;
        }

        self.history.push(Message::user(text));
        self.input.clear();
        self.failed_text = None;
        Submission::Sent(self.begin(text.to_string()))
    }

    /// Submit whatever is currently in the input buffer
    pub fn submit_input(&mut self) -> Submission {
        let text = self.input.clone();
        self.submit(&text)
    }

    /// Re-send the text of the last failed request.
    ///
    /// The user's turn is already in the history, so nothing is appended.
    pub fn retry(&mut self) -> Submission {
        if self.pending.is_some() {
            return Submission::Busy;
        }
        match self.failed_text.take() {
            Some(text) => Submission::Sent(self.begin(text)),
            None => Submission::Ignored,
        }
    }

    /// Apply the outcome of request `id`
    pub fn settle(&mut self, id: RequestId, result: Result<String, ChatError>) -> Settlement {
        if self.pending_id() != Some(id) {
            warn!(request = id.0, "dropping reply for a request that is no longer pending");
            return Settlement::Stale;
        }
        let Some(pending) = self.pending.take() else {
            return Settlement::Stale;
        };

        match result {
            Ok(reply) => {
                info!(request = id.0, chars = reply.chars().count(), "assistant replied");
                self.history.push(Message::assistant(reply));
                Settlement::Applied
            }
            Err(err) => {
                warn!(request = id.0, error = %err, "chat request failed");
                self.last_error = Some(err);
                self.failed_text = Some(pending.text);
                Settlement::Failed
            }
        }
    }

    /// Forget every turn and any in-flight request
    pub fn clear(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(request = pending.id.0, "abandoning in-flight request");
        }
        self.history.clear();
        self.input.clear();
        self.last_error = None;
        self.failed_text = None;
    }

    fn begin(&mut self, text: String) -> Outgoing {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        self.last_error = None;
        self.pending = Some(Pending {
            id,
            text: text.clone(),
        });
        debug!(request = id.0, "request pending");
        Outgoing { id, message: text }
    }
}

/// True when `text` has nothing to send: only whitespace and byte-order marks
pub fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || c == '\u{feff}')
}
