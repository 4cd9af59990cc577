use ella_core::{ChatClient, ChatError, Conversation, Outgoing, RequestId, Settlement, Submission};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub conversation: Conversation,
    pub assistant_name: String,

    // Input cursor, in characters
    pub cursor: usize,

    // Transcript scroll state
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of the transcript, set by the renderer
    pub chat_width: u16,  // Inner width of the transcript, set by the renderer
    pub follow_tail: bool,

    // One-line notice shown in the footer
    pub status: Option<String>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    client: ChatClient,
    events: UnboundedSender<AppEvent>,
    in_flight: Option<JoinHandle<()>>,
}

impl App {
    pub fn new(client: ChatClient, assistant_name: &str, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            conversation: Conversation::new(),
            assistant_name: assistant_name.to_string(),
            cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            follow_tail: true,
            status: None,
            animation_frame: 0,
            client,
            events,
            in_flight: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.client.base_url()
    }

    /// Submit the input buffer as the next user turn
    pub fn submit(&mut self) {
        match self.conversation.submit_input() {
            Submission::Sent(outgoing) => {
                self.cursor = 0;
                self.status = None;
                self.dispatch(outgoing);
            }
            Submission::Busy => {
                self.status = Some(format!("Still waiting for {} to reply", self.assistant_name));
            }
            Submission::Ignored => {}
        }
    }

    /// Re-send the last failed message
    pub fn retry(&mut self) {
        match self.conversation.retry() {
            Submission::Sent(outgoing) => {
                self.status = None;
                self.dispatch(outgoing);
            }
            Submission::Busy => {
                self.status = Some(format!("Still waiting for {} to reply", self.assistant_name));
            }
            Submission::Ignored => {
                self.status = Some("Nothing to retry".to_string());
            }
        }
    }

    fn dispatch(&mut self, outgoing: Outgoing) {
        debug!(request = ?outgoing.id, "dispatching chat request");
        let client = self.client.clone();
        let events = self.events.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let result = client.send(&outgoing.message).await;
            let _ = events.send(AppEvent::Reply {
                id: outgoing.id,
                result,
            });
        }));

        // Scroll to bottom so the typing indicator is visible
        self.follow_tail = true;
        self.scroll_to_bottom();
    }

    /// Apply a reply delivered through the event loop
    pub fn settle(&mut self, id: RequestId, result: Result<String, ChatError>) {
        match self.conversation.settle(id, result) {
            Settlement::Applied | Settlement::Failed => {
                self.in_flight = None;
                self.animation_frame = 0;
                self.status = None;
                if self.follow_tail {
                    self.scroll_to_bottom();
                }
            }
            Settlement::Stale => {}
        }
    }

    /// Drop the local transcript and ask the server to forget its thread
    pub fn clear_conversation(&mut self) {
        self.abort_in_flight();
        self.conversation.clear();
        self.cursor = 0;
        self.chat_scroll = 0;
        self.follow_tail = true;
        self.status = Some("Conversation cleared".to_string());

        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = client.clear_memory().await;
            let _ = events.send(AppEvent::MemoryCleared(result));
        });
    }

    pub fn memory_cleared(&mut self, result: Result<(), ChatError>) {
        match result {
            Ok(()) => info!("server thread memory cleared"),
            Err(err) => {
                warn!(error = %err, "failed to clear server thread memory");
                self.status = Some(format!("Cleared locally; server memory not cleared: {err}"));
            }
        }
    }

    pub fn quit(&mut self) {
        self.abort_in_flight();
        self.should_quit = true;
    }

    fn abort_in_flight(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(self.conversation.input(), self.cursor);
        self.conversation.input_mut().insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(self.conversation.input(), self.cursor);
            self.conversation.input_mut().remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        let char_count = self.conversation.input().chars().count();
        if self.cursor < char_count {
            let byte_pos = char_to_byte_index(self.conversation.input(), self.cursor);
            self.conversation.input_mut().remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.conversation.input().chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.conversation.input().chars().count();
    }

    // Transcript scrolling

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_tail = self.chat_scroll >= max;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_to_top(&mut self) {
        self.chat_scroll = 0;
        self.follow_tail = false;
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down(self.visible_height() / 2);
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up(self.visible_height() / 2);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
        self.follow_tail = true;
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    fn max_scroll(&self) -> u16 {
        self.transcript_lines().saturating_sub(self.visible_height())
    }

    /// Inline error shown beneath the transcript, if the last request failed
    pub fn error_line(&self) -> Option<String> {
        let err = self.conversation.last_error()?;
        if self.conversation.can_retry() {
            Some(format!("Error: {err} (Ctrl+R to retry)"))
        } else {
            Some(format!("Error: {err}"))
        }
    }

    /// Estimated number of wrapped lines the transcript occupies,
    /// clamped to `u16::MAX`
    pub fn transcript_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };
        let wrapped = |text: &str| -> usize {
            // Empty line still takes one line
            text.chars().count().div_ceil(wrap_width).max(1)
        };

        let mut total_lines: usize = 0;
        for msg in self.conversation.history() {
            total_lines += 1; // Sender line
            total_lines += msg.text.lines().map(wrapped).sum::<usize>();
            total_lines += 1; // Blank line after message
        }

        if self.conversation.is_pending() {
            total_lines += 1;
        }
        if let Some(line) = self.error_line() {
            total_lines += wrapped(&line);
        }

        u16::try_from(total_lines).unwrap_or(u16::MAX)
    }
}
