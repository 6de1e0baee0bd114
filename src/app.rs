use tokio::task::JoinHandle;

use crate::dispatch::{task_failure_turn, Dispatcher};
use crate::health::{ConnectivityState, HealthUpdate};
use crate::transcript::{Transcript, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Banner shown when a submission is attempted without a connected backend
pub const NOT_CONNECTED_MESSAGE: &str = "Cannot send message: Backend server is not connected";

/// All mutable interaction state. The main loop is the only mutator; the UI
/// gets read access during rendering.
pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Connectivity
    pub connectivity: ConnectivityState,
    pub banner: Option<String>,

    // Conversation state
    pub transcript: Transcript,
    pub draft: String,
    pub draft_cursor: usize, // cursor position in draft, in chars
    pub sending: bool,
    pub send_task: Option<JoinHandle<Turn>>,

    // Chat viewport
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of chat area, set during render
    pub chat_width: u16,  // inner width of chat area, for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    dispatcher: Dispatcher,
}

impl App {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            connectivity: ConnectivityState::Checking,
            banner: None,

            transcript: Transcript::new(),
            draft: String::new(),
            draft_cursor: 0,
            sending: false,
            send_task: None,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            animation_frame: 0,

            dispatcher,
        }
    }

    /// Submit the current draft. Applies the guards, records the user turn and
    /// spawns the request; drops the attempt entirely when a guard fails.
    pub fn submit(&mut self) {
        let Some(text) = self.begin_submission() else {
            return;
        };

        let dispatcher = self.dispatcher.clone();
        self.send_task = Some(tokio::spawn(
            async move { dispatcher.send(&text).await },
        ));
    }

    /// Guard-and-record half of `submit`, separated from the spawn so the
    /// state machine can be driven directly in tests. Returns the text to
    /// send when the submission was accepted.
    pub fn begin_submission(&mut self) -> Option<String> {
        if self.draft.trim().is_empty() {
            return None;
        }
        if self.sending {
            // One request in flight at a time; concurrent attempts are dropped
            return None;
        }
        if self.connectivity != ConnectivityState::Connected {
            self.banner = Some(NOT_CONNECTED_MESSAGE.to_string());
            return None;
        }

        let text = std::mem::take(&mut self.draft);
        self.draft_cursor = 0;
        self.banner = None;
        self.transcript.append(Turn::user(text.clone()));
        self.sending = true;
        self.scroll_chat_to_bottom();

        Some(text)
    }

    /// Record the turn produced by a resolved submission and leave the busy
    /// state. Every submission ends here, success and failure alike.
    pub fn finish_submission(&mut self, turn: Turn) {
        self.transcript.append(turn);
        self.sending = false;
        self.scroll_chat_to_bottom();
    }

    /// Reap the in-flight send task if it has resolved. Called once per event
    /// loop iteration; does nothing while the request is still pending.
    pub async fn poll_in_flight(&mut self) {
        let finished = self
            .send_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        if let Some(task) = self.send_task.take() {
            let turn = match task.await {
                Ok(turn) => turn,
                Err(err) => {
                    log::error!("send task failed: {err}");
                    task_failure_turn(&err)
                }
            };
            self.finish_submission(turn);
        }
    }

    /// Apply every probe outcome waiting on the channel. Non-blocking, so a
    /// closed channel (monitor already stopped) is indistinguishable from an
    /// empty one and never busy-wakes the caller.
    pub fn drain_health_updates(
        &mut self,
        rx: &mut tokio::sync::mpsc::UnboundedReceiver<HealthUpdate>,
    ) {
        while let Ok(update) = rx.try_recv() {
            self.apply_health_update(update);
        }
    }

    /// Apply a published probe outcome. Connected clears the banner (but not
    /// error flags already in the transcript); Disconnected installs the
    /// probe's message.
    pub fn apply_health_update(&mut self, update: HealthUpdate) {
        self.connectivity = update.state;
        match update.state {
            ConnectivityState::Connected => self.banner = None,
            ConnectivityState::Disconnected => self.banner = update.message,
            ConnectivityState::Checking => {}
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.sending {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat scrolling
    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max_scroll = self.total_chat_lines().saturating_sub(self.chat_height);
        if self.chat_scroll < max_scroll {
            self.chat_scroll += 1;
        }
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        let total = self.total_chat_lines();
        let visible = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.chat_scroll = total.saturating_sub(visible);
    }

    /// Rendered line count of the transcript, accounting for wrapping, so the
    /// viewport can follow the newest turn. The transcript is unbounded, so
    /// the count saturates at the scroll range ratatui can address.
    fn total_chat_lines(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total: usize = 0;
        for turn in self.transcript.turns() {
            total += 1; // role label line
            for line in turn.text.lines() {
                // Character count, not byte length, for UTF-8 content
                let chars = line.chars().count();
                total = total.saturating_add((chars / wrap_width) + 1);
            }
            total += 1; // blank line after each turn
        }

        if self.sending {
            total += 2; // label + "Thinking..." line
        }

        total.min(u16::MAX as usize) as u16
    }

    // Draft editing (cursor position is in chars, converted at the edit point)
    pub fn insert_draft_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.draft, self.draft_cursor);
        self.draft.insert(byte_pos, c);
        self.draft_cursor += 1;
    }

    pub fn delete_draft_char_before_cursor(&mut self) {
        if self.draft_cursor > 0 {
            self.draft_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.draft, self.draft_cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn delete_draft_char_at_cursor(&mut self) {
        if self.draft_cursor < self.draft.chars().count() {
            let byte_pos = char_to_byte_index(&self.draft, self.draft_cursor);
            self.draft.remove(byte_pos);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.draft_cursor = self.draft_cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.draft_cursor = (self.draft_cursor + 1).min(self.draft.chars().count());
    }

    pub fn move_cursor_home(&mut self) {
        self.draft_cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.draft_cursor = self.draft.chars().count();
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
