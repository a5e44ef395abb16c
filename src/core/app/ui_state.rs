use std::time::Instant;

use ratatui::prelude::Size;

use crate::core::conversation::Conversation;

pub struct UiState {
    pub conversation: Conversation,
    pub input: String,
    pub is_generating: bool,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub status: Option<String>,
    pub status_set_at: Option<Instant>,
    pub exit_requested: bool,
    pub last_term_size: Size,
}

impl UiState {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            conversation,
            input: String::new(),
            is_generating: false,
            scroll_offset: 0,
            auto_scroll: true,
            status: None,
            status_set_at: None,
            exit_requested: false,
            last_term_size: Size::default(),
        }
    }

    pub fn begin_streaming(&mut self) {
        self.is_generating = true;
    }

    pub fn end_streaming(&mut self) {
        self.is_generating = false;
    }

    pub fn set_status<S: Into<String>>(&mut self, s: S) {
        self.status = Some(s.into());
        self.status_set_at = Some(Instant::now());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
        self.status_set_at = None;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Scrolling past `max_offset` re-pins the view to the newest message.
    pub fn scroll_down(&mut self, lines: u16, max_offset: u16) {
        let next = self.scroll_offset.saturating_add(lines);
        if next >= max_offset {
            self.scroll_offset = max_offset;
            self.auto_scroll = true;
        } else {
            self.scroll_offset = next;
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.auto_scroll = false;
        self.scroll_offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.auto_scroll = true;
    }
}
