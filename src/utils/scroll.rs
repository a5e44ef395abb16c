use crate::core::conversation::Conversation;
use crate::ui::markdown::build_markdown_display_lines;
use crate::ui::theme::Theme;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Rows taken by the title bar.
pub const TITLE_HEIGHT: u16 = 1;
/// Rows taken by the bordered input box.
pub const INPUT_HEIGHT: u16 = 3;

/// Handles all scroll-related calculations and line building
pub struct ScrollCalculator;

impl ScrollCalculator {
    /// Rows left for the transcript once the title and input box are drawn.
    pub fn transcript_height(term_height: u16) -> u16 {
        term_height.saturating_sub(TITLE_HEIGHT + INPUT_HEIGHT)
    }

    /// Transcript lines already wrapped to `terminal_width`, so that the
    /// line count used for scrolling matches what gets drawn.
    pub fn build_display_lines(
        conversation: &Conversation,
        markdown_enabled: bool,
        terminal_width: u16,
    ) -> Vec<Line<'static>> {
        Self::build_display_lines_with_theme(
            conversation,
            &Theme::default(),
            markdown_enabled,
            terminal_width,
        )
    }

    pub fn build_display_lines_with_theme(
        conversation: &Conversation,
        theme: &Theme,
        markdown_enabled: bool,
        terminal_width: u16,
    ) -> Vec<Line<'static>> {
        let lines =
            build_markdown_display_lines(conversation.messages(), theme, markdown_enabled);
        Self::prewrap_lines(&lines, terminal_width)
    }

    pub fn max_scroll_offset(lines: &[Line], available_height: u16) -> u16 {
        let total = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        total.saturating_sub(available_height)
    }

    /// Offset to draw with: the bottom when pinned, else the stored offset
    /// clamped to the content.
    pub fn effective_offset(
        lines: &[Line],
        available_height: u16,
        scroll_offset: u16,
        auto_scroll: bool,
    ) -> u16 {
        let max_offset = Self::max_scroll_offset(lines, available_height);
        if auto_scroll {
            max_offset
        } else {
            scroll_offset.min(max_offset)
        }
    }

    /// Pre-wrap lines at word boundaries, breaking overlong words, while
    /// keeping span styles.
    pub fn prewrap_lines(lines: &[Line<'static>], terminal_width: u16) -> Vec<Line<'static>> {
        let width = terminal_width as usize;
        if width == 0 {
            return lines.to_vec();
        }

        let mut out = Vec::with_capacity(lines.len());
        for line in lines {
            if line.width() <= width {
                out.push(line.clone());
                continue;
            }
            let mut wrapper = LineWrapper::new(width);
            for span in &line.spans {
                for token in split_tokens(&span.content) {
                    wrapper.push_token(token, span.style);
                }
            }
            out.extend(wrapper.finish());
        }
        out
    }
}

/// Split text into alternating runs of whitespace and non-whitespace.
fn split_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (idx, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        match in_space {
            Some(prev) if prev != is_space => {
                tokens.push(&text[start..idx]);
                start = idx;
            }
            _ => {}
        }
        in_space = Some(is_space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

struct LineWrapper {
    width: usize,
    current: Vec<Span<'static>>,
    current_width: usize,
    out: Vec<Line<'static>>,
}

impl LineWrapper {
    fn new(width: usize) -> Self {
        Self {
            width,
            current: Vec::new(),
            current_width: 0,
            out: Vec::new(),
        }
    }

    fn emit_line(&mut self) {
        while let Some(last) = self.current.last_mut() {
            let trimmed = last.content.trim_end();
            if trimmed.is_empty() {
                self.current.pop();
            } else {
                if trimmed.len() != last.content.len() {
                    *last = Span::styled(trimmed.to_string(), last.style);
                }
                break;
            }
        }
        self.out.push(Line::from(std::mem::take(&mut self.current)));
        self.current_width = 0;
    }

    fn append(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        self.current_width += text.width();
        if let Some(last) = self.current.last_mut() {
            if last.style == style {
                let mut combined = String::with_capacity(last.content.len() + text.len());
                combined.push_str(&last.content);
                combined.push_str(text);
                *last = Span::styled(combined, style);
                return;
            }
        }
        self.current.push(Span::styled(text.to_string(), style));
    }

    fn push_token(&mut self, token: &str, style: Style) {
        let token_width = token.width();
        let is_space = token.chars().all(char::is_whitespace);

        if is_space {
            // Whitespace never starts a wrapped continuation line.
            if self.current_width == 0 && !self.out.is_empty() {
                return;
            }
            if self.current_width + token_width > self.width {
                self.emit_line();
                return;
            }
            self.append(token, style);
            return;
        }

        if self.current_width + token_width <= self.width {
            self.append(token, style);
            return;
        }
        if token_width <= self.width {
            self.emit_line();
            self.append(token, style);
            return;
        }

        let mut buf = [0_u8; 4];
        for ch in token.chars() {
            let ch_width = ch.width().unwrap_or(0);
            if self.current_width > 0 && self.current_width + ch_width > self.width {
                self.emit_line();
            }
            self.append(ch.encode_utf8(&mut buf), style);
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if !self.current.is_empty() || self.out.is_empty() {
            self.emit_line();
        }
        self.out
    }
}
