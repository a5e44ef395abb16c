use crate::core::message::{Message, TranscriptRole};
use crate::ui::theme::Theme;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

const USER_PREFIX: &str = "You: ";
const USER_CONTINUATION_INDENT: &str = "     ";
const APP_ERROR_PREFIX: &str = "! ";
const APP_INFO_PREFIX: &str = "i ";
const APP_CONTINUATION_INDENT: &str = "  ";

#[derive(Clone, Debug)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

/// Build the transcript as styled lines, one blank line between messages.
pub fn build_markdown_display_lines(
    messages: &[Message],
    theme: &Theme,
    markdown_enabled: bool,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (index, message) in messages.iter().enumerate() {
        if index > 0 {
            lines.push(Line::default());
        }
        lines.extend(render_message_lines(message, theme, markdown_enabled));
    }
    lines
}

pub fn render_message_lines(
    message: &Message,
    theme: &Theme,
    markdown_enabled: bool,
) -> Vec<Line<'static>> {
    let base_style = base_text_style(message.role, theme);
    // User text is echoed verbatim; only replies and notices get markdown.
    let mut lines = if markdown_enabled && !message.is_user() {
        render_markdown(&message.content, base_style, theme)
    } else {
        render_plain(&message.content, base_style)
    };
    if lines.is_empty() {
        lines.push(Line::default());
    }

    match message.role {
        TranscriptRole::User => apply_prefix(
            &mut lines,
            Span::styled(USER_PREFIX, theme.user_prefix_style),
            USER_CONTINUATION_INDENT,
        ),
        TranscriptRole::AppError => apply_prefix(
            &mut lines,
            Span::styled(APP_ERROR_PREFIX, theme.app_error_style),
            APP_CONTINUATION_INDENT,
        ),
        TranscriptRole::AppInfo => apply_prefix(
            &mut lines,
            Span::styled(APP_INFO_PREFIX, theme.app_info_style),
            APP_CONTINUATION_INDENT,
        ),
        TranscriptRole::Assistant => {}
    }
    lines
}

fn base_text_style(role: TranscriptRole, theme: &Theme) -> Style {
    match role {
        TranscriptRole::User => theme.user_text_style,
        TranscriptRole::Assistant => theme.assistant_text_style,
        TranscriptRole::AppError => theme.app_error_style,
        TranscriptRole::AppInfo => theme.app_info_style,
    }
}

fn apply_prefix(lines: &mut [Line<'static>], prefix: Span<'static>, indent: &'static str) {
    for (index, line) in lines.iter_mut().enumerate() {
        let lead = if index == 0 {
            prefix.clone()
        } else {
            Span::raw(indent)
        };
        line.spans.insert(0, lead);
    }
}

fn render_plain(content: &str, style: Style) -> Vec<Line<'static>> {
    content
        .split('\n')
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect()
}

/// Render markdown into styled lines.
pub fn render_markdown(content: &str, base_style: Style, theme: &Theme) -> Vec<Line<'static>> {
    MarkdownRenderer::new(theme, base_style).render(content)
}

struct MarkdownRenderer<'t> {
    theme: &'t Theme,
    style_stack: Vec<Style>,
    list_stack: Vec<ListKind>,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    in_code_block: bool,
}

impl<'t> MarkdownRenderer<'t> {
    fn new(theme: &'t Theme, base_style: Style) -> Self {
        Self {
            theme,
            style_stack: vec![base_style],
            list_stack: Vec::new(),
            lines: Vec::new(),
            current: Vec::new(),
            in_code_block: false,
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        let style = self.current_style().add_modifier(modifier);
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn flush_current_spans(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    fn push_empty_line(&mut self) {
        self.flush_current_spans();
        if self.lines.last().is_some_and(|line| line.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn render(mut self, content: &str) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        for event in Parser::new_ext(content, options) {
            match event {
                Event::Start(tag) => self.start_tag(tag),
                Event::End(tag_end) => self.end_tag(tag_end),
                Event::Text(text) => {
                    if self.in_code_block {
                        let style = self.theme.md_code_block_style;
                        for line in text.split_terminator('\n') {
                            self.lines.push(Line::from(vec![
                                Span::raw(APP_CONTINUATION_INDENT),
                                Span::styled(line.to_string(), style),
                            ]));
                        }
                    } else {
                        let style = self.current_style();
                        self.current.push(Span::styled(text.to_string(), style));
                    }
                }
                Event::Code(code) => {
                    self.current.push(Span::styled(
                        code.to_string(),
                        self.theme.md_inline_code_style,
                    ));
                }
                Event::SoftBreak | Event::HardBreak => {
                    self.flush_current_spans();
                    if !self.list_stack.is_empty() {
                        self.current.push(Span::raw(self.list_indent(self.list_stack.len())));
                    }
                }
                Event::Rule => {
                    self.flush_current_spans();
                    self.lines.push(Line::from(Span::styled(
                        "─".repeat(24),
                        self.theme.md_list_marker_style,
                    )));
                    self.push_empty_line();
                }
                Event::TaskListMarker(checked) => {
                    let marker = if checked { "[x] " } else { "[ ] " };
                    self.current
                        .push(Span::styled(marker, self.theme.md_list_marker_style));
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    let style = self.current_style();
                    self.current
                        .push(Span::styled(html.trim_end().to_string(), style));
                }
                _ => {}
            }
        }

        self.flush_current_spans();
        while self.lines.last().is_some_and(|line| line.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }

    fn list_indent(&self, depth: usize) -> String {
        "  ".repeat(depth)
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_current_spans();
                self.style_stack.push(self.theme.md_heading_style(level as u8));
            }
            Tag::BlockQuote(_) => {
                self.flush_current_spans();
                self.style_stack.push(self.theme.md_blockquote_style);
                self.current.push(Span::styled("│ ", self.theme.md_blockquote_style));
            }
            Tag::List(start) => {
                self.flush_current_spans();
                self.list_stack.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Unordered,
                });
            }
            Tag::Item => {
                self.flush_current_spans();
                let depth = self.list_stack.len().saturating_sub(1);
                let marker = match self.list_stack.last_mut() {
                    Some(ListKind::Ordered(k)) => {
                        let cur = *k;
                        *k += 1;
                        format!("{}. ", cur)
                    }
                    _ => "- ".to_string(),
                };
                if depth > 0 {
                    self.current.push(Span::raw(self.list_indent(depth)));
                }
                self.current
                    .push(Span::styled(marker, self.theme.md_list_marker_style));
            }
            Tag::CodeBlock(_) => {
                self.flush_current_spans();
                self.in_code_block = true;
            }
            Tag::Emphasis => self.push_modifier(Modifier::ITALIC),
            Tag::Strong => self.push_modifier(Modifier::BOLD),
            Tag::Strikethrough => self.push_modifier(Modifier::CROSSED_OUT),
            Tag::Link { .. } => self.push_modifier(Modifier::UNDERLINED),
            _ => {}
        }
    }

    fn end_tag(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::Paragraph => {
                if self.list_stack.is_empty() {
                    self.push_empty_line();
                } else {
                    self.flush_current_spans();
                }
            }
            TagEnd::Heading(_) => {
                self.pop_style();
                self.push_empty_line();
            }
            TagEnd::BlockQuote(_) => {
                self.pop_style();
                self.push_empty_line();
            }
            TagEnd::List(_) => {
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.push_empty_line();
                } else {
                    self.flush_current_spans();
                }
            }
            TagEnd::Item => self.flush_current_spans(),
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.push_empty_line();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                self.pop_style();
            }
            _ => {}
        }
    }
}
