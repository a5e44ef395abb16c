use crate::core::app::App;
use crate::ui::theme::Theme;
use crate::ui::title::{build_title_text, input_title};
use crate::utils::scroll::{ScrollCalculator, INPUT_HEIGHT, TITLE_HEIGHT};
use ratatui::{
    layout::{Constraint, Direction, Layout, Position},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn ui(f: &mut Frame, app: &mut App) {
    let theme = Theme::default();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(TITLE_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(INPUT_HEIGHT),
        ])
        .split(f.area());

    let mut title_spans = vec![Span::styled(build_title_text(app), theme.title_style)];
    if let Some(status) = &app.ui.status {
        title_spans.push(Span::raw("  "));
        title_spans.push(Span::styled(status.clone(), theme.status_style));
    }
    f.render_widget(Paragraph::new(Line::from(title_spans)), chunks[0]);

    // Lines are pre-wrapped so the scroll math matches what is drawn.
    let transcript_area = chunks[1];
    let lines = ScrollCalculator::build_display_lines_with_theme(
        &app.ui.conversation,
        &theme,
        app.markdown_enabled(),
        transcript_area.width,
    );
    let scroll_offset = ScrollCalculator::effective_offset(
        &lines,
        transcript_area.height,
        app.ui.scroll_offset,
        app.ui.auto_scroll,
    );
    app.ui.scroll_offset = scroll_offset;
    f.render_widget(
        Paragraph::new(lines).scroll((scroll_offset, 0)),
        transcript_area,
    );

    let input_area = chunks[2];
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let visible_input = visible_tail(&app.ui.input, inner_width.saturating_sub(1));
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.input_border_style)
        .title(Span::styled(input_title(app), theme.input_title_style));
    f.render_widget(
        Paragraph::new(Span::styled(visible_input, theme.input_text_style)).block(input_block),
        input_area,
    );

    let cursor_x = input_area.x + 1 + visible_input.width() as u16;
    f.set_cursor_position(Position::new(cursor_x, input_area.y + 1));
}

/// The longest suffix of `text` that fits in `width` columns.
fn visible_tail(text: &str, width: usize) -> &str {
    let mut used = 0;
    let mut start = text.len();
    for (idx, ch) in text.char_indices().rev() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > width {
            break;
        }
        used += ch_width;
        start = idx;
    }
    &text[start..]
}
