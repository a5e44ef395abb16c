use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    // Chat message styles
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_text_style: Style,
    pub app_error_style: Style,
    pub app_info_style: Style,

    // Chrome
    pub title_style: Style,
    pub status_style: Style,
    pub input_border_style: Style,
    pub input_title_style: Style,
    pub input_text_style: Style,

    // Markdown
    pub md_heading_styles: [Style; 3],
    pub md_inline_code_style: Style,
    pub md_code_block_style: Style,
    pub md_list_marker_style: Style,
    pub md_blockquote_style: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_text_style: Style::default().fg(Color::White),
            app_error_style: Style::default().fg(Color::LightRed),
            app_info_style: Style::default().fg(Color::DarkGray),

            title_style: Style::default().fg(Color::Gray),
            status_style: Style::default().fg(Color::Yellow),
            input_border_style: Style::default().fg(Color::Gray),
            input_title_style: Style::default().fg(Color::Gray),
            input_text_style: Style::default().fg(Color::White),

            md_heading_styles: [
                Style::default()
                    .fg(Color::LightMagenta)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                Style::default()
                    .fg(Color::LightMagenta)
                    .add_modifier(Modifier::BOLD),
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ],
            md_inline_code_style: Style::default().fg(Color::LightYellow),
            md_code_block_style: Style::default().fg(Color::LightYellow),
            md_list_marker_style: Style::default().fg(Color::LightBlue),
            md_blockquote_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        }
    }
}

impl Theme {
    pub fn md_heading_style(&self, level: u8) -> Style {
        let index = usize::from(level.clamp(1, 3)) - 1;
        self.md_heading_styles[index]
    }
}
