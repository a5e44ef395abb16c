use crate::core::app::App;

const SEPARATOR: &str = " • ";

pub fn build_title_text(app: &App) -> String {
    let backend = app.session.config.backend;
    let markdown = if app.markdown_enabled() { "on" } else { "off" };
    let mut title = format!(
        "llm-playground v{}{SEPARATOR}{} ({}){SEPARATOR}Markdown: {}",
        env!("CARGO_PKG_VERSION"),
        backend,
        app.session.active_model(),
        markdown,
    );
    if app.is_generating() {
        title.push_str(SEPARATOR);
        title.push_str("Generating…");
    }
    title
}

/// Title for the input box: what Enter or Esc will do right now.
pub fn input_title(app: &App) -> &'static str {
    if app.is_generating() {
        "Stop (Esc) • Ctrl+O backend • Ctrl+D markdown • Ctrl+C quit"
    } else {
        "Send (Enter) • Ctrl+O backend • Ctrl+D markdown • Ctrl+C quit"
    }
}
