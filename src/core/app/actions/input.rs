use tracing::info;

use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::message::TranscriptRole;
use crate::utils::scroll::ScrollCalculator;

pub(super) fn handle_input_action(
    app: &mut App,
    action: AppAction,
    ctx: AppActionContext,
) -> Option<AppCommand> {
    match action {
        AppAction::ToggleBackend => {
            let backend = app.session.config.backend.toggled();
            app.session.config.backend = backend;
            info!(%backend, model = app.session.active_model(), "backend switched");
            app.ui.set_status(format!(
                "Backend: {} ({})",
                backend,
                app.session.active_model()
            ));
            if let Err(err) = app.session.active_profile() {
                app.conversation()
                    .add_app_message(TranscriptRole::AppInfo, err.to_string());
            }
            None
        }
        AppAction::ToggleMarkdown => {
            let markdown = !app.session.config.markdown;
            app.session.config.markdown = markdown;
            app.ui.set_status(if markdown {
                "Markdown: on"
            } else {
                "Markdown: off"
            });
            None
        }
        AppAction::InsertChar { ch } => {
            app.ui.input.push(ch);
            None
        }
        AppAction::InsertText { text } => {
            app.ui.input.push_str(&text);
            None
        }
        AppAction::Backspace => {
            app.ui.input.pop();
            None
        }
        AppAction::ClearInput => {
            app.ui.input.clear();
            None
        }
        AppAction::ScrollUp { lines } => {
            if app.ui.auto_scroll {
                // Leaving the pinned view starts from the bottom it was showing.
                app.ui.scroll_offset = max_scroll_offset(app, ctx);
            }
            app.ui.scroll_up(lines);
            None
        }
        AppAction::ScrollDown { lines } => {
            if !app.ui.auto_scroll {
                let max_offset = max_scroll_offset(app, ctx);
                app.ui.scroll_down(lines, max_offset);
            }
            None
        }
        AppAction::ScrollToTop => {
            app.ui.scroll_to_top();
            None
        }
        AppAction::ScrollToBottom => {
            app.ui.scroll_to_bottom();
            None
        }
        AppAction::ClearStatus => {
            app.clear_status();
            None
        }
        AppAction::Quit => {
            app.cancel_current_stream();
            app.ui.exit_requested = true;
            None
        }
        _ => unreachable!("non-input action routed to input handler"),
    }
}

fn max_scroll_offset(app: &App, ctx: AppActionContext) -> u16 {
    let lines = ScrollCalculator::build_display_lines(
        &app.ui.conversation,
        app.markdown_enabled(),
        ctx.term_width,
    );
    ScrollCalculator::max_scroll_offset(
        &lines,
        ScrollCalculator::transcript_height(ctx.term_height),
    )
}
