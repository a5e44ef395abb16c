use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::app::AppAction;

/// Map a key press to the action it triggers, if any.
///
/// `input` is the current input buffer; Enter submits it as-is and the
/// controller ignores blank submissions. `page` is the scroll step for
/// PageUp/PageDown.
pub fn resolve_key(key: &KeyEvent, input: &str, page: u16) -> Option<AppAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    if ctrl {
        return match key.code {
            KeyCode::Char('c') => Some(AppAction::Quit),
            KeyCode::Char('o') => Some(AppAction::ToggleBackend),
            KeyCode::Char('d') => Some(AppAction::ToggleMarkdown),
            KeyCode::Char('u') => Some(AppAction::ClearInput),
            KeyCode::Home => Some(AppAction::ScrollToTop),
            KeyCode::End => Some(AppAction::ScrollToBottom),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Enter => Some(AppAction::SubmitMessage {
            message: input.to_string(),
        }),
        KeyCode::Esc => Some(AppAction::CancelStreaming),
        KeyCode::Backspace => Some(AppAction::Backspace),
        KeyCode::Up => Some(AppAction::ScrollUp { lines: 1 }),
        KeyCode::Down => Some(AppAction::ScrollDown { lines: 1 }),
        KeyCode::PageUp => Some(AppAction::ScrollUp { lines: page.max(1) }),
        KeyCode::PageDown => Some(AppAction::ScrollDown { lines: page.max(1) }),
        KeyCode::Char(ch) if !alt => Some(AppAction::InsertChar { ch }),
        _ => None,
    }
}

/// Make pasted text safe for the single-line input box.
pub(crate) fn sanitize_pasted_text(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace('\t', "    ")
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .filter(|&c| !c.is_control())
        .collect()
}
