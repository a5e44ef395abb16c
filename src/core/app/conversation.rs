use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{session::SessionContext, ui_state::UiState};
use crate::core::message::{MessageId, TranscriptRole};

pub struct ConversationController<'a> {
    session: &'a mut SessionContext,
    ui: &'a mut UiState,
}

impl<'a> ConversationController<'a> {
    pub fn new(session: &'a mut SessionContext, ui: &'a mut UiState) -> Self {
        Self { session, ui }
    }

    pub fn add_user_message(&mut self, content: String) -> MessageId {
        self.ui.clear_status();
        self.ui.auto_scroll = true;
        self.ui.conversation.push(TranscriptRole::User, content)
    }

    /// Push the empty assistant message that the next stream writes into.
    pub fn add_placeholder(&mut self) -> MessageId {
        let id = self
            .ui
            .conversation
            .push(TranscriptRole::Assistant, String::new());
        self.session.active_placeholder = Some(id);
        id
    }

    pub fn append_to_response(&mut self, content: &str) {
        let Some(id) = self.session.active_placeholder else {
            return;
        };
        if !self.ui.conversation.append_to(id, content) {
            debug!(%id, "placeholder missing; dropping fragment");
        }
    }

    pub fn add_app_message(&mut self, role: TranscriptRole, content: String) -> MessageId {
        debug_assert!(role.is_app());
        self.ui.conversation.push(role, content)
    }

    pub fn cancel_current_stream(&mut self) {
        if let Some(token) = self.session.stream_cancel_token.take() {
            token.cancel();
            debug!(stream_id = self.session.current_stream_id, "stream retired by cancel");
        }
        self.session.active_placeholder = None;
        self.ui.end_streaming();
    }

    pub fn start_new_stream(&mut self) -> (CancellationToken, u64) {
        self.cancel_current_stream();

        self.session.current_stream_id += 1;

        let token = CancellationToken::new();
        self.session.stream_cancel_token = Some(token.clone());
        self.ui.begin_streaming();

        (token, self.session.current_stream_id)
    }

    /// Retire the live stream after it ended on its own.
    pub fn finalize_response(&mut self) {
        self.session.stream_cancel_token = None;
        self.session.active_placeholder = None;
        self.ui.end_streaming();
    }
}
