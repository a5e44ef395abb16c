//! Chat session state and the actions that mutate it.
//!
//! `App` is owned by the UI task. Streams never touch it directly; their
//! output arrives as [`AppAction`]s tagged with a stream identity and is
//! applied through [`apply_actions`].

use reqwest::Client;

use crate::core::backend::Endpoints;
use crate::core::conversation::Conversation;
use crate::core::decoder::ChunkFraming;

pub mod actions;
pub mod conversation;
pub mod session;
pub mod ui_state;

pub use actions::{
    apply_action, apply_actions, AppAction, AppActionContext, AppActionDispatcher,
    AppActionEnvelope, AppCommand,
};
pub use conversation::ConversationController;
pub use session::{SessionConfig, SessionContext};
pub use ui_state::UiState;


pub struct App {
    pub session: SessionContext,
    pub ui: UiState,
}

impl App {
    pub fn new(
        client: Client,
        endpoints: Endpoints,
        config: SessionConfig,
        framing: ChunkFraming,
        greeting: &str,
    ) -> Self {
        Self {
            session: SessionContext::new(client, endpoints, config, framing),
            ui: UiState::new(Conversation::with_greeting(greeting)),
        }
    }

    pub fn conversation(&mut self) -> ConversationController<'_> {
        ConversationController::new(&mut self.session, &mut self.ui)
    }

    /// A stream is live only while its identity is current and its token has
    /// not been retired by completion or cancellation.
    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.session.has_stream_in_flight() && self.session.current_stream_id == stream_id
    }

    pub fn is_generating(&self) -> bool {
        self.ui.is_generating
    }

    pub fn markdown_enabled(&self) -> bool {
        self.session.config.markdown
    }

    pub fn cancel_current_stream(&mut self) {
        self.conversation().cancel_current_stream();
    }

    pub fn clear_status(&mut self) {
        self.ui.clear_status();
    }
}
