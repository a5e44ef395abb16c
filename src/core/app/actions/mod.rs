mod input;
mod streaming;

use tokio::sync::mpsc;

use super::App;
use crate::core::chat_stream::{StreamMessage, StreamParams};

pub enum AppAction {
    AppendResponseChunk { content: String, stream_id: u64 },
    StreamNotice { message: String, stream_id: u64 },
    StreamErrored { message: String, stream_id: u64 },
    StreamCompleted { stream_id: u64 },
    CancelStreaming,
    SubmitMessage { message: String },
    ToggleBackend,
    ToggleMarkdown,
    InsertChar { ch: char },
    InsertText { text: String },
    Backspace,
    ClearInput,
    ScrollUp { lines: u16 },
    ScrollDown { lines: u16 },
    ScrollToTop,
    ScrollToBottom,
    ClearStatus,
    Quit,
}

impl AppAction {
    pub fn from_stream_message(message: StreamMessage, stream_id: u64) -> Self {
        match message {
            StreamMessage::Chunk(content) => AppAction::AppendResponseChunk { content, stream_id },
            StreamMessage::Notice(message) => AppAction::StreamNotice { message, stream_id },
            StreamMessage::Error(message) => AppAction::StreamErrored { message, stream_id },
            StreamMessage::End => AppAction::StreamCompleted { stream_id },
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppActionContext {
    pub term_width: u16,
    pub term_height: u16,
}

pub struct AppActionEnvelope {
    pub action: AppAction,
    pub context: AppActionContext,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppActionEnvelope>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppActionEnvelope>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, action: AppAction, ctx: AppActionContext) {
        let _ = self.tx.send(AppActionEnvelope {
            action,
            context: ctx,
        });
    }

    pub fn dispatch_many<I>(&self, actions: I, ctx: AppActionContext)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions.into_iter() {
            self.dispatch(action, ctx);
        }
    }
}

pub enum AppCommand {
    SpawnStream(StreamParams),
}

pub fn apply_actions(
    app: &mut App,
    envelopes: impl IntoIterator<Item = AppActionEnvelope>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for envelope in envelopes {
        if let Some(cmd) = apply_action(app, envelope.action, envelope.context) {
            commands.push(cmd);
        }
    }
    commands
}

pub fn apply_action(app: &mut App, action: AppAction, ctx: AppActionContext) -> Option<AppCommand> {
    match action {
        AppAction::AppendResponseChunk { .. }
        | AppAction::StreamNotice { .. }
        | AppAction::StreamErrored { .. }
        | AppAction::StreamCompleted { .. }
        | AppAction::CancelStreaming
        | AppAction::SubmitMessage { .. } => streaming::handle_streaming_action(app, action, ctx),

        AppAction::ToggleBackend
        | AppAction::ToggleMarkdown
        | AppAction::InsertChar { .. }
        | AppAction::InsertText { .. }
        | AppAction::Backspace
        | AppAction::ClearInput
        | AppAction::ScrollUp { .. }
        | AppAction::ScrollDown { .. }
        | AppAction::ScrollToTop
        | AppAction::ScrollToBottom
        | AppAction::ClearStatus
        | AppAction::Quit => input::handle_input_action(app, action, ctx),
    }
}
