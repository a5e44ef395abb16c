use tracing::{debug, warn};

use super::{App, AppAction, AppActionContext, AppCommand};
use crate::core::chat_stream::StreamParams;
use crate::core::message::TranscriptRole;

pub(super) fn handle_streaming_action(
    app: &mut App,
    action: AppAction,
    _ctx: AppActionContext,
) -> Option<AppCommand> {
    match action {
        AppAction::AppendResponseChunk { content, stream_id } => {
            if !app.is_current_stream(stream_id) {
                return None;
            }
            append_response_chunk(app, &content);
            None
        }
        AppAction::StreamNotice { message, stream_id } => {
            if !app.is_current_stream(stream_id) {
                return None;
            }
            append_stream_notice(app, message);
            None
        }
        AppAction::StreamErrored { message, stream_id } => {
            if !app.is_current_stream(stream_id) {
                return None;
            }
            handle_stream_error(app, message);
            None
        }
        AppAction::StreamCompleted { stream_id } => {
            if !app.is_current_stream(stream_id) {
                return None;
            }
            debug!(stream_id, "stream completed");
            app.conversation().finalize_response();
            None
        }
        AppAction::CancelStreaming => {
            app.cancel_current_stream();
            None
        }
        AppAction::SubmitMessage { message } => spawn_stream_for_message(app, message),
        _ => unreachable!("non-streaming action routed to streaming handler"),
    }
}

pub(super) fn spawn_stream_for_message(app: &mut App, message: String) -> Option<AppCommand> {
    if message.trim().is_empty() {
        return None;
    }

    app.ui.input.clear();

    let profile = match app.session.active_profile() {
        Ok(profile) => profile,
        Err(err) => {
            warn!(backend = %app.session.config.backend, %err, "cannot dispatch request");
            let mut conversation = app.conversation();
            conversation.cancel_current_stream();
            conversation.add_user_message(message);
            conversation.add_app_message(TranscriptRole::AppError, err.to_string());
            return None;
        }
    };

    let mut conversation = app.conversation();
    conversation.add_user_message(message.clone());
    let (cancel_token, stream_id) = conversation.start_new_stream();
    conversation.add_placeholder();

    debug!(stream_id, backend = %profile.backend(), model = profile.model(), "dispatching request");

    Some(AppCommand::SpawnStream(StreamParams {
        client: app.session.client.clone(),
        profile,
        framing: app.session.framing,
        input: message,
        cancel_token,
        stream_id,
    }))
}

fn append_response_chunk(app: &mut App, chunk: &str) {
    if chunk.is_empty() {
        return;
    }
    app.conversation().append_to_response(chunk);
}

fn append_stream_notice(app: &mut App, message: String) {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return;
    }
    app.conversation()
        .add_app_message(TranscriptRole::AppError, trimmed.to_string());
}

fn handle_stream_error(app: &mut App, message: String) {
    let error_message = message.trim();
    let mut conversation = app.conversation();
    if !error_message.is_empty() {
        conversation.add_app_message(TranscriptRole::AppError, error_message.to_string());
    }
    conversation.finalize_response();
}
