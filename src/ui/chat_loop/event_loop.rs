//! Event polling, dispatching, and UI rendering loop.
//!
//! Terminal input is read on its own task and turned into [`AppAction`]s.
//! Stream output arrives tagged with its stream identity and is coalesced
//! per frame. Every mutation of the [`App`] goes through
//! [`apply_actions`], and the commands it returns (spawning a stream) are
//! executed here.

use std::{
    error::Error,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use ratatui::prelude::Size;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use crate::core::app::{
    apply_actions, App, AppAction, AppActionContext, AppActionDispatcher, AppActionEnvelope,
    AppCommand,
};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::ui::renderer::ui;
use crate::utils::scroll::ScrollCalculator;

use super::keybindings::{resolve_key, sanitize_pasted_text};
use super::lifecycle::{restore_terminal, setup_terminal, SharedTerminal};
use super::AppHandle;

const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

async fn is_exit_requested(app: &AppHandle) -> bool {
    app.read(|app| app.ui.exit_requested).await
}

async fn current_terminal_size(terminal: &SharedTerminal) -> Size {
    let terminal_guard = terminal.lock().await;
    terminal_guard.size().unwrap_or_default()
}

async fn try_draw_frame(
    app: &AppHandle,
    terminal: &SharedTerminal,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    let mut terminal_guard = terminal.lock().await;
    app.update(|app| terminal_guard.draw(|f| ui(f, app)).map(|_| ()))
        .await?;
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

fn process_ui_events(
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    dispatcher: &AppActionDispatcher,
    input: &str,
    term_size: Size,
) -> bool {
    let ctx = AppActionContext {
        term_width: term_size.width,
        term_height: term_size.height,
    };
    let page = ScrollCalculator::transcript_height(term_size.height).saturating_sub(1);
    // Track edits locally so Enter submits what was typed earlier in the batch.
    let mut pending_input = input.to_string();
    let mut events_processed = false;

    while let Ok(ev) = event_rx.try_recv() {
        events_processed = true;
        match ev {
            UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                let Some(action) = resolve_key(&key, &pending_input, page) else {
                    continue;
                };
                match &action {
                    AppAction::InsertChar { ch } => pending_input.push(*ch),
                    AppAction::Backspace => {
                        pending_input.pop();
                    }
                    AppAction::ClearInput => pending_input.clear(),
                    AppAction::SubmitMessage { message } if !message.trim().is_empty() => {
                        pending_input.clear();
                    }
                    _ => {}
                }
                dispatcher.dispatch(action, ctx);
            }
            UiEvent::Crossterm(Event::Paste(text)) => {
                let text = sanitize_pasted_text(&text);
                if !text.is_empty() {
                    pending_input.push_str(&text);
                    dispatcher.dispatch(AppAction::InsertText { text }, ctx);
                }
            }
            UiEvent::Crossterm(_) => {}
        }
    }

    events_processed
}

fn process_stream_updates(
    dispatcher: &AppActionDispatcher,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    term_width: u16,
    term_height: u16,
    current_stream_id: u64,
) -> bool {
    let mut received_any = false;
    let mut actions = Vec::new();
    let mut coalesced_chunks = String::new();

    while let Ok((message, msg_stream_id)) = rx.try_recv() {
        received_any = true;
        if msg_stream_id != current_stream_id {
            continue;
        }

        match message {
            StreamMessage::Chunk(content) => {
                coalesced_chunks.push_str(&content);
            }
            other => {
                // Keep fragments ahead of the notice or completion that followed them.
                if !coalesced_chunks.is_empty() {
                    actions.push(AppAction::AppendResponseChunk {
                        content: std::mem::take(&mut coalesced_chunks),
                        stream_id: msg_stream_id,
                    });
                }
                actions.push(AppAction::from_stream_message(other, msg_stream_id));
            }
        }
    }

    if !coalesced_chunks.is_empty() {
        actions.push(AppAction::AppendResponseChunk {
            content: coalesced_chunks,
            stream_id: current_stream_id,
        });
    }

    if !actions.is_empty() {
        dispatcher.dispatch_many(
            actions,
            AppActionContext {
                term_width,
                term_height,
            },
        );
    }

    received_any
}

async fn drain_action_queue(
    app: &AppHandle,
    stream_service: &ChatStreamService,
    action_rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>,
) -> bool {
    let mut pending = Vec::new();
    while let Ok(envelope) = action_rx.try_recv() {
        pending.push(envelope);
    }

    if pending.is_empty() {
        return false;
    }

    let commands = app.update(|app| apply_actions(app, pending)).await;
    for cmd in commands {
        match cmd {
            AppCommand::SpawnStream(params) => {
                debug!(stream_id = params.stream_id, "spawning stream task");
                stream_service.spawn_stream(params);
            }
        }
    }
    true
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

fn status_expired(app: &App) -> bool {
    app.ui
        .status_set_at
        .is_some_and(|set_at| set_at.elapsed() >= STATUS_TIMEOUT)
}

async fn run_event_loop(
    app: &AppHandle,
    terminal: &SharedTerminal,
    stream_service: &ChatStreamService,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
) -> Result<(), Box<dyn Error>> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppActionEnvelope>();
    let dispatcher = AppActionDispatcher::new(action_tx);

    const MAX_FPS: u64 = 60;
    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;

    loop {
        if is_exit_requested(app).await {
            return Ok(());
        }

        try_draw_frame(
            app,
            terminal,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        )
        .await?;

        let term_size = current_terminal_size(terminal).await;
        let (input, size_changed) = app
            .update(|app| {
                let size_changed = app.ui.last_term_size != term_size;
                app.ui.last_term_size = term_size;
                (app.ui.input.clone(), size_changed)
            })
            .await;
        if size_changed {
            request_redraw = true;
        }

        let events_processed = process_ui_events(event_rx, &dispatcher, &input, term_size);
        if events_processed {
            request_redraw = true;
        }

        let (current_stream_id, clear_status) = app
            .read(|app| (app.session.current_stream_id, status_expired(app)))
            .await;
        if clear_status {
            dispatcher.dispatch(AppAction::ClearStatus, AppActionContext::default());
        }

        let received_any = process_stream_updates(
            &dispatcher,
            rx,
            term_size.width,
            term_size.height,
            current_stream_id,
        );
        if received_any {
            request_redraw = true;
        }

        if drain_action_queue(app, stream_service, &mut action_rx).await {
            request_redraw = true;
        }

        let idle = !events_processed && !received_any && !request_redraw;
        if idle {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    }
}

pub async fn run_chat(app: App) -> Result<(), Box<dyn Error>> {
    let app = AppHandle::new(Arc::new(Mutex::new(app)));
    let (stream_service, mut rx) = ChatStreamService::new();

    let terminal = setup_terminal()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);

    info!("chat session started");
    let result = run_event_loop(&app, &terminal, &stream_service, &mut rx, &mut event_rx).await;

    app.update(|app| app.cancel_current_stream()).await;
    event_reader_handle.abort();
    restore_terminal(&terminal).await?;
    info!("chat session ended");

    result
}
