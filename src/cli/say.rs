//! TUI-less "say" command

use std::error::Error;
use std::io::{self, Write};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

use crate::cli::SessionSettings;
use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::ui::markdown::render_markdown;
use crate::ui::theme::Theme;

pub async fn run_say(
    prompt: &[String],
    settings: SessionSettings,
    client: reqwest::Client,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err("Usage: llm-playground say <prompt>".into());
    }

    let profile = settings.endpoints.profile(settings.config.backend)?;
    let (stream_service, rx) = ChatStreamService::new();
    stream_service.spawn_stream(StreamParams {
        client,
        profile,
        framing: settings.framing,
        input: prompt,
        cancel_token: CancellationToken::new(),
        stream_id: 1,
    });
    drop(stream_service);

    let markdown = settings.config.markdown;
    let mut stdout = io::stdout().lock();
    let reply = collect_reply(rx, !markdown, &mut stdout).await?;

    if markdown {
        write_markdown(&reply, &mut stdout)?;
    }
    Ok(())
}

/// Drain one stream into `out`, echoing fragments as they arrive when
/// `echo` is set. Returns the full reply.
pub(crate) async fn collect_reply<W: Write>(
    mut rx: UnboundedReceiver<(StreamMessage, u64)>,
    echo: bool,
    out: &mut W,
) -> Result<String, Box<dyn Error>> {
    let mut reply = String::new();
    let mut failure = None;

    while let Some((message, _)) = rx.recv().await {
        match message {
            StreamMessage::Chunk(content) => {
                reply.push_str(&content);
                if echo {
                    write!(out, "{content}")?;
                    out.flush()?;
                }
            }
            StreamMessage::Notice(notice) => eprintln!("⚠️  {}", notice.trim()),
            StreamMessage::Error(err) => failure = Some(err),
            StreamMessage::End => break,
        }
    }

    if echo && !reply.is_empty() {
        writeln!(out)?;
    }
    match failure {
        Some(err) => Err(err.into()),
        None => Ok(reply),
    }
}

fn write_markdown<W: Write>(reply: &str, out: &mut W) -> io::Result<()> {
    let theme = Theme::default();
    for line in render_markdown(reply, theme.assistant_text_style, &theme) {
        let text: String = line.spans.iter().map(|span| span.content.as_ref()).collect();
        writeln!(out, "{text}")?;
    }
    Ok(())
}
