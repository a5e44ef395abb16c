use futures_util::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::backend::BackendProfile;
use crate::core::decoder::{
    extract_error_summary, ChunkFraming, DecodeEvent, DecodedChunk, StreamDecoder,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamMessage {
    Chunk(String),
    /// An error object decoded from the body; the stream keeps going.
    Notice(String),
    /// The request itself failed; an `End` always follows.
    Error(String),
    End,
}

pub(crate) fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            if let Some(summary) = extract_error_summary(&json_value) {
                if !summary.is_empty() {
                    return format!("API Error: {}\n```json\n{}\n```", summary, pretty_json);
                }
            }
            return format!("API Error:\n```json\n{}\n```", pretty_json);
        }
    }

    format!("API Error:\n```\n{}\n```", trimmed)
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub profile: BackendProfile,
    pub framing: ChunkFraming,
    pub input: String,
    pub cancel_token: tokio_util::sync::CancellationToken,
    pub stream_id: u64,
}

/// Publishes decoded stream output tagged with the stream identity.
#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_stream(&self, params: StreamParams) -> tokio::task::JoinHandle<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let cancel_token = params.cancel_token.clone();
            let stream_id = params.stream_id;
            tokio::select! {
                _ = run_stream(params, &tx) => {}
                _ = cancel_token.cancelled() => {
                    debug!(stream_id, "stream cancelled");
                }
            }
        })
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

/// Forward one decoded delivery. Returns true once the stream is finished.
fn publish(
    decoded: DecodedChunk,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
    stream_id: u64,
) -> bool {
    for event in decoded.events {
        let message = match event {
            DecodeEvent::Fragment(text) => StreamMessage::Chunk(text),
            DecodeEvent::Error(text) => StreamMessage::Notice(text),
            DecodeEvent::Done => {
                let _ = tx.send((StreamMessage::End, stream_id));
                return true;
            }
        };
        let _ = tx.send((message, stream_id));
    }
    false
}

async fn run_stream(params: StreamParams, tx: &mpsc::UnboundedSender<(StreamMessage, u64)>) {
    let StreamParams {
        client,
        profile,
        framing,
        input,
        cancel_token,
        stream_id,
    } = params;

    let backend = profile.backend();
    let request = profile.build_request(&input);
    debug!(stream_id, %backend, url = %request.url, "opening stream");

    let response = match request.into_request_builder(&client).send().await {
        Ok(response) => response,
        Err(err) => {
            warn!(stream_id, %err, "request failed");
            let _ = tx.send((StreamMessage::Error(format_api_error(&err.to_string())), stream_id));
            let _ = tx.send((StreamMessage::End, stream_id));
            return;
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        warn!(stream_id, %status, "backend returned an error status");
        let _ = tx.send((StreamMessage::Error(format_api_error(&error_text)), stream_id));
        let _ = tx.send((StreamMessage::End, stream_id));
        return;
    }

    let mut decoder = StreamDecoder::new(backend, framing);
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        if cancel_token.is_cancelled() {
            return;
        }

        match chunk {
            Ok(bytes) => {
                if publish(decoder.feed(&bytes), tx, stream_id) {
                    debug!(stream_id, "stream finished by sentinel");
                    return;
                }
            }
            Err(err) => {
                debug!(stream_id, %err, "body read failed");
                break;
            }
        }
    }

    if cancel_token.is_cancelled() {
        return;
    }

    if !publish(decoder.finish(), tx, stream_id) {
        let _ = tx.send((StreamMessage::End, stream_id));
    }
    debug!(stream_id, "stream closed by server");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::BackendProfile;
    use crate::utils::test_utils::{spawn_streaming_server, test_client};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    async fn collect_until_end(
        rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    ) -> Vec<(StreamMessage, u64)> {
        let mut received = Vec::new();
        loop {
            let next = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("stream should not stall");
            match next {
                Some((StreamMessage::End, id)) => {
                    received.push((StreamMessage::End, id));
                    break;
                }
                Some(message) => received.push(message),
                None => break,
            }
        }
        received
    }

    #[test]
    fn format_api_error_prettifies_json_with_summary() {
        let raw = r#"{"error":{"message":"model overloaded","type":"invalid_request_error"}}"#;
        let expected = r#"API Error: model overloaded
```json
{
  "error": {
    "message": "model overloaded",
    "type": "invalid_request_error"
  }
}
```"#;
        assert_eq!(format_api_error(raw), expected);
    }

    #[test]
    fn format_api_error_handles_plaintext_and_empty() {
        assert_eq!(
            format_api_error("connection refused"),
            "API Error:\n```\nconnection refused\n```"
        );
        assert_eq!(format_api_error("  "), "API Error:\n```\n<empty>\n```");
    }

    #[test]
    fn publish_stops_at_done() {
        let (service, mut rx) = ChatStreamService::new();
        let decoded = DecodedChunk {
            events: vec![
                DecodeEvent::Fragment("Hi".into()),
                DecodeEvent::Error("slow down".into()),
                DecodeEvent::Done,
            ],
        };
        assert!(publish(decoded, &service.tx, 3));

        assert_eq!(rx.try_recv().unwrap(), (StreamMessage::Chunk("Hi".into()), 3));
        assert_eq!(
            rx.try_recv().unwrap(),
            (StreamMessage::Notice("slow down".into()), 3)
        );
        assert_eq!(rx.try_recv().unwrap(), (StreamMessage::End, 3));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn local_stream_delivers_fragments_then_end_on_close() {
        let (base_url, server) = spawn_streaming_server(
            "application/x-ndjson",
            vec![
                b"{\"response\":\"He\"}\n".to_vec(),
                b"{\"response\":\"llo\"}\n".to_vec(),
            ],
        )
        .await;

        let (service, mut rx) = ChatStreamService::new();
        service.spawn_stream(StreamParams {
            client: test_client(),
            profile: BackendProfile::Local {
                base_url,
                model: "test".into(),
            },
            framing: ChunkFraming::Buffered,
            input: "hello".into(),
            cancel_token: CancellationToken::new(),
            stream_id: 1,
        });

        let received = collect_until_end(&mut rx).await;
        assert_eq!(
            received,
            vec![
                (StreamMessage::Chunk("He".into()), 1),
                (StreamMessage::Chunk("llo".into()), 1),
                (StreamMessage::End, 1),
            ]
        );

        let captured = server.await.expect("server task");
        assert!(captured.request_line.starts_with("POST /api/generate "));
        let body: serde_json::Value = serde_json::from_slice(&captured.body).expect("json body");
        assert_eq!(body["prompt"], "hello");
        assert_eq!(body["stream"], true);
    }

    #[tokio::test]
    async fn remote_stream_ends_once_on_done_sentinel() {
        let (base_url, server) = spawn_streaming_server(
            "text/event-stream",
            vec![
                b"data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n"
                    .to_vec(),
            ],
        )
        .await;

        let (service, mut rx) = ChatStreamService::new();
        let handle = service.spawn_stream(StreamParams {
            client: test_client(),
            profile: BackendProfile::Remote {
                base_url,
                api_key: "sk-test".into(),
                model: "gpt-4o".into(),
            },
            framing: ChunkFraming::PerChunk,
            input: "hi".into(),
            cancel_token: CancellationToken::new(),
            stream_id: 9,
        });

        let received = collect_until_end(&mut rx).await;
        assert_eq!(
            received,
            vec![(StreamMessage::Chunk("Hi".into()), 9), (StreamMessage::End, 9)]
        );

        handle.await.expect("stream task");
        assert!(rx.try_recv().is_err(), "only one End per stream");

        let captured = server.await.expect("server task");
        assert!(captured.request_line.starts_with("POST /chat/completions "));
        assert!(captured
            .headers
            .iter()
            .any(|(name, value)| name.eq_ignore_ascii_case("authorization")
                && value == "Bearer sk-test"));
    }

    #[tokio::test]
    async fn error_status_reports_error_then_end() {
        let (base_url, _server) = crate::utils::test_utils::spawn_error_server(
            404,
            r#"{"error":"model 'missing' not found"}"#,
        )
        .await;

        let (service, mut rx) = ChatStreamService::new();
        service.spawn_stream(StreamParams {
            client: test_client(),
            profile: BackendProfile::Local {
                base_url,
                model: "missing".into(),
            },
            framing: ChunkFraming::Buffered,
            input: "hello".into(),
            cancel_token: CancellationToken::new(),
            stream_id: 4,
        });

        let received = collect_until_end(&mut rx).await;
        assert_eq!(received.len(), 2);
        match &received[0] {
            (StreamMessage::Error(text), 4) => {
                assert!(text.starts_with("API Error: model 'missing' not found"));
            }
            other => panic!("expected error message, got {other:?}"),
        }
        assert_eq!(received[1], (StreamMessage::End, 4));
    }

    #[tokio::test]
    async fn cancelled_stream_publishes_nothing_further() {
        let (base_url, _server) = crate::utils::test_utils::spawn_stalling_server(
            b"{\"response\":\"first\"}\n".to_vec(),
        )
        .await;

        let (service, mut rx) = ChatStreamService::new();
        let cancel_token = CancellationToken::new();
        let handle = service.spawn_stream(StreamParams {
            client: test_client(),
            profile: BackendProfile::Local {
                base_url,
                model: "test".into(),
            },
            framing: ChunkFraming::Buffered,
            input: "hello".into(),
            cancel_token: cancel_token.clone(),
            stream_id: 2,
        });

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("first fragment");
        assert_eq!(first, Some((StreamMessage::Chunk("first".into()), 2)));

        cancel_token.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("task exits after cancel")
            .expect("task joins");

        assert!(rx.try_recv().is_err());
    }
}
