//! Turns raw response-body bytes into text fragments.
//!
//! Both wire formats are line oriented. Remote servers frame each payload as a
//! server-sent event (`data: {...}`) and close with `data: [DONE]`; the local
//! server writes one bare JSON object per line and simply closes the
//! connection. A line that cannot be decoded is skipped and never stops the
//! lines after it.

use std::str::Split;

use memchr::memchr;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::api::{ChatResponse, GenerateResponse};
use crate::core::backend::Backend;

const SSE_DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    Fragment(String),
    /// The body carried an error object instead of content.
    Error(String),
    /// The `[DONE]` sentinel was seen.
    Done,
}

/// How body chunks are cut into lines.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkFraming {
    /// Hold bytes until a newline arrives, so a line split across two chunks
    /// is reassembled.
    #[default]
    Buffered,
    /// Decode every chunk on its own; the halves of a split line are dropped.
    PerChunk,
}

impl ChunkFraming {
    pub fn as_str(self) -> &'static str {
        match self {
            ChunkFraming::Buffered => "buffered",
            ChunkFraming::PerChunk => "per-chunk",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "buffered" => Some(ChunkFraming::Buffered),
            "per-chunk" | "perchunk" => Some(ChunkFraming::PerChunk),
            _ => None,
        }
    }
}

/// Decode one line: trim, strip SSE framing, then extract the fragment for
/// `backend`. Returns `None` for anything that carries no event.
pub fn decode_line(line: &str, backend: Backend) -> Option<DecodeEvent> {
    let mut cleaned = line.trim();
    if let Some(payload) = cleaned.strip_prefix(SSE_DATA_PREFIX) {
        cleaned = payload.trim();
    }

    if cleaned.is_empty() {
        return None;
    }

    if cleaned == DONE_SENTINEL {
        return Some(DecodeEvent::Done);
    }

    let value: Value = match serde_json::from_str(cleaned) {
        Ok(value) => value,
        Err(err) => {
            debug!(%err, line = cleaned, "skipping undecodable stream line");
            return None;
        }
    };

    if !value.is_object() {
        debug!(line = cleaned, "skipping non-object stream line");
        return None;
    }

    let fragment = match backend {
        Backend::Remote => ChatResponse::deserialize(&value)
            .ok()
            .and_then(ChatResponse::first_content),
        Backend::Local => GenerateResponse::deserialize(&value)
            .ok()
            .map(|response| response.response),
    };

    match fragment {
        Some(text) if text.is_empty() => None,
        Some(text) => Some(DecodeEvent::Fragment(text)),
        None => extract_error_summary(&value).map(DecodeEvent::Error),
    }
}

/// Lazily decodes the lines of one chunk of text. Stops after `Done`.
pub struct DecodedLines<'a> {
    lines: Split<'a, char>,
    backend: Backend,
    done: bool,
}

impl Iterator for DecodedLines<'_> {
    type Item = DecodeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        for line in self.lines.by_ref() {
            if let Some(event) = decode_line(line, self.backend) {
                if event == DecodeEvent::Done {
                    self.done = true;
                }
                return Some(event);
            }
        }
        self.done = true;
        None
    }
}

pub fn decode_lines(text: &str, backend: Backend) -> DecodedLines<'_> {
    DecodedLines {
        lines: text.split('\n'),
        backend,
        done: false,
    }
}

/// Everything decoded from one delivery, in line order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedChunk {
    pub events: Vec<DecodeEvent>,
}

impl DecodedChunk {
    pub fn fragments(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|event| match event {
            DecodeEvent::Fragment(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn is_finished(&self) -> bool {
        self.events.last() == Some(&DecodeEvent::Done)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Decode a single chunk in isolation. Invalid UTF-8 drops the whole chunk.
pub fn decode_chunk(bytes: &[u8], backend: Backend) -> DecodedChunk {
    match std::str::from_utf8(bytes) {
        Ok(text) => DecodedChunk {
            events: decode_lines(text, backend).collect(),
        },
        Err(err) => {
            debug!(%err, len = bytes.len(), "dropping chunk with invalid UTF-8");
            DecodedChunk::default()
        }
    }
}

/// Per-stream decoder state.
#[derive(Debug)]
pub struct StreamDecoder {
    backend: Backend,
    framing: ChunkFraming,
    buffer: Vec<u8>,
    finished: bool,
}

impl StreamDecoder {
    pub fn new(backend: Backend, framing: ChunkFraming) -> Self {
        Self {
            backend,
            framing,
            buffer: Vec::new(),
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn feed(&mut self, bytes: &[u8]) -> DecodedChunk {
        if self.finished {
            return DecodedChunk::default();
        }

        let decoded = match self.framing {
            ChunkFraming::PerChunk => decode_chunk(bytes, self.backend),
            ChunkFraming::Buffered => {
                self.buffer.extend_from_slice(bytes);
                self.drain_complete_lines()
            }
        };

        if decoded.is_finished() {
            self.finished = true;
            self.buffer.clear();
        }
        decoded
    }

    /// Flush a trailing line that was never newline-terminated.
    pub fn finish(&mut self) -> DecodedChunk {
        if self.finished || self.buffer.is_empty() {
            self.buffer.clear();
            return DecodedChunk::default();
        }

        let rest = std::mem::take(&mut self.buffer);
        let mut decoded = DecodedChunk::default();
        if let Some(event) = self.decode_line_bytes(&rest) {
            decoded.events.push(event);
        }
        if decoded.is_finished() {
            self.finished = true;
        }
        decoded
    }

    fn drain_complete_lines(&mut self) -> DecodedChunk {
        let mut decoded = DecodedChunk::default();
        let mut consumed = 0;

        while let Some(offset) = memchr(b'\n', &self.buffer[consumed..]) {
            let line_end = consumed + offset;
            let event = self.decode_line_bytes(&self.buffer[consumed..line_end]);
            consumed = line_end + 1;

            if let Some(event) = event {
                let done = event == DecodeEvent::Done;
                decoded.events.push(event);
                if done {
                    break;
                }
            }
        }

        self.buffer.drain(..consumed);
        decoded
    }

    fn decode_line_bytes(&self, bytes: &[u8]) -> Option<DecodeEvent> {
        match std::str::from_utf8(bytes) {
            Ok(line) => decode_line(line, self.backend),
            Err(err) => {
                debug!(%err, "skipping stream line with invalid UTF-8");
                None
            }
        }
    }
}

pub(crate) fn extract_error_summary(value: &Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| value.get("error").and_then(Value::as_str))
        .or_else(|| value.get("message").and_then(Value::as_str))?;

    let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}
