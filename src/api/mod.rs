//! Request and response payloads for the two backend wire formats.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// OpenAI-style chat completion request.
#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

/// Local `/api/generate` request.
#[derive(Serialize, Debug)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

#[derive(Deserialize)]
pub struct ChatResponseDelta {
    pub content: Option<String>,
}

#[derive(Deserialize)]
pub struct ChatResponseChoice {
    pub delta: Option<ChatResponseDelta>,
}

/// One server-sent event payload from the remote backend. Only the first
/// choice is read, so later entries are kept untyped.
#[derive(Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Value>,
}

impl ChatResponse {
    pub fn first_content(self) -> Option<String> {
        let first = self.choices.into_iter().next()?;
        ChatResponseChoice::deserialize(first)
            .ok()?
            .delta
            .and_then(|delta| delta.content)
    }
}

/// One line of the local backend's newline-delimited JSON stream.
#[derive(Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}
