//! Backend profiles: where a prompt is sent and what the request looks like.
//!
//! The remote profile speaks the OpenAI chat-completions dialect and answers
//! with server-sent events. The local profile targets an Ollama-style
//! `/api/generate` endpoint that answers with newline-delimited JSON.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::{ChatMessage, ChatRequest, GenerateRequest};

pub const DEFAULT_REMOTE_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_REMOTE_MODEL: &str = "gpt-4o";
pub const DEFAULT_LOCAL_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_LOCAL_MODEL: &str = "3B-lora-sft";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    #[default]
    Local,
    Remote,
}

impl Backend {
    pub fn toggled(self) -> Self {
        match self {
            Backend::Local => Backend::Remote,
            Backend::Remote => Backend::Local,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Local => "local",
            Backend::Remote => "remote",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Backend::Local),
            "remote" => Some(Backend::Remote),
            _ => None,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request shape for one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendProfile {
    Remote {
        base_url: String,
        api_key: String,
        model: String,
    },
    Local {
        base_url: String,
        model: String,
    },
}

/// Everything needed to issue the HTTP call, independent of the client.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl PreparedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn into_request_builder(self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let mut builder = client.post(self.url);
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        builder.json(&self.body)
    }
}

impl BackendProfile {
    pub fn backend(&self) -> Backend {
        match self {
            BackendProfile::Remote { .. } => Backend::Remote,
            BackendProfile::Local { .. } => Backend::Local,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            BackendProfile::Remote { model, .. } | BackendProfile::Local { model, .. } => model,
        }
    }

    /// Build the request for a single user turn. Only `input` is sent; earlier
    /// turns are not replayed.
    pub fn build_request(&self, input: &str) -> PreparedRequest {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];

        match self {
            BackendProfile::Remote {
                base_url,
                api_key,
                model,
            } => {
                headers.push(("Authorization".to_string(), format!("Bearer {api_key}")));
                let request = ChatRequest {
                    model: model.clone(),
                    messages: vec![ChatMessage {
                        role: "user".to_string(),
                        content: input.to_string(),
                    }],
                    stream: true,
                };
                PreparedRequest {
                    url: construct_api_url(base_url, "chat/completions"),
                    headers,
                    body: serde_json::to_value(request).unwrap_or_default(),
                }
            }
            BackendProfile::Local { base_url, model } => {
                let request = GenerateRequest {
                    model: model.clone(),
                    prompt: input.to_string(),
                    stream: true,
                };
                PreparedRequest {
                    url: construct_api_url(base_url, "api/generate"),
                    headers,
                    body: serde_json::to_value(request).unwrap_or_default(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    MissingApiKey,
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::MissingApiKey => write!(
                f,
                "No API key for the remote backend. Set OPENAI_API_KEY and restart."
            ),
        }
    }
}

impl std::error::Error for ProfileError {}

/// Connection settings for both backends, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub remote_base_url: String,
    pub remote_model: String,
    pub api_key: Option<String>,
    pub local_base_url: String,
    pub local_model: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            remote_base_url: DEFAULT_REMOTE_BASE_URL.to_string(),
            remote_model: DEFAULT_REMOTE_MODEL.to_string(),
            api_key: None,
            local_base_url: DEFAULT_LOCAL_BASE_URL.to_string(),
            local_model: DEFAULT_LOCAL_MODEL.to_string(),
        }
    }
}

impl Endpoints {
    pub fn model_for(&self, backend: Backend) -> &str {
        match backend {
            Backend::Remote => &self.remote_model,
            Backend::Local => &self.local_model,
        }
    }

    pub fn set_model(&mut self, backend: Backend, model: String) {
        match backend {
            Backend::Remote => self.remote_model = model,
            Backend::Local => self.local_model = model,
        }
    }

    pub fn profile(&self, backend: Backend) -> Result<BackendProfile, ProfileError> {
        match backend {
            Backend::Remote => {
                let api_key = self
                    .api_key
                    .as_deref()
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .ok_or(ProfileError::MissingApiKey)?;
                Ok(BackendProfile::Remote {
                    base_url: self.remote_base_url.clone(),
                    api_key: api_key.to_string(),
                    model: self.remote_model.clone(),
                })
            }
            Backend::Local => Ok(BackendProfile::Local {
                base_url: self.local_base_url.clone(),
                model: self.local_model.clone(),
            }),
        }
    }
}

/// Join a base URL and an endpoint path without doubling the slash.
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    format!("{base}/{endpoint}")
}
