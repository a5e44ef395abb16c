use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::app::SessionConfig;
use crate::core::backend::{
    Backend, Endpoints, DEFAULT_LOCAL_BASE_URL, DEFAULT_LOCAL_MODEL, DEFAULT_REMOTE_BASE_URL,
    DEFAULT_REMOTE_MODEL,
};
use crate::core::decoder::ChunkFraming;

/// Assistant message shown when a conversation starts.
pub const DEFAULT_GREETING: &str = "Hello! What can I help you today?";

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Backend selected at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
    /// Render assistant replies as markdown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<bool>,
    /// How response bodies are cut into lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framing: Option<ChunkFraming>,
    /// Opening assistant message; an empty string disables it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
}

/// Keys accepted by `set` and `unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigKey {
    Backend,
    Markdown,
    Framing,
    Greeting,
    LocalModel,
    LocalUrl,
    RemoteModel,
    RemoteUrl,
}

impl ConfigKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::Backend => "backend",
            ConfigKey::Markdown => "markdown",
            ConfigKey::Framing => "framing",
            ConfigKey::Greeting => "greeting",
            ConfigKey::LocalModel => "local-model",
            ConfigKey::LocalUrl => "local-url",
            ConfigKey::RemoteModel => "remote-model",
            ConfigKey::RemoteUrl => "remote-url",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn non_empty(value: &str, key: ConfigKey) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("{key} cannot be empty; use `unset {key}` instead"))
    } else {
        Ok(trimmed.to_string())
    }
}

impl Config {
    pub fn set_key(&mut self, key: ConfigKey, value: &str) -> Result<(), String> {
        match key {
            ConfigKey::Backend => {
                let backend = Backend::parse(value)
                    .ok_or_else(|| format!("Unknown backend '{value}'. Use local or remote."))?;
                self.backend = Some(backend);
            }
            ConfigKey::Markdown => {
                let enabled = parse_bool(value)
                    .ok_or_else(|| format!("Invalid markdown value '{value}'. Use on or off."))?;
                self.markdown = Some(enabled);
            }
            ConfigKey::Framing => {
                let framing = ChunkFraming::parse(value).ok_or_else(|| {
                    format!("Unknown framing '{value}'. Use buffered or per-chunk.")
                })?;
                self.framing = Some(framing);
            }
            // Kept verbatim so the greeting can be disabled with an empty string.
            ConfigKey::Greeting => self.greeting = Some(value.to_string()),
            ConfigKey::LocalModel => self.local_model = Some(non_empty(value, key)?),
            ConfigKey::LocalUrl => self.local_url = Some(non_empty(value, key)?),
            ConfigKey::RemoteModel => self.remote_model = Some(non_empty(value, key)?),
            ConfigKey::RemoteUrl => self.remote_url = Some(non_empty(value, key)?),
        }
        Ok(())
    }

    pub fn unset_key(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::Backend => self.backend = None,
            ConfigKey::Markdown => self.markdown = None,
            ConfigKey::Framing => self.framing = None,
            ConfigKey::Greeting => self.greeting = None,
            ConfigKey::LocalModel => self.local_model = None,
            ConfigKey::LocalUrl => self.local_url = None,
            ConfigKey::RemoteModel => self.remote_model = None,
            ConfigKey::RemoteUrl => self.remote_url = None,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            backend: self.backend.unwrap_or_default(),
            markdown: self.markdown.unwrap_or(false),
        }
    }

    pub fn framing(&self) -> ChunkFraming {
        self.framing.unwrap_or_default()
    }

    pub fn greeting(&self) -> &str {
        self.greeting.as_deref().unwrap_or(DEFAULT_GREETING)
    }

    /// Resolve connection settings. `OPENAI_BASE_URL` wins over the configured
    /// remote URL; the API key only ever comes from the environment.
    pub fn resolve_endpoints<F>(&self, env: F) -> Endpoints
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_value = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        Endpoints {
            remote_base_url: env_value(BASE_URL_ENV)
                .or_else(|| self.remote_url.clone())
                .unwrap_or_else(|| DEFAULT_REMOTE_BASE_URL.to_string()),
            remote_model: self
                .remote_model
                .clone()
                .unwrap_or_else(|| DEFAULT_REMOTE_MODEL.to_string()),
            api_key: env_value(API_KEY_ENV),
            local_base_url: self
                .local_url
                .clone()
                .unwrap_or_else(|| DEFAULT_LOCAL_BASE_URL.to_string()),
            local_model: self
                .local_model
                .clone()
                .unwrap_or_else(|| DEFAULT_LOCAL_MODEL.to_string()),
        }
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
