use super::data::{path_display, Config, ConfigKey, DEFAULT_GREETING};
use super::io::ConfigError;
use crate::core::app::SessionConfig;
use crate::core::backend::{Backend, DEFAULT_LOCAL_BASE_URL, DEFAULT_REMOTE_BASE_URL};
use crate::core::decoder::ChunkFraming;
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn missing_file_yields_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("absent.toml");

    let config = Config::load_from_path(&config_path).expect("load failed");
    assert_eq!(config, Config::default());
    assert_eq!(config.session_config(), SessionConfig::default());
    assert_eq!(config.framing(), ChunkFraming::Buffered);
    assert_eq!(config.greeting(), DEFAULT_GREETING);
}

#[test]
fn config_round_trips_through_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let config = Config {
        backend: Some(Backend::Remote),
        markdown: Some(true),
        framing: Some(ChunkFraming::PerChunk),
        greeting: Some(String::new()),
        remote_model: Some("gpt-4o-mini".to_string()),
        ..Default::default()
    };
    config.save_to_path(&config_path).expect("save failed");

    let contents = std::fs::read_to_string(&config_path).expect("read failed");
    assert!(contents.contains("backend = \"remote\""));
    assert!(contents.contains("framing = \"per-chunk\""));
    assert!(contents.contains("remote-model = \"gpt-4o-mini\""));
    assert!(!contents.contains("local-url"));

    let loaded = Config::load_from_path(&config_path).expect("load failed");
    assert_eq!(loaded, config);
    assert_eq!(loaded.greeting(), "");
    assert_eq!(
        loaded.session_config(),
        SessionConfig {
            backend: Backend::Remote,
            markdown: true,
        }
    );
}

#[test]
fn malformed_file_reports_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "backend = [not toml").expect("write failed");

    let err = Config::load_from_path(&config_path).expect_err("parse should fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("Failed to parse config at"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn unknown_backend_value_is_a_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "backend = \"cloud\"\n").expect("write failed");

    assert!(matches!(
        Config::load_from_path(&config_path),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn set_key_validates_values() {
    let mut config = Config::default();

    config.set_key(ConfigKey::Backend, "Remote").expect("backend");
    assert_eq!(config.backend, Some(Backend::Remote));

    config.set_key(ConfigKey::Markdown, "on").expect("markdown");
    assert_eq!(config.markdown, Some(true));
    config.set_key(ConfigKey::Markdown, "false").expect("markdown");
    assert_eq!(config.markdown, Some(false));

    config.set_key(ConfigKey::Framing, "per-chunk").expect("framing");
    assert_eq!(config.framing(), ChunkFraming::PerChunk);

    config
        .set_key(ConfigKey::LocalUrl, " http://127.0.0.1:8080 ")
        .expect("local url");
    assert_eq!(config.local_url.as_deref(), Some("http://127.0.0.1:8080"));

    assert!(config.set_key(ConfigKey::Backend, "cloud").is_err());
    assert!(config.set_key(ConfigKey::Markdown, "maybe").is_err());
    assert!(config.set_key(ConfigKey::Framing, "lines").is_err());
    let err = config
        .set_key(ConfigKey::RemoteModel, "  ")
        .expect_err("empty model");
    assert!(err.contains("unset remote-model"));

    // Rejected values leave previous settings alone.
    assert_eq!(config.backend, Some(Backend::Remote));
    assert_eq!(config.remote_model, None);
}

#[test]
fn unset_key_restores_default() {
    let mut config = Config::default();
    config.set_key(ConfigKey::Greeting, "Hi there").expect("greeting");
    assert_eq!(config.greeting(), "Hi there");

    config.unset_key(ConfigKey::Greeting);
    assert_eq!(config.greeting(), DEFAULT_GREETING);
    assert_eq!(config, Config::default());
}

#[test]
fn endpoints_prefer_environment_base_url() {
    let config = Config {
        remote_url: Some("https://config.example/v1".to_string()),
        local_model: Some("llama3".to_string()),
        ..Default::default()
    };

    let endpoints = config.resolve_endpoints(env_from(&[
        ("OPENAI_BASE_URL", "https://env.example/v1"),
        ("OPENAI_API_KEY", "sk-test"),
    ]));
    assert_eq!(endpoints.remote_base_url, "https://env.example/v1");
    assert_eq!(endpoints.api_key.as_deref(), Some("sk-test"));
    assert_eq!(endpoints.local_model, "llama3");
    assert_eq!(endpoints.local_base_url, DEFAULT_LOCAL_BASE_URL);

    let endpoints = config.resolve_endpoints(env_from(&[]));
    assert_eq!(endpoints.remote_base_url, "https://config.example/v1");
    assert_eq!(endpoints.api_key, None);
}

#[test]
fn blank_environment_values_are_ignored() {
    let endpoints = Config::default().resolve_endpoints(env_from(&[
        ("OPENAI_BASE_URL", ""),
        ("OPENAI_API_KEY", "   "),
    ]));
    assert_eq!(endpoints.remote_base_url, DEFAULT_REMOTE_BASE_URL);
    assert_eq!(endpoints.api_key, None);
    assert!(endpoints.profile(Backend::Remote).is_err());
}

#[test]
fn render_all_marks_defaults() {
    let config = Config {
        markdown: Some(true),
        greeting: Some(String::new()),
        ..Default::default()
    };
    let rendered = config.render_all();
    assert!(rendered.contains("  backend: local (default)"));
    assert!(rendered.contains("  markdown: on"));
    assert!(rendered.contains("  framing: buffered (default)"));
    assert!(rendered.contains("  greeting: (disabled)"));
}

#[cfg(unix)]
#[test]
fn path_display_abbreviates_home() {
    let Some(home) = std::env::var_os("HOME") else {
        return;
    };
    let path = PathBuf::from(home).join(".config").join("config.toml");
    assert_eq!(path_display(&path), "~/.config/config.toml");
}
