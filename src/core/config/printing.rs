use std::fmt::Write;

use crate::core::backend::{
    DEFAULT_LOCAL_BASE_URL, DEFAULT_LOCAL_MODEL, DEFAULT_REMOTE_BASE_URL, DEFAULT_REMOTE_MODEL,
};
use crate::core::config::data::{path_display, Config, DEFAULT_GREETING};

fn value_or_default(value: Option<&str>, default: &str) -> String {
    match value {
        Some(value) => value.to_string(),
        None => format!("{default} (default)"),
    }
}

impl Config {
    pub fn render_all(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Current configuration:");
        if let Some(path) = Self::get_config_path() {
            let _ = writeln!(out, "  file: {}", path_display(path));
        }
        let backend = self.session_config().backend;
        let _ = writeln!(
            out,
            "  backend: {}",
            value_or_default(self.backend.map(|b| b.as_str()), backend.as_str())
        );
        let markdown = match self.markdown {
            Some(true) => "on".to_string(),
            Some(false) => "off".to_string(),
            None => "off (default)".to_string(),
        };
        let _ = writeln!(out, "  markdown: {markdown}");
        let _ = writeln!(
            out,
            "  framing: {}",
            value_or_default(self.framing.map(|f| f.as_str()), self.framing().as_str())
        );
        let greeting = match self.greeting.as_deref() {
            Some("") => "(disabled)".to_string(),
            Some(greeting) => greeting.to_string(),
            None => format!("{DEFAULT_GREETING} (default)"),
        };
        let _ = writeln!(out, "  greeting: {greeting}");
        let _ = writeln!(
            out,
            "  local-model: {}",
            value_or_default(self.local_model.as_deref(), DEFAULT_LOCAL_MODEL)
        );
        let _ = writeln!(
            out,
            "  local-url: {}",
            value_or_default(self.local_url.as_deref(), DEFAULT_LOCAL_BASE_URL)
        );
        let _ = writeln!(
            out,
            "  remote-model: {}",
            value_or_default(self.remote_model.as_deref(), DEFAULT_REMOTE_MODEL)
        );
        let _ = write!(
            out,
            "  remote-url: {}",
            value_or_default(self.remote_url.as_deref(), DEFAULT_REMOTE_BASE_URL)
        );
        out
    }

    pub fn print_all(&self) {
        println!("{}", self.render_all());
    }
}
