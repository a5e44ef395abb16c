//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod say;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::cli::say::run_say;
use crate::core::app::{App, SessionConfig};
use crate::core::backend::{Backend, Endpoints};
use crate::core::config::{Config, ConfigKey};
use crate::core::decoder::ChunkFraming;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "llm-playground", version)]
#[command(about = "A terminal chat client for local and remote LLM endpoints")]
#[command(
    long_about = "llm-playground is a single-screen terminal chat client. Replies stream \
in from either a local Ollama-style endpoint or a remote OpenAI-compatible API.\n\n\
Environment Variables:\n\
  OPENAI_API_KEY    API key for the remote backend\n\
  OPENAI_BASE_URL   Remote API base URL (overrides remote-url in the config)\n\
  RUST_LOG          Log filter used with --debug-log\n\n\
Controls:\n\
  Enter             Send the message\n\
  Esc               Stop the reply being generated\n\
  Ctrl+O            Switch between local and remote backends\n\
  Ctrl+D            Toggle markdown rendering\n\
  Up/Down/PgUp/PgDn Scroll through the conversation\n\
  Ctrl+C            Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend to start with
    #[arg(short = 'b', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Model for the selected backend
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Start with markdown rendering enabled
    #[arg(long, global = true)]
    pub markdown: bool,

    /// How streamed response bodies are split into lines
    #[arg(long, global = true, value_enum)]
    pub framing: Option<ChunkFraming>,

    /// Write diagnostic logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub debug_log: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send a single prompt and stream the reply to stdout
    Say {
        /// Prompt text
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Set a configuration value
    Set {
        /// Configuration key to set
        #[arg(value_enum)]
        key: ConfigKey,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset a configuration value
    Unset {
        /// Configuration key to unset
        #[arg(value_enum)]
        key: ConfigKey,
    },
    /// Print the current configuration
    Config,
}

/// Everything needed to start a session, after layering CLI flags over the
/// config file and the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub config: SessionConfig,
    pub framing: ChunkFraming,
    pub endpoints: Endpoints,
    pub greeting: String,
}

impl SessionSettings {
    pub fn resolve<F>(args: &Args, config: &Config, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut session_config = config.session_config();
        if let Some(backend) = args.backend {
            session_config.backend = backend;
        }
        if args.markdown {
            session_config.markdown = true;
        }

        let mut endpoints = config.resolve_endpoints(env);
        if let Some(model) = args.model.as_deref().map(str::trim) {
            if !model.is_empty() {
                endpoints.set_model(session_config.backend, model.to_string());
            }
        }

        Self {
            config: session_config,
            framing: args.framing.unwrap_or_else(|| config.framing()),
            endpoints,
            greeting: config.greeting().to_string(),
        }
    }

    pub fn into_app(self, client: reqwest::Client) -> App {
        App::new(
            client,
            self.endpoints,
            self.config,
            self.framing,
            &self.greeting,
        )
    }
}

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.debug_log.as_deref())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let command = args.command.as_ref().unwrap_or(&Commands::Chat);

    match command {
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let value = value.join(" ");
            config.set_key(*key, &value)?;
            config.save()?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            config.unset_key(*key);
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
        Commands::Config => {
            Config::load()?.print_all();
            Ok(())
        }
        Commands::Say { prompt } => {
            let config = Config::load()?;
            let settings = SessionSettings::resolve(&args, &config, process_env);
            run_say(prompt, settings, reqwest::Client::new()).await
        }
        Commands::Chat => {
            let config = Config::load()?;
            let settings = SessionSettings::resolve(&args, &config, process_env);
            debug!(
                backend = %settings.config.backend,
                model = settings.endpoints.model_for(settings.config.backend),
                framing = settings.framing.as_str(),
                "starting chat"
            );
            run_chat(settings.into_app(reqwest::Client::new())).await
        }
    }
}
