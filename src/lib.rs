//! llm-playground is a single-screen terminal chat client that streams replies
//! from either a local Ollama-style endpoint or a remote OpenAI-compatible API.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns session state, backend profiles, the streaming decoder and
//!   the stream task that feeds decoded fragments back to the session.
//! - [`ui`] renders the terminal interface and runs the interactive event loop
//!   that drives user input and display updates.
//! - [`api`] defines the request and response payloads for both backends.
//! - [`utils`] holds transcript layout math and diagnostic logging setup.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which loads configuration and dispatches into
//! [`ui::chat_loop`] for interactive sessions or [`cli::say`] for one-shot
//! prompts.

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
