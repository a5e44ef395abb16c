pub mod app;
pub mod backend;
pub mod chat_stream;
pub mod config;
pub mod conversation;
pub mod decoder;
pub mod message;
