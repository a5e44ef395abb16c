//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the main interaction loop that turns key presses into
//!   [`crate::core::app::AppAction`]s and runs streams through
//!   [`crate::core::chat_stream`].
//! - [`renderer`] and [`title`]: frame composition.
//! - [`markdown`] and [`theme`]: transcript styling.
//!
//! This layer only presents and captures interaction state; [`crate::core`]
//! owns the session logic.

pub mod chat_loop;
pub mod markdown;
pub mod renderer;
pub mod theme;
pub mod title;
