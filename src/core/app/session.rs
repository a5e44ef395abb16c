use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::core::backend::{Backend, BackendProfile, Endpoints, ProfileError};
use crate::core::decoder::ChunkFraming;
use crate::core::message::MessageId;

/// User-toggled settings for the running session. Never persisted from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionConfig {
    pub backend: Backend,
    pub markdown: bool,
}

pub struct SessionContext {
    pub client: Client,
    pub endpoints: Endpoints,
    pub config: SessionConfig,
    pub framing: ChunkFraming,
    pub stream_cancel_token: Option<CancellationToken>,
    pub current_stream_id: u64,
    /// Assistant message receiving fragments from the live stream.
    pub active_placeholder: Option<MessageId>,
}

impl SessionContext {
    pub fn new(
        client: Client,
        endpoints: Endpoints,
        config: SessionConfig,
        framing: ChunkFraming,
    ) -> Self {
        Self {
            client,
            endpoints,
            config,
            framing,
            stream_cancel_token: None,
            current_stream_id: 0,
            active_placeholder: None,
        }
    }

    pub fn active_profile(&self) -> Result<BackendProfile, ProfileError> {
        self.endpoints.profile(self.config.backend)
    }

    pub fn active_model(&self) -> &str {
        self.endpoints.model_for(self.config.backend)
    }

    pub fn has_stream_in_flight(&self) -> bool {
        self.stream_cancel_token.is_some()
    }
}
