use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionClient;
use crate::sessions::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Language-model backend. `LlmClient` in production, a scripted stub in tests.
    pub llm: Arc<dyn CompletionClient>,
    pub config: Config,
}
