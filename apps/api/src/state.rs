use std::sync::Arc;

use crate::quiz::generator::QuizAuthor;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    /// Pluggable quiz author. Default: LlmQuizAuthor backed by the single LlmClient.
    pub author: Arc<dyn QuizAuthor>,
}
