use crate::services::ai::CompletionBackend;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Injected so handlers and tests never depend on a concrete client.
    pub completions: Arc<dyn CompletionBackend>,
}

pub type SharedState = Arc<AppState>;
