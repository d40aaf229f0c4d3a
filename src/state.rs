use std::sync::Arc;

use axum_extra::extract::cookie::Key;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::session::SessionStore;
use crate::sinks::SinkRegistry;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub sinks: SinkRegistry,
    pub sessions: SessionStore,
    pub cookie_key: Key,
}
