pub mod config;
pub mod error;
pub mod state;
pub mod db;
pub mod models;
pub mod routes;
pub mod views;
pub mod session;
pub mod sinks;
pub mod submission;
pub mod worker;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::AppError;
use crate::session::{derive_cookie_key, SessionStore};
use crate::sinks::database::DatabaseSink;
use crate::sinks::document::DocumentSink;
use crate::sinks::spreadsheet::SpreadsheetSink;
use crate::sinks::SinkRegistry;
use crate::state::{AppState, SharedState};

pub fn build_app(pool: SqlitePool, config: Config) -> (Router, SharedState) {
    // Order matters: table, then workbook, then document.
    let mut sinks = SinkRegistry::new();
    sinks.register(Arc::new(DatabaseSink::new(pool.clone())));
    sinks.register(Arc::new(SpreadsheetSink::new(config.spreadsheet_path.clone())));
    sinks.register(Arc::new(DocumentSink::new(config.document_dir.clone())));
    tracing::info!("Submission sinks: {:?}", sinks.ids());

    let static_dir = config.static_dir.clone();
    let max_body_size = config.max_body_size;

    let state: SharedState = Arc::new(AppState {
        pool,
        cookie_key: derive_cookie_key(&config.secret_key),
        config,
        sinks,
        sessions: SessionStore::new(),
    });

    let app = Router::new()
        .merge(views::view_routes())
        .merge(routes::form_routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .route("/health", axum::routing::get(health))
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-content-type-options"),
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("x-frame-options"),
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state.clone());

    (app, state)
}

async fn health(State(state): State<SharedState>) -> Result<&'static str, AppError> {
    db::ping(&state.pool).await?;
    Ok("ok")
}

async fn not_found() -> AppError {
    AppError::NotFound("Page not found".to_string())
}
