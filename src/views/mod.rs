pub mod pages;

use askama::Template;
use axum::response::Html;
use axum::routing::get;
use axum::Router;

use crate::error::AppError;
use crate::session::Flash;
use crate::state::SharedState;

pub fn view_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/news", get(pages::news))
        .route("/form", get(pages::form))
        .route("/thank_you", get(pages::thank_you))
}

/// A flash message as the templates see it.
pub struct FlashView {
    pub level: &'static str,
    pub message: String,
}

impl From<Flash> for FlashView {
    fn from(flash: Flash) -> Self {
        FlashView {
            level: flash.level.as_str(),
            message: flash.message,
        }
    }
}

pub fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    template
        .render()
        .map(Html)
        .map_err(|e| AppError::Internal(format!("Template render failed: {e}")))
}
