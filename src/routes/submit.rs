use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::{Map, Value};

use crate::session::{FlashLevel, Session};
use crate::state::SharedState;
use crate::submission::{parser, pipeline};

pub async fn submit(
    State(state): State<SharedState>,
    session: Session,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let parsed = if content_type.is_some_and(|ct| ct.contains("multipart/form-data")) {
        parser::parse_multipart(&headers, body).await
    } else {
        parser::parse_body(content_type, &body)
    };

    // An unreadable body carries no fields and fails validation below.
    let raw = parsed.unwrap_or_else(|e| {
        tracing::warn!("Unreadable submission body: {e}");
        Value::Object(Map::new())
    });

    let result = match pipeline::run(&state, &raw).await {
        Ok(result) => result,
        Err(e) => {
            session.flash(&state, FlashLevel::Error, e.to_string());
            return (session.jar, Redirect::to("/form")).into_response();
        }
    };

    if result.fan_out.artifact.is_none() {
        tracing::warn!("No PDF available for {}", result.submission.name);
    }
    state
        .sessions
        .set_download(&session.id, result.fan_out.artifact);

    session.flash(&state, FlashLevel::Success, "Form submitted successfully!");
    (session.jar, Redirect::to("/thank_you")).into_response()
}
