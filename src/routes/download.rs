use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};

use crate::session::{FlashLevel, Session};
use crate::state::SharedState;

/// Send the session's pending PDF once. Any later request falls back to the form.
pub async fn download_pdf(State(state): State<SharedState>, session: Session) -> Response {
    let pending = state.sessions.take_download(&session.id);

    let Some(path) = pending else {
        return no_pdf(&state, session);
    };
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        tracing::warn!("Pending PDF {} is gone", path.display());
        return no_pdf(&state, session);
    }

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("submission.pdf")
                .to_string();
            tracing::info!("Serving PDF download {file_name}");
            (
                session.jar,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{file_name}\""),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("PDF download error: {e}");
            session.flash(&state, FlashLevel::Error, "Could not download PDF.");
            (session.jar, Redirect::to("/form")).into_response()
        }
    }
}

fn no_pdf(state: &SharedState, session: Session) -> Response {
    session.flash(state, FlashLevel::Error, "No PDF available.");
    (session.jar, Redirect::to("/form")).into_response()
}
