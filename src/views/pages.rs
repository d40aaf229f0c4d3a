use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use super::{render, FlashView};
use crate::error::AppError;
use crate::session::Session;
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    flashes: Vec<FlashView>,
}

#[derive(Template)]
#[template(path = "news.html")]
struct NewsTemplate {
    flashes: Vec<FlashView>,
}

#[derive(Template)]
#[template(path = "form.html")]
struct FormTemplate {
    flashes: Vec<FlashView>,
}

#[derive(Template)]
#[template(path = "thank_you.html")]
struct ThankYouTemplate {
    flashes: Vec<FlashView>,
}

fn take_flashes(state: &SharedState, session: &Session) -> Vec<FlashView> {
    session
        .take_flashes(state)
        .into_iter()
        .map(FlashView::from)
        .collect()
}

pub async fn home(
    State(state): State<SharedState>,
    session: Session,
) -> Result<Response, AppError> {
    let page = render(&HomeTemplate {
        flashes: take_flashes(&state, &session),
    })?;
    Ok((session.jar, page).into_response())
}

pub async fn news(
    State(state): State<SharedState>,
    session: Session,
) -> Result<Response, AppError> {
    let page = render(&NewsTemplate {
        flashes: take_flashes(&state, &session),
    })?;
    Ok((session.jar, page).into_response())
}

pub async fn form(
    State(state): State<SharedState>,
    session: Session,
) -> Result<Response, AppError> {
    let page = render(&FormTemplate {
        flashes: take_flashes(&state, &session),
    })?;
    Ok((session.jar, page).into_response())
}

pub async fn thank_you(
    State(state): State<SharedState>,
    session: Session,
) -> Result<Response, AppError> {
    let page = render(&ThankYouTemplate {
        flashes: take_flashes(&state, &session),
    })?;
    Ok((session.jar, page).into_response())
}
