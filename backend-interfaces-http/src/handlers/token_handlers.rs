use axum::extract::{FromRequest, Request, State};
use axum::http::{header, HeaderMap};
use axum::{Form, Json};

use backend_application::commands::token_commands;
use backend_application::AppState;
use backend_domain::{LoginRequest, TokenResponse};

use crate::error::HttpError;

/// Accepts the credentials either as an OAuth2-style form or as JSON.
pub async fn issue_token(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<TokenResponse>, HttpError> {
    let login = if is_form(request.headers()) {
        let Form(login) = Form::<LoginRequest>::from_request(request, &state)
            .await
            .map_err(|err| HttpError::BadRequest(err.body_text()))?;
        login
    } else {
        let Json(login) = Json::<LoginRequest>::from_request(request, &state)
            .await
            .map_err(|err| HttpError::BadRequest(err.body_text()))?;
        login
    };
    let token = token_commands::login(&state, login)?;
    Ok(Json(token))
}

pub async fn issue_guest_token(
    State(state): State<AppState>,
) -> Result<Json<TokenResponse>, HttpError> {
    let token = token_commands::guest_token(&state)?;
    Ok(Json(token))
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}
