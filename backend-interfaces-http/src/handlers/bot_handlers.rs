use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use backend_application::commands::deadline_commands;
use backend_application::AppState;
use backend_domain::{BotDeadlineCreated, BotDeadlinePayload};

use crate::error::HttpError;

pub async fn create_bot_deadline(
    State(state): State<AppState>,
    Json(payload): Json<BotDeadlinePayload>,
) -> Result<(StatusCode, Json<BotDeadlineCreated>), HttpError> {
    let created = deadline_commands::create_from_bot(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
