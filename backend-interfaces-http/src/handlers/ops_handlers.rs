use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};
use tracing::error;

use backend_application::AppState;

use crate::error::HttpError;
use crate::middleware::authorize;

pub const ROOT_MESSAGE: &str = "Eventory API is running";

pub async fn root() -> Json<Value> {
    Json(json!({ "message": ROOT_MESSAGE }))
}

pub async fn health_live() -> StatusCode {
    StatusCode::OK
}

/// The record store applies its own timeout to the ping.
pub async fn health_ready(State(state): State<AppState>) -> StatusCode {
    match state.record_store.ping().await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            error!("ready check failed: {}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    authorize(&state, &headers)?;
    let payload = state.metrics.render_prometheus();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    Ok((headers, payload))
}
