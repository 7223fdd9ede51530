use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::warn;

use backend_application::AppState;

use crate::handlers::{bot_handlers, deadline_handlers, ops_handlers, token_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ops_handlers::root))
        .route("/token", post(token_handlers::issue_token))
        .route("/guest-token", get(token_handlers::issue_guest_token))
        .route("/deadlines", get(deadline_handlers::list_deadlines))
        .route("/deadlines/:id", get(deadline_handlers::get_deadline))
        .route(
            "/public/deadlines",
            get(deadline_handlers::list_public_deadlines),
        )
        .route(
            "/public/deadlines/:id",
            get(deadline_handlers::get_public_deadline),
        )
        .route("/bot/deadlines", post(bot_handlers::create_bot_deadline))
        .route("/ops/health/live", get(ops_handlers::health_live))
        .route("/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}

/// An empty list or `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
