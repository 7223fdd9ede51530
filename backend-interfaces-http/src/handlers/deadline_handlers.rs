use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::queries::deadline_queries;
use backend_application::AppState;
use backend_domain::{DeadlineList, DeadlineListQuery, DeadlineView};

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn list_deadlines(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DeadlineListQuery>,
) -> Result<Json<DeadlineList>, HttpError> {
    authorize(&state, &headers)?;
    let list = deadline_queries::list_deadlines(&state, query).await?;
    Ok(Json(list))
}

pub async fn get_deadline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<DeadlineView>, HttpError> {
    authorize(&state, &headers)?;
    let view = deadline_queries::get_deadline(&state, &id).await?;
    Ok(Json(view))
}

pub async fn list_public_deadlines(
    State(state): State<AppState>,
    Query(query): Query<DeadlineListQuery>,
) -> Result<Json<DeadlineList>, HttpError> {
    let list = deadline_queries::list_deadlines(&state, query).await?;
    Ok(Json(list))
}

pub async fn get_public_deadline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeadlineView>, HttpError> {
    let view = deadline_queries::get_deadline(&state, &id).await?;
    Ok(Json(view))
}
