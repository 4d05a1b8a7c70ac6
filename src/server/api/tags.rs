use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, PathParam, StoreOptionExt, StoreResultExt};

pub async fn list_tags(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let tags = state.store.list_tags().api_err("Failed to list tags")?;
    Ok::<_, ApiError>(Json(ApiResponse::success(tags)))
}

pub async fn get_tag(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> impl IntoResponse {
    let tag = state
        .store
        .get_tag(id)
        .api_err("Failed to get tag")?
        .or_not_found("Tag not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(tag)))
}
