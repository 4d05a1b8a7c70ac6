use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::dto::IngredientSearchParams;
use crate::server::response::{
    ApiError, ApiResponse, PathParam, QueryParams, StoreOptionExt, StoreResultExt,
};

pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<IngredientSearchParams>,
) -> impl IntoResponse {
    let search = params.name.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let ingredients = state
        .store
        .list_ingredients(search)
        .api_err("Failed to list ingredients")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(ingredients)))
}

pub async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> impl IntoResponse {
    let ingredient = state
        .store
        .get_ingredient(id)
        .api_err("Failed to get ingredient")?
        .or_not_found("Ingredient not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(ingredient)))
}
