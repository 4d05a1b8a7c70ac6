//! Favorite and shopping-cart toggles, plus the shopping list download.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::ShortRecipeResponse;
use crate::server::response::{
    ApiError, ApiResponse, PathParam, StoreOptionExt, StoreResultExt,
};
use crate::shopping::{self, SHOPPING_LIST_FILENAME};
use crate::types::RecipeMark;

use super::render;

fn add_mark(
    state: &AppState,
    mark: RecipeMark,
    user_id: i64,
    recipe_id: i64,
) -> Result<(StatusCode, Json<ApiResponse<ShortRecipeResponse>>), ApiError> {
    let store = state.store.as_ref();

    let recipe = store
        .get_recipe(recipe_id)
        .api_err("Failed to get recipe")?
        .or_not_found("Recipe not found")?;

    match store.add_recipe_mark(mark, user_id, recipe_id) {
        Ok(()) => {}
        Err(Error::AlreadyExists) => {
            return Err(ApiError::bad_request(format!(
                "Recipe is already in {}",
                mark.label()
            )));
        }
        Err(Error::NotFound) => return Err(ApiError::not_found("Recipe not found")),
        Err(e) => {
            tracing::error!("Failed to add recipe to {}: {e}", mark.label());
            return Err(ApiError::internal("Failed to add recipe"));
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(render::short_recipe(recipe))),
    ))
}

fn remove_mark(
    state: &AppState,
    mark: RecipeMark,
    user_id: i64,
    recipe_id: i64,
) -> Result<StatusCode, ApiError> {
    let store = state.store.as_ref();

    store
        .get_recipe(recipe_id)
        .api_err("Failed to get recipe")?
        .or_not_found("Recipe not found")?;

    let removed = store
        .remove_recipe_mark(mark, user_id, recipe_id)
        .api_err("Failed to remove recipe")?;

    if !removed {
        return Err(ApiError::bad_request(format!(
            "Recipe is not in {}",
            mark.label()
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> impl IntoResponse {
    add_mark(&state, RecipeMark::Favorite, auth.user.id, id)
}

pub async fn remove_favorite(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> impl IntoResponse {
    remove_mark(&state, RecipeMark::Favorite, auth.user.id, id)
}

pub async fn add_to_cart(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> impl IntoResponse {
    add_mark(&state, RecipeMark::ShoppingCart, auth.user.id, id)
}

pub async fn remove_from_cart(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> impl IntoResponse {
    remove_mark(&state, RecipeMark::ShoppingCart, auth.user.id, id)
}

pub async fn download_shopping_cart(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let rows = state
        .store
        .list_cart_ingredients(auth.user.id)
        .api_err("Failed to load shopping cart")?;

    let body = shopping::render(&shopping::aggregate(&rows));

    Ok::<_, ApiError>((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{SHOPPING_LIST_FILENAME}\""),
            ),
        ],
        body,
    ))
}
