use std::sync::Arc;

use axum::{
    Json,
    extract::{RawQuery, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::{MaybeUser, RequireUser};
use crate::server::AppState;
use crate::server::dto::{RecipeListParams, RecipeRequest};
use crate::server::response::{
    ApiError, ApiResponse, JsonBody, PageRequest, PaginatedResponse, PathParam, StoreOptionExt,
    StoreResultExt,
};
use crate::server::validation::validate_recipe;
use crate::store::Store;
use crate::types::{Recipe, RecipeFilter, User};

use super::render;

/// Confirms every tag and ingredient the payload points at exists.
fn resolve_references(store: &dyn Store, req: &RecipeRequest) -> Result<(), ApiError> {
    for &tag_id in &req.tags {
        if store.get_tag(tag_id).api_err("Failed to get tag")?.is_none() {
            return Err(ApiError::not_found(format!("Tag {tag_id} not found")));
        }
    }
    for ingredient in &req.ingredients {
        if store
            .get_ingredient(ingredient.id)
            .api_err("Failed to get ingredient")?
            .is_none()
        {
            return Err(ApiError::not_found(format!(
                "Ingredient {} not found",
                ingredient.id
            )));
        }
    }
    Ok(())
}

fn load_owned_recipe(store: &dyn Store, id: i64, user: &User) -> Result<Recipe, ApiError> {
    let recipe = store
        .get_recipe(id)
        .api_err("Failed to get recipe")?
        .or_not_found("Recipe not found")?;

    if recipe.author_id != user.id {
        return Err(ApiError::forbidden("Only the author can modify this recipe"));
    }
    Ok(recipe)
}

pub async fn list_recipes(
    caller: MaybeUser,
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let params = RecipeListParams::parse(query.as_deref())?;
    let page = PageRequest::from_params(params.page, params.limit, state.page_size)?;
    let caller_id = caller.id();

    // Relation filters only apply to an authenticated caller.
    let filter = RecipeFilter {
        author: params.author,
        tag_slugs: params.tags,
        favorited_by: caller_id.filter(|_| params.is_favorited),
        in_cart_of: caller_id.filter(|_| params.is_in_shopping_cart),
    };

    let count = store
        .count_recipes(&filter)
        .api_err("Failed to count recipes")?;
    let recipes = store
        .list_recipes(&filter, page.offset(), page.limit)
        .api_err("Failed to list recipes")?;

    let results = recipes
        .into_iter()
        .map(|recipe| render::recipe(store, recipe, caller_id))
        .collect::<Result<Vec<_>, _>>()?;

    Ok::<_, ApiError>(Json(PaginatedResponse::new(results, count, page)))
}

pub async fn create_recipe(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<RecipeRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    validate_recipe(&req)?;
    resolve_references(store, &req)?;

    let recipe = store
        .create_recipe(auth.user.id, &req.into_draft())
        .api_write_err("Failed to create recipe")?;

    tracing::info!(recipe_id = recipe.id, author_id = auth.user.id, "recipe created");

    let body = render::recipe(store, recipe, Some(auth.user.id))?;
    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(body))))
}

pub async fn get_recipe(
    caller: MaybeUser,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let recipe = store
        .get_recipe(id)
        .api_err("Failed to get recipe")?
        .or_not_found("Recipe not found")?;

    let body = render::recipe(store, recipe, caller.id())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(body)))
}

/// Serves both PUT and PATCH; either way the payload replaces the recipe.
pub async fn update_recipe(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
    JsonBody(req): JsonBody<RecipeRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    load_owned_recipe(store, id, &auth.user)?;
    validate_recipe(&req)?;
    resolve_references(store, &req)?;

    let recipe = store
        .update_recipe(id, &req.into_draft())
        .api_write_err("Failed to update recipe")?;

    let body = render::recipe(store, recipe, Some(auth.user.id))?;
    Ok::<_, ApiError>(Json(ApiResponse::success(body)))
}

pub async fn delete_recipe(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    load_owned_recipe(store, id, &auth.user)?;

    store
        .delete_recipe(id)
        .api_err("Failed to delete recipe")?;

    tracing::info!(recipe_id = id, "recipe deleted");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
