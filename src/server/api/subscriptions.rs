use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{RecipesLimitParams, SubscriptionParams, parse_recipes_limit};
use crate::server::response::{
    ApiError, ApiResponse, PageRequest, PaginatedResponse, PathParam, QueryParams, StoreOptionExt,
    StoreResultExt,
};

use super::render;

/// Authors the caller follows, each with a preview of their recipes.
pub async fn list_subscriptions(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<SubscriptionParams>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let page = PageRequest::from_params(params.page, params.limit, state.page_size)?;
    let recipes_limit = parse_recipes_limit(params.recipes_limit.as_deref());

    let count = store
        .count_subscriptions(auth.user.id)
        .api_err("Failed to count subscriptions")?;
    let authors = store
        .list_subscriptions(auth.user.id, page.offset(), page.limit)
        .api_err("Failed to list subscriptions")?;

    let results = authors
        .iter()
        .map(|author| render::subscription(store, author, auth.user.id, recipes_limit))
        .collect::<Result<Vec<_>, _>>()?;

    Ok::<_, ApiError>(Json(PaginatedResponse::new(results, count, page)))
}

pub async fn subscribe(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParam(author_id): PathParam<i64>,
    QueryParams(params): QueryParams<RecipesLimitParams>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let author = store
        .get_user(author_id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    if author.id == auth.user.id {
        return Err(ApiError::bad_request("Cannot subscribe to yourself"));
    }

    match store.create_subscription(auth.user.id, author.id) {
        Ok(()) => {}
        Err(Error::AlreadyExists) => {
            return Err(ApiError::bad_request("Already subscribed to this author"));
        }
        Err(Error::NotFound) => return Err(ApiError::not_found("User not found")),
        Err(e) => {
            tracing::error!("Failed to create subscription: {e}");
            return Err(ApiError::internal("Failed to create subscription"));
        }
    }

    let recipes_limit = parse_recipes_limit(params.recipes_limit.as_deref());
    let body = render::subscription(store, &author, auth.user.id, recipes_limit)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(body))))
}

pub async fn unsubscribe(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    PathParam(author_id): PathParam<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    store
        .get_user(author_id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let removed = store
        .delete_subscription(auth.user.id, author_id)
        .api_err("Failed to delete subscription")?;

    if !removed {
        return Err(ApiError::bad_request("Not subscribed to this author"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
