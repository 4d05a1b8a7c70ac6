use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::{MaybeUser, RequireUser};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{CreateUserRequest, PageParams, SetPasswordRequest};
use crate::server::response::{
    ApiError, ApiResponse, JsonBody, PageRequest, PaginatedResponse, PathParam, QueryParams,
    StoreOptionExt, StoreResultExt,
};
use crate::server::validation::validate_new_user;
use crate::store::Store;
use crate::types::NewUser;

use super::render;

pub async fn list_users(
    caller: MaybeUser,
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<PageParams>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let page = PageRequest::from_params(params.page, params.limit, state.page_size)?;

    let count = store.count_users().api_err("Failed to count users")?;
    let users = store
        .list_users(page.offset(), page.limit)
        .api_err("Failed to list users")?;

    let results = users
        .iter()
        .map(|user| render::user(store, user, caller.id()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok::<_, ApiError>(Json(PaginatedResponse::new(results, count, page)))
}

/// Names the unique field a concurrent registration took first.
fn duplicate_user_error(store: &dyn Store, email: &str) -> ApiError {
    match store.get_user_by_email(email) {
        Ok(Some(_)) => ApiError::field("email", "a user with this email already exists"),
        Ok(None) => ApiError::field("username", "a user with this username already exists"),
        Err(e) => {
            tracing::error!("Failed to check email: {e}");
            ApiError::bad_request("a user with this email or username already exists")
        }
    }
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    validate_new_user(&req)?;

    if store
        .get_user_by_email(&req.email)
        .api_err("Failed to check email")?
        .is_some()
    {
        return Err(ApiError::field("email", "a user with this email already exists"));
    }

    let password_hash = state
        .hasher
        .hash(&req.password)
        .api_err("Failed to hash password")?;

    let new_user = NewUser {
        email: req.email,
        username: req.username,
        first_name: req.first_name,
        last_name: req.last_name,
        password_hash,
    };

    let user = match store.create_user(&new_user) {
        Ok(user) => user,
        Err(Error::AlreadyExists) => return Err(duplicate_user_error(store, &new_user.email)),
        Err(e) => {
            tracing::error!("Failed to create user: {e}");
            return Err(ApiError::internal("Failed to create user"));
        }
    };

    tracing::info!(user_id = user.id, username = %user.username, "user registered");

    let body = render::user(store, &user, None)?;
    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(body))))
}

pub async fn get_user(
    caller: MaybeUser,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let user = store
        .get_user(id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let body = render::user(store, &user, caller.id())?;
    Ok::<_, ApiError>(Json(ApiResponse::success(body)))
}

pub async fn me(auth: RequireUser, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = render::user(state.store.as_ref(), &auth.user, Some(auth.user.id))?;
    Ok::<_, ApiError>(Json(ApiResponse::success(body)))
}

pub async fn set_password(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<SetPasswordRequest>,
) -> impl IntoResponse {
    let verified = state
        .hasher
        .verify(&req.current_password, &auth.user.password_hash)
        .api_err("Failed to verify password")?;
    if !verified {
        return Err(ApiError::field("current_password", "invalid password"));
    }

    if req.new_password.is_empty() {
        return Err(ApiError::field("new_password", "password cannot be empty"));
    }

    let password_hash = state
        .hasher
        .hash(&req.new_password)
        .api_err("Failed to hash password")?;

    state
        .store
        .update_user_password(auth.user.id, &password_hash)
        .api_err("Failed to update password")?;

    tracing::info!(user_id = auth.user.id, "password changed");

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
