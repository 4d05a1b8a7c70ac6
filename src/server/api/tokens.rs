use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::auth::{RequireUser, get_or_create_token};
use crate::server::AppState;
use crate::server::dto::{LoginRequest, TokenResponse};
use crate::server::response::{
    ApiError, ApiResponse, JsonBody, StoreOptionExt, StoreResultExt,
};

/// Exchanges email and password for the user's token, issuing it on first login.
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let user = store
        .get_user_by_email(&req.email)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    let verified = state
        .hasher
        .verify(&req.password, &user.password_hash)
        .api_err("Failed to verify password")?;
    if !verified {
        return Err(ApiError::field("password", "invalid password"));
    }

    let token = get_or_create_token(store, user.id).api_err("Failed to issue token")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(TokenResponse {
        auth_token: token.key,
    })))
}

/// Deletes the token the caller authenticated with. Succeeds even if it is already gone.
pub async fn logout(auth: RequireUser, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state
        .store
        .delete_token(&auth.token.key)
        .api_err("Failed to delete token")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
