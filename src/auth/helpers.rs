use super::is_valid_key;
use crate::store::Store;
use crate::types::{Token, User};

#[derive(Debug)]
pub enum TokenValidationError {
    InvalidScheme,
    InvalidToken,
    InternalError,
}

pub struct ValidatedToken {
    pub token: Token,
    pub user: User,
}

/// Extracts a token from an Authorization header (`Token <key>` or `Bearer <key>`).
/// Returns None if no auth header is present.
/// Returns Err if the auth scheme is unsupported or the key is empty.
pub fn extract_token_from_header(
    auth_header: Option<&str>,
) -> Result<Option<String>, TokenValidationError> {
    let Some(header) = auth_header else {
        return Ok(None);
    };

    let key = header
        .strip_prefix("Token ")
        .or_else(|| header.strip_prefix("Bearer "))
        .ok_or(TokenValidationError::InvalidScheme)?
        .trim();

    if key.is_empty() {
        return Err(TokenValidationError::InvalidToken);
    }

    Ok(Some(key.to_string()))
}

/// Resolves a raw token key to its owner.
pub fn validate_token(
    store: &dyn Store,
    raw_token: &str,
) -> Result<ValidatedToken, TokenValidationError> {
    if !is_valid_key(raw_token) {
        return Err(TokenValidationError::InvalidToken);
    }

    let token = store
        .get_token(raw_token)
        .map_err(|_| TokenValidationError::InternalError)?
        .ok_or(TokenValidationError::InvalidToken)?;

    let user = store
        .get_user(token.user_id)
        .map_err(|_| TokenValidationError::InternalError)?
        .ok_or(TokenValidationError::InvalidToken)?;

    Ok(ValidatedToken { token, user })
}
