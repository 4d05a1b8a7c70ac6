mod helpers;
mod middleware;
mod password;
mod token;

pub use helpers::{TokenValidationError, extract_token_from_header};
pub use middleware::{AuthError, MaybeUser, RequireUser};
pub use password::PasswordHasher;
pub use token::{generate_key, get_or_create_token, is_valid_key};
