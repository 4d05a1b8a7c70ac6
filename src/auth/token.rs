use chrono::Utc;
use rand::Rng;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Token;

const KEY_BYTES: usize = 20;
const KEY_LENGTH: usize = KEY_BYTES * 2;

/// Generates a random 40 character lowercase hex key.
#[must_use]
pub fn generate_key() -> String {
    let mut bytes = [0u8; KEY_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Checks the shape of a presented key before it reaches the database.
#[must_use]
pub fn is_valid_key(key: &str) -> bool {
    key.len() == KEY_LENGTH && key.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Returns the user's token, creating it on first use.
///
/// Concurrent first logins race on the UNIQUE user_id column; the loser
/// reads back the winner's token.
pub fn get_or_create_token(store: &dyn Store, user_id: i64) -> Result<Token> {
    if let Some(token) = store.get_user_token(user_id)? {
        return Ok(token);
    }

    let token = Token {
        key: generate_key(),
        user_id,
        created_at: Utc::now(),
    };

    match store.create_token(&token) {
        Ok(()) => Ok(token),
        Err(Error::AlreadyExists) => store.get_user_token(user_id)?.ok_or(Error::NotFound),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::NewUser;
    use tempfile::TempDir;

    #[test]
    fn test_key_format() {
        let key = generate_key();

        assert_eq!(key.len(), 40);
        assert!(is_valid_key(&key));
        assert_ne!(key, generate_key());
    }

    #[test]
    fn test_invalid_keys() {
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("abc"));
        assert!(!is_valid_key(&"z".repeat(40)));
    }

    #[test]
    fn test_token_is_reused() {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let user = store
            .create_user(&NewUser {
                email: "alice@example.com".to_string(),
                username: "alice".to_string(),
                first_name: "Alice".to_string(),
                last_name: "Liddell".to_string(),
                password_hash: "hash".to_string(),
            })
            .unwrap();

        let first = get_or_create_token(&store, user.id).unwrap();
        let second = get_or_create_token(&store, user.id).unwrap();
        assert_eq!(first.key, second.key);

        store.delete_token(&first.key).unwrap();
        let third = get_or_create_token(&store, user.id).unwrap();
        assert_ne!(first.key, third.key);
    }
}
