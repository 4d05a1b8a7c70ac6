mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Pairs guarded by a UNIQUE constraint (favorites, cart entries,
/// subscriptions, tokens, user email/username, tag fields) report a
/// duplicate insert as [`crate::error::Error::AlreadyExists`]. A write that
/// references a missing row reports [`crate::error::Error::NotFound`].
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &NewUser) -> Result<User>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>>;
    fn count_users(&self) -> Result<i64>;
    fn update_user_password(&self, id: i64, password_hash: &str) -> Result<()>;
    fn delete_user(&self, id: i64) -> Result<bool>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token(&self, key: &str) -> Result<Option<Token>>;
    fn get_user_token(&self, user_id: i64) -> Result<Option<Token>>;
    fn delete_token(&self, key: &str) -> Result<bool>;

    // Tag operations
    fn create_tag(&self, name: &str, color: &str, slug: &str) -> Result<Tag>;
    fn get_tag(&self, id: i64) -> Result<Option<Tag>>;
    fn list_tags(&self) -> Result<Vec<Tag>>;

    // Ingredient operations
    fn create_ingredient(&self, name: &str, measurement_unit: &str) -> Result<Ingredient>;
    fn get_ingredient(&self, id: i64) -> Result<Option<Ingredient>>;
    /// Case-insensitive search; prefix matches sort ahead of inner matches.
    fn list_ingredients(&self, search: Option<&str>) -> Result<Vec<Ingredient>>;

    // Recipe operations
    fn create_recipe(&self, author_id: i64, draft: &RecipeDraft) -> Result<Recipe>;
    fn get_recipe(&self, id: i64) -> Result<Option<Recipe>>;
    fn list_recipes(&self, filter: &RecipeFilter, offset: i64, limit: i64) -> Result<Vec<Recipe>>;
    fn count_recipes(&self, filter: &RecipeFilter) -> Result<i64>;
    fn update_recipe(&self, id: i64, draft: &RecipeDraft) -> Result<Recipe>;
    fn delete_recipe(&self, id: i64) -> Result<bool>;
    fn list_recipe_tags(&self, recipe_id: i64) -> Result<Vec<Tag>>;
    fn list_recipe_ingredients(&self, recipe_id: i64) -> Result<Vec<RecipeIngredient>>;
    fn list_author_recipes(&self, author_id: i64, limit: Option<i64>) -> Result<Vec<Recipe>>;
    fn count_author_recipes(&self, author_id: i64) -> Result<i64>;

    // Favorite and shopping cart operations
    fn add_recipe_mark(&self, mark: RecipeMark, user_id: i64, recipe_id: i64) -> Result<()>;
    fn remove_recipe_mark(&self, mark: RecipeMark, user_id: i64, recipe_id: i64) -> Result<bool>;
    fn has_recipe_mark(&self, mark: RecipeMark, user_id: i64, recipe_id: i64) -> Result<bool>;
    /// Every ingredient row of every recipe in the user's cart, grouped by recipe.
    fn list_cart_ingredients(&self, user_id: i64) -> Result<Vec<RecipeIngredient>>;

    // Subscription operations
    fn create_subscription(&self, user_id: i64, author_id: i64) -> Result<()>;
    fn delete_subscription(&self, user_id: i64, author_id: i64) -> Result<bool>;
    fn is_subscribed(&self, user_id: i64, author_id: i64) -> Result<bool>;
    /// Authors followed by `user_id`, most recently followed first.
    fn list_subscriptions(&self, user_id: i64, offset: i64, limit: i64) -> Result<Vec<User>>;
    fn count_subscriptions(&self, user_id: i64) -> Result<i64>;
}
