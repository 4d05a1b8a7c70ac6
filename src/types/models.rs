use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to insert a user; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// Opaque per-user credential. A user has at most one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub key: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
    pub created_at: DateTime<Utc>,
}

/// Scalar recipe fields plus its relations, as written by create and update.
#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
    pub tag_ids: Vec<i64>,
    pub ingredients: Vec<IngredientAmount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IngredientAmount {
    pub id: i64,
    pub amount: f64,
}

/// An ingredient row of a recipe, joined with the ingredient it points to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: f64,
}

/// How the recipe list picks an author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorFilter {
    Id(i64),
    /// Case-insensitive substring of the username.
    Username(String),
}

/// Filters applied to the recipe list. All present filters must match.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author: Option<AuthorFilter>,
    pub tag_slugs: Vec<String>,
    /// Restrict to recipes favorited by this user.
    pub favorited_by: Option<i64>,
    /// Restrict to recipes in this user's shopping cart.
    pub in_cart_of: Option<i64>,
}

/// User-recipe relations that share the same add/remove semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeMark {
    Favorite,
    ShoppingCart,
}

impl RecipeMark {
    pub(crate) fn table(self) -> &'static str {
        match self {
            RecipeMark::Favorite => "favorites",
            RecipeMark::ShoppingCart => "shopping_cart",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RecipeMark::Favorite => "favorites",
            RecipeMark::ShoppingCart => "shopping cart",
        }
    }
}
