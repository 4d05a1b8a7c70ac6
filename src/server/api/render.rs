//! Builds response bodies for an entity as seen by a given caller.

use crate::server::dto::{
    RecipeIngredientResponse, RecipeResponse, ShortRecipeResponse, SubscriptionResponse,
    UserResponse,
};
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::store::Store;
use crate::types::{Recipe, RecipeMark, User};

pub fn user(store: &dyn Store, user: &User, caller: Option<i64>) -> Result<UserResponse, ApiError> {
    let is_subscribed = match caller {
        Some(caller_id) => store
            .is_subscribed(caller_id, user.id)
            .api_err("Failed to check subscription")?,
        None => false,
    };

    Ok(UserResponse {
        id: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_subscribed,
    })
}

fn has_mark(
    store: &dyn Store,
    mark: RecipeMark,
    caller: Option<i64>,
    recipe_id: i64,
) -> Result<bool, ApiError> {
    match caller {
        Some(caller_id) => store
            .has_recipe_mark(mark, caller_id, recipe_id)
            .api_err("Failed to check recipe mark"),
        None => Ok(false),
    }
}

pub fn recipe(
    store: &dyn Store,
    recipe: Recipe,
    caller: Option<i64>,
) -> Result<RecipeResponse, ApiError> {
    let author = store
        .get_user(recipe.author_id)
        .api_err("Failed to get author")?
        .or_not_found("Author not found")?;

    let tags = store
        .list_recipe_tags(recipe.id)
        .api_err("Failed to list recipe tags")?;

    let ingredients = store
        .list_recipe_ingredients(recipe.id)
        .api_err("Failed to list recipe ingredients")?
        .into_iter()
        .map(|row| RecipeIngredientResponse {
            id: row.ingredient_id,
            name: row.name,
            measurement_unit: row.measurement_unit,
            amount: row.amount,
        })
        .collect();

    Ok(RecipeResponse {
        id: recipe.id,
        tags,
        author: user(store, &author, caller)?,
        ingredients,
        is_favorited: has_mark(store, RecipeMark::Favorite, caller, recipe.id)?,
        is_in_shopping_cart: has_mark(store, RecipeMark::ShoppingCart, caller, recipe.id)?,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

#[must_use]
pub fn short_recipe(recipe: Recipe) -> ShortRecipeResponse {
    ShortRecipeResponse {
        id: recipe.id,
        name: recipe.name,
        image: recipe.image,
        cooking_time: recipe.cooking_time,
    }
}

/// An author with their newest recipes, truncated to `recipes_limit` when given.
/// `recipes_count` always reports the full total.
pub fn subscription(
    store: &dyn Store,
    author: &User,
    caller: i64,
    recipes_limit: Option<i64>,
) -> Result<SubscriptionResponse, ApiError> {
    let recipes = store
        .list_author_recipes(author.id, recipes_limit)
        .api_err("Failed to list author recipes")?
        .into_iter()
        .map(short_recipe)
        .collect();

    let recipes_count = store
        .count_author_recipes(author.id)
        .api_err("Failed to count author recipes")?;

    Ok(SubscriptionResponse {
        user: user(store, author, Some(caller))?,
        recipes,
        recipes_count,
    })
}
