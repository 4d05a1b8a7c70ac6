use serde::{Deserialize, Deserializer, Serialize};

use crate::server::response::ApiError;
use crate::types::{AuthorFilter, IngredientAmount, RecipeDraft, Tag};

#[derive(Debug, Deserialize)]
pub struct IngredientAmountRequest {
    pub id: i64,
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: f64,
}

#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i64,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(default)]
    pub ingredients: Vec<IngredientAmountRequest>,
}

impl RecipeRequest {
    #[must_use]
    pub fn ingredient_amounts(&self) -> Vec<IngredientAmount> {
        self.ingredients
            .iter()
            .map(|i| IngredientAmount {
                id: i.id,
                amount: i.amount,
            })
            .collect()
    }

    #[must_use]
    pub fn into_draft(self) -> RecipeDraft {
        let ingredients = self.ingredient_amounts();
        RecipeDraft {
            name: self.name,
            image: self.image,
            text: self.text,
            cooking_time: self.cooking_time,
            tag_ids: self.tags,
            ingredients,
        }
    }
}

/// Amounts arrive either as JSON numbers or as decimal strings such as `"2.5"`.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    let (amount, raw) = match Amount::deserialize(deserializer)? {
        Amount::Number(n) => (Some(n), n.to_string()),
        Amount::Text(s) => {
            let well_formed =
                !s.is_empty() && s.chars().all(|c| c.is_ascii_digit() || c == '.');
            (s.parse::<f64>().ok().filter(|_| well_formed), s)
        }
    };

    // Over-long digit strings parse to infinity, which cannot be stored or rendered.
    amount
        .filter(|n| n.is_finite())
        .ok_or_else(|| serde::de::Error::custom(format!("invalid amount '{raw}'")))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub new_password: String,
    pub current_password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// `recipes_limit` is kept as text: anything that is not a non-negative
/// integer means "no limit" rather than a rejected request.
#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionParams {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub recipes_limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimitParams {
    #[serde(default)]
    pub recipes_limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IngredientSearchParams {
    #[serde(default)]
    pub name: Option<String>,
}

#[must_use]
pub fn parse_recipes_limit(raw: Option<&str>) -> Option<i64> {
    let raw = raw?;
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Query parameters of the recipe list. Parsed by hand because `tags` may repeat.
/// A numeric `author` is a user id; anything else matches part of a username.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RecipeListParams {
    pub tags: Vec<String>,
    pub author: Option<AuthorFilter>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

fn parse_flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "True")
}

fn parse_int(field: &str, value: &str) -> Result<i64, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::field(field, format!("{field} must be an integer")))
}

impl RecipeListParams {
    pub fn parse(query: Option<&str>) -> Result<Self, ApiError> {
        let mut params = Self::default();
        let Some(query) = query else {
            return Ok(params);
        };

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = value.replace('+', " ");
            let value = urlencoding::decode(&value)
                .map_err(|_| ApiError::bad_request("query string is not valid UTF-8"))?;

            match key {
                "tags" if !value.is_empty() => params.tags.push(value.into_owned()),
                "author" if !value.is_empty() => {
                    params.author = Some(match value.parse() {
                        Ok(id) => AuthorFilter::Id(id),
                        Err(_) => AuthorFilter::Username(value.into_owned()),
                    });
                }
                "is_favorited" => params.is_favorited = parse_flag(&value),
                "is_in_shopping_cart" => params.is_in_shopping_cart = parse_flag(&value),
                "page" => params.page = Some(parse_int("page", &value)?),
                "limit" => params.limit = Some(parse_int("limit", &value)?),
                _ => {}
            }
        }

        Ok(params)
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(Debug, Serialize)]
pub struct RecipeIngredientResponse {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
}

#[derive(Debug, Serialize)]
pub struct ShortRecipeResponse {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes: Vec<ShortRecipeResponse>,
    pub recipes_count: i64,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub auth_token: String,
}
