use std::collections::HashSet;
use std::hash::Hash;

use thiserror::Error;

use crate::server::dto::{CreateUserRequest, RecipeRequest};
use crate::server::response::{ApiError, FieldErrors};
use crate::types::IngredientAmount;

const MAX_RECIPE_NAME_LEN: usize = 200;
const MAX_USERNAME_LEN: usize = 150;
const MAX_PERSON_NAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;
const MAX_TAG_NAME_LEN: usize = 200;
const MAX_SLUG_LEN: usize = 100;

/// Structural rules for a recipe payload, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecipeRule {
    #[error("tags must be unique")]
    DuplicateTags,
    #[error("ingredients must be unique")]
    DuplicateIngredients,
    #[error("cooking time must be non-negative")]
    NegativeCookingTime,
    #[error("ingredient amount must be non-negative")]
    NegativeAmount,
}

impl RecipeRule {
    #[must_use]
    pub fn field(self) -> &'static str {
        match self {
            RecipeRule::DuplicateTags => "tags",
            RecipeRule::DuplicateIngredients | RecipeRule::NegativeAmount => "ingredients",
            RecipeRule::NegativeCookingTime => "cooking_time",
        }
    }
}

impl From<RecipeRule> for ApiError {
    fn from(rule: RecipeRule) -> Self {
        ApiError::field(rule.field(), rule.to_string())
    }
}

fn all_distinct<T: Eq + Hash>(items: impl IntoIterator<Item = T>) -> bool {
    let mut seen = HashSet::new();
    items.into_iter().all(|item| seen.insert(item))
}

/// Applies the recipe rules; the first violated rule is returned.
pub fn check_recipe_rules(
    tag_ids: &[i64],
    ingredients: &[IngredientAmount],
    cooking_time: i64,
) -> Result<(), RecipeRule> {
    if !all_distinct(tag_ids) {
        return Err(RecipeRule::DuplicateTags);
    }
    if !all_distinct(ingredients.iter().map(|i| i.id)) {
        return Err(RecipeRule::DuplicateIngredients);
    }
    if cooking_time < 0 {
        return Err(RecipeRule::NegativeCookingTime);
    }
    // Negated comparison so NaN is rejected too.
    if ingredients
        .iter()
        .any(|i| !(i.amount >= 0.0 && i.amount.is_finite()))
    {
        return Err(RecipeRule::NegativeAmount);
    }
    Ok(())
}

fn require_text(fields: &mut FieldErrors, field: &str, value: &str, max_len: Option<usize>) {
    if value.trim().is_empty() {
        fields
            .entry(field.to_string())
            .or_default()
            .push(format!("{field} cannot be blank"));
    } else if let Some(max_len) = max_len {
        if value.chars().count() > max_len {
            fields
                .entry(field.to_string())
                .or_default()
                .push(format!("{field} cannot exceed {max_len} characters"));
        }
    }
}

/// Validates a recipe payload: required scalar fields first, then the recipe rules.
pub fn validate_recipe(req: &RecipeRequest) -> Result<(), ApiError> {
    let mut fields = FieldErrors::new();
    require_text(&mut fields, "name", &req.name, Some(MAX_RECIPE_NAME_LEN));
    require_text(&mut fields, "text", &req.text, None);
    require_text(&mut fields, "image", &req.image, None);

    if !fields.is_empty() {
        return Err(ApiError::validation("invalid recipe", fields));
    }

    check_recipe_rules(&req.tags, &req.ingredient_amounts(), req.cooking_time)?;
    Ok(())
}

fn is_valid_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-')
}

pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("username cannot be empty".to_string());
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(format!(
            "username cannot exceed {MAX_USERNAME_LEN} characters"
        ));
    }
    if !username.chars().all(is_valid_username_char) {
        return Err(
            "username can only contain letters, digits, and the characters . @ + - _".to_string(),
        );
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.len() > MAX_EMAIL_LEN {
        return Err(format!("email cannot exceed {MAX_EMAIL_LEN} characters"));
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err("enter a valid email address".to_string()),
    }
}

/// Validates a registration payload, reporting every offending field at once.
pub fn validate_new_user(req: &CreateUserRequest) -> Result<(), ApiError> {
    let mut fields = FieldErrors::new();

    if let Err(message) = validate_email(&req.email) {
        fields.insert("email".to_string(), vec![message]);
    }
    if let Err(message) = validate_username(&req.username) {
        fields.insert("username".to_string(), vec![message]);
    }
    require_text(&mut fields, "first_name", &req.first_name, Some(MAX_PERSON_NAME_LEN));
    require_text(&mut fields, "last_name", &req.last_name, Some(MAX_PERSON_NAME_LEN));
    if req.password.is_empty() {
        fields.insert(
            "password".to_string(),
            vec!["password cannot be empty".to_string()],
        );
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation("invalid user", fields))
    }
}

/// Colors are `#` followed by six upper-case letters or digits.
pub fn validate_tag_color(color: &str) -> Result<(), String> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());

    if valid {
        Ok(())
    } else {
        Err(format!("invalid color '{color}', expected format #RRGGBB"))
    }
}

pub fn validate_tag_slug(slug: &str) -> Result<(), String> {
    if slug.is_empty() {
        return Err("slug cannot be empty".to_string());
    }
    if slug.len() > MAX_SLUG_LEN {
        return Err(format!("slug cannot exceed {MAX_SLUG_LEN} characters"));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("slug can only contain letters, digits, hyphens, and underscores".to_string());
    }
    Ok(())
}

pub fn validate_tag_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("tag name cannot be empty".to_string());
    }
    if name.chars().count() > MAX_TAG_NAME_LEN {
        return Err(format!("tag name cannot exceed {MAX_TAG_NAME_LEN} characters"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amounts(items: &[(i64, f64)]) -> Vec<IngredientAmount> {
        items
            .iter()
            .map(|&(id, amount)| IngredientAmount { id, amount })
            .collect()
    }

    #[test]
    fn test_valid_recipe_passes() {
        assert!(check_recipe_rules(&[1, 2], &amounts(&[(1, 2.5), (2, 0.0)]), 0).is_ok());
    }

    #[test]
    fn test_duplicate_tags() {
        let result = check_recipe_rules(&[1, 1], &[], 10);
        assert_eq!(result, Err(RecipeRule::DuplicateTags));
    }

    #[test]
    fn test_duplicate_ingredients_with_different_amounts() {
        let result = check_recipe_rules(&[], &amounts(&[(1, 2.5), (1, 1.0)]), 10);
        assert_eq!(result, Err(RecipeRule::DuplicateIngredients));
    }

    #[test]
    fn test_negative_cooking_time() {
        let result = check_recipe_rules(&[], &[], -1);
        assert_eq!(result, Err(RecipeRule::NegativeCookingTime));
    }

    #[test]
    fn test_negative_amount() {
        let result = check_recipe_rules(&[], &amounts(&[(1, -0.5)]), 10);
        assert_eq!(result, Err(RecipeRule::NegativeAmount));
    }

    #[test]
    fn test_infinite_amount() {
        let result = check_recipe_rules(&[], &amounts(&[(1, f64::INFINITY)]), 10);
        assert_eq!(result, Err(RecipeRule::NegativeAmount));
    }

    #[test]
    fn test_first_failure_wins() {
        let result = check_recipe_rules(&[3, 3], &amounts(&[(1, -1.0), (1, -1.0)]), -5);
        assert_eq!(result, Err(RecipeRule::DuplicateTags));

        let result = check_recipe_rules(&[3], &amounts(&[(1, -1.0), (1, -1.0)]), -5);
        assert_eq!(result, Err(RecipeRule::DuplicateIngredients));

        let result = check_recipe_rules(&[3], &amounts(&[(1, -1.0)]), -5);
        assert_eq!(result, Err(RecipeRule::NegativeCookingTime));
    }

    #[test]
    fn test_rule_messages() {
        assert_eq!(RecipeRule::DuplicateTags.to_string(), "tags must be unique");
        assert_eq!(
            RecipeRule::NegativeCookingTime.to_string(),
            "cooking time must be non-negative"
        );
    }

    #[test]
    fn test_username() {
        assert!(validate_username("chef.anna+1@home").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("no spaces").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("cook@example.com").is_ok());
        assert!(validate_email("cook.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("a@b@c").is_err());
    }

    #[test]
    fn test_tag_color() {
        assert!(validate_tag_color("#E26C2D").is_ok());
        assert!(validate_tag_color("#ZZ0000").is_ok());
        assert!(validate_tag_color("#e26c2d").is_err());
        assert!(validate_tag_color("E26C2D").is_err());
        assert!(validate_tag_color("#E26C2").is_err());
    }

    #[test]
    fn test_tag_slug() {
        assert!(validate_tag_slug("breakfast_2").is_ok());
        assert!(validate_tag_slug("").is_err());
        assert!(validate_tag_slug("two words").is_err());
    }
}
