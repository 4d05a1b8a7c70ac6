mod ingredients;
mod marks;
mod recipes;
pub mod render;
mod subscriptions;
mod tags;
mod tokens;
mod users;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Recipes
        .route(
            "/recipes/",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipes/download_shopping_cart/",
            get(marks::download_shopping_cart),
        )
        .route(
            "/recipes/{id}/",
            get(recipes::get_recipe)
                .put(recipes::update_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/recipes/{id}/favorite/",
            get(marks::add_favorite)
                .post(marks::add_favorite)
                .delete(marks::remove_favorite),
        )
        .route(
            "/recipes/{id}/shopping_cart/",
            get(marks::add_to_cart)
                .post(marks::add_to_cart)
                .delete(marks::remove_from_cart),
        )
        // Tags and ingredients
        .route("/tags/", get(tags::list_tags))
        .route("/tags/{id}/", get(tags::get_tag))
        .route("/ingredients/", get(ingredients::list_ingredients))
        .route("/ingredients/{id}/", get(ingredients::get_ingredient))
        // Users
        .route("/users/", get(users::list_users).post(users::create_user))
        .route("/users/me/", get(users::me))
        .route(
            "/users/set_password/",
            post(users::set_password),
        )
        .route(
            "/users/subscriptions/",
            get(subscriptions::list_subscriptions),
        )
        .route("/users/{id}/", get(users::get_user))
        .route(
            "/users/{id}/subscribe/",
            get(subscriptions::subscribe)
                .post(subscriptions::subscribe)
                .delete(subscriptions::unsubscribe),
        )
        // Tokens
        .route("/auth/token/login/", post(tokens::login))
        .route("/auth/token/logout/", post(tokens::logout))
}
