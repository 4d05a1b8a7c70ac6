//! HTTP integration tests driving the router in-process.

mod common;

use axum::http::{StatusCode, header};
use foodgram::store::Store;
use foodgram::types::RecipeMark;
use serde_json::json;

use common::{TestApp, recipe_body};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let resp = app.get("/health", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.text(), "OK");
}

#[tokio::test]
async fn test_register_login_and_me() {
    let app = TestApp::new();
    let (id, token) = app.register("anna").await;

    let resp = app.get("/api/users/me/", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["data"]["id"], id);
    assert_eq!(body["data"]["username"], "anna");
    assert!(body["data"].get("password").is_none());
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_reuses_token() {
    let app = TestApp::new();
    let (_, first) = app.register("anna").await;

    let resp = app
        .post(
            "/api/auth/token/login/",
            None,
            json!({ "email": "anna@example.com", "password": "secret-password" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["data"]["auth_token"], first.as_str());
}

#[tokio::test]
async fn test_login_failures() {
    let app = TestApp::new();
    app.register("anna").await;

    let resp = app
        .post(
            "/api/auth/token/login/",
            None,
            json!({ "email": "anna@example.com", "password": "wrong" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["fields"]["password"][0], "invalid password");

    let resp = app
        .post(
            "/api/auth/token/login/",
            None,
            json!({ "email": "nobody@example.com", "password": "secret-password" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = TestApp::new();
    let (_, token) = app.register("anna").await;

    let resp = app
        .request(
            axum::http::Method::POST,
            "/api/auth/token/logout/",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app.get("/api/users/me/", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert!(resp.headers.contains_key(header::WWW_AUTHENTICATE));
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let app = TestApp::new();
    app.register("anna").await;

    let resp = app
        .post(
            "/api/users/",
            None,
            json!({
                "email": "anna@example.com",
                "username": "other",
                "first_name": "A",
                "last_name": "B",
                "password": "pw",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.json()["fields"]["email"].is_array());

    let resp = app
        .post(
            "/api/users/",
            None,
            json!({
                "email": "other@example.com",
                "username": "anna",
                "first_name": "A",
                "last_name": "B",
                "password": "pw",
            }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.json()["fields"]["username"].is_array());
}

#[tokio::test]
async fn test_set_password_checks_current() {
    let app = TestApp::new();
    let (_, token) = app.register("anna").await;

    let resp = app
        .post(
            "/api/users/set_password/",
            Some(&token),
            json!({ "current_password": "nope", "new_password": "fresh" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .post(
            "/api/users/set_password/",
            Some(&token),
            json!({ "current_password": "secret-password", "new_password": "fresh" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app
        .post(
            "/api/auth/token/login/",
            None,
            json!({ "email": "anna@example.com", "password": "fresh" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let app = TestApp::new();
    let resp = app
        .get("/api/users/me/", Some("0000000000000000000000000000000000000000"))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app.get("/api/users/me/", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_get_recipe() {
    let app = TestApp::new();
    let (author_id, token) = app.register("anna").await;
    let tag = app.tag("Breakfast", "#E26C2D", "breakfast");
    let flour = app.ingredient("flour", "g");
    let milk = app.ingredient("milk", "ml");

    let id = app
        .recipe(
            &token,
            recipe_body("Pancakes", &[tag.id], &[(flour.id, 200.0), (milk.id, 300.0)]),
        )
        .await;

    let resp = app.get(&format!("/api/recipes/{id}/"), None).await;
    assert_eq!(resp.status, StatusCode::OK);
    let data = &resp.json()["data"];
    assert_eq!(data["name"], "Pancakes");
    assert_eq!(data["author"]["id"], author_id);
    assert_eq!(data["tags"][0]["slug"], "breakfast");
    assert_eq!(data["ingredients"][0]["name"], "flour");
    assert_eq!(data["ingredients"][0]["amount"], 200.0);
    assert_eq!(data["ingredients"][1]["measurement_unit"], "ml");
    assert_eq!(data["is_favorited"], false);
    assert_eq!(data["is_in_shopping_cart"], false);
}

#[tokio::test]
async fn test_recipe_requires_auth() {
    let app = TestApp::new();
    let resp = app
        .post("/api/recipes/", None, recipe_body("Soup", &[], &[]))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_ingredient_rejected() {
    let app = TestApp::new();
    let (_, token) = app.register("anna").await;
    let flour = app.ingredient("flour", "g");

    let resp = app
        .post(
            "/api/recipes/",
            Some(&token),
            recipe_body("Bread", &[], &[(flour.id, 2.5), (flour.id, 1.0)]),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.json()["fields"]["ingredients"][0],
        "ingredients must be unique"
    );
}

#[tokio::test]
async fn test_duplicate_tags_rejected() {
    let app = TestApp::new();
    let (_, token) = app.register("anna").await;
    let tag = app.tag("Lunch", "#00FF00", "lunch");

    let resp = app
        .post(
            "/api/recipes/",
            Some(&token),
            recipe_body("Salad", &[tag.id, tag.id], &[]),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["fields"]["tags"][0], "tags must be unique");
}

#[tokio::test]
async fn test_negative_cooking_time_rejected_on_create_and_update() {
    let app = TestApp::new();
    let (_, token) = app.register("anna").await;

    let mut body = recipe_body("Soup", &[], &[]);
    body["cooking_time"] = json!(-1);
    let resp = app.post("/api/recipes/", Some(&token), body.clone()).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.json()["fields"]["cooking_time"][0],
        "cooking time must be non-negative"
    );

    let id = app.recipe(&token, recipe_body("Soup", &[], &[])).await;
    let resp = app
        .put(&format!("/api/recipes/{id}/"), Some(&token), body)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_references_are_not_found() {
    let app = TestApp::new();
    let (_, token) = app.register("anna").await;

    let resp = app
        .post("/api/recipes/", Some(&token), recipe_body("Soup", &[99], &[]))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app
        .post(
            "/api/recipes/",
            Some(&token),
            recipe_body("Soup", &[], &[(42, 1.0)]),
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app.get("/api/recipes/", None).await;
    assert_eq!(resp.json()["count"], 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = TestApp::new();
    let (_, token) = app.register("anna").await;

    let resp = app
        .post("/api/recipes/", Some(&token), json!({ "name": "Soup" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.json()["data"].is_null());
}

#[tokio::test]
async fn test_overflowing_amount_rejected() {
    let app = TestApp::new();
    let (_, token) = app.register("anna").await;
    let flour = app.ingredient("flour", "g");

    let mut body = recipe_body("Bread", &[], &[]);
    body["ingredients"] = json!([{ "id": flour.id, "amount": "9".repeat(400) }]);
    let resp = app.post("/api/recipes/", Some(&token), body).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.json()["data"].is_null());

    let resp = app.get("/api/recipes/", None).await;
    assert_eq!(resp.json()["count"], 0);
}

#[tokio::test]
async fn test_malformed_query_and_path_use_error_shape() {
    let app = TestApp::new();

    let resp = app.get("/api/users/?page=abc", None).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    let body = resp.json();
    assert!(body["data"].is_null());
    assert!(body["error"].is_string());

    let resp = app.get("/api/recipes/abc/", None).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    let body = resp.json();
    assert!(body["data"].is_null());
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_update_replaces_relations() {
    let app = TestApp::new();
    let (_, token) = app.register("anna").await;
    let breakfast = app.tag("Breakfast", "#E26C2D", "breakfast");
    let dinner = app.tag("Dinner", "#49B64E", "dinner");
    let flour = app.ingredient("flour", "g");
    let eggs = app.ingredient("eggs", "pcs");

    let id = app
        .recipe(
            &token,
            recipe_body("Pancakes", &[breakfast.id], &[(flour.id, 200.0)]),
        )
        .await;

    let resp = app
        .request(
            axum::http::Method::PATCH,
            &format!("/api/recipes/{id}/"),
            Some(&token),
            Some(recipe_body("Omelette", &[dinner.id], &[(eggs.id, 3.0)])),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let data = &resp.json()["data"];
    assert_eq!(data["name"], "Omelette");
    assert_eq!(data["tags"].as_array().unwrap().len(), 1);
    assert_eq!(data["tags"][0]["slug"], "dinner");
    assert_eq!(data["ingredients"].as_array().unwrap().len(), 1);
    assert_eq!(data["ingredients"][0]["name"], "eggs");

    let resp = app
        .put(
            &format!("/api/recipes/{id}/"),
            Some(&token),
            recipe_body("Plain", &[], &[]),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.json()["data"]["ingredients"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_owner_cannot_modify() {
    let app = TestApp::new();
    let (_, owner) = app.register("anna").await;
    let (_, other) = app.register("boris").await;

    let id = app.recipe(&owner, recipe_body("Soup", &[], &[])).await;

    let resp = app
        .put(
            &format!("/api/recipes/{id}/"),
            Some(&other),
            recipe_body("Mine now", &[], &[]),
        )
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = app.delete(&format!("/api/recipes/{id}/"), Some(&other)).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = app.get(&format!("/api/recipes/{id}/"), None).await;
    assert_eq!(resp.json()["data"]["name"], "Soup");
}

#[tokio::test]
async fn test_delete_cascades_but_keeps_tags_and_ingredients() {
    let app = TestApp::new();
    let (user_id, token) = app.register("anna").await;
    let tag = app.tag("Breakfast", "#E26C2D", "breakfast");
    let flour = app.ingredient("flour", "g");

    let id = app
        .recipe(&token, recipe_body("Pancakes", &[tag.id], &[(flour.id, 1.0)]))
        .await;
    app.get(&format!("/api/recipes/{id}/favorite/"), Some(&token))
        .await;
    app.get(&format!("/api/recipes/{id}/shopping_cart/"), Some(&token))
        .await;

    let resp = app.delete(&format!("/api/recipes/{id}/"), Some(&token)).await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app.get(&format!("/api/recipes/{id}/"), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    assert!(app.store.get_tag(tag.id).unwrap().is_some());
    assert!(app.store.get_ingredient(flour.id).unwrap().is_some());
    assert!(!app.store.has_recipe_mark(RecipeMark::Favorite, user_id, id).unwrap());
    assert!(app.store.list_cart_ingredients(user_id).unwrap().is_empty());
}

#[tokio::test]
async fn test_favorite_toggle_state_machine() {
    let app = TestApp::new();
    let (_, token) = app.register("anna").await;
    let id = app.recipe(&token, recipe_body("Soup", &[], &[])).await;
    let uri = format!("/api/recipes/{id}/favorite/");

    let resp = app.get(&uri, Some(&token)).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let data = &resp.json()["data"];
    assert_eq!(data["id"], id);
    assert_eq!(data["name"], "Soup");
    assert_eq!(data["cooking_time"], 20);

    let resp = app.get(&uri, Some(&token)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app.delete(&uri, Some(&token)).await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);

    let resp = app.delete(&uri, Some(&token)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app.get("/api/recipes/999/favorite/", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_toggle_accepts_post() {
    let app = TestApp::new();
    let (_, token) = app.register("anna").await;
    let id = app.recipe(&token, recipe_body("Soup", &[], &[])).await;
    let uri = format!("/api/recipes/{id}/shopping_cart/");

    let resp = app.post(&uri, Some(&token), json!({})).await;
    assert_eq!(resp.status, StatusCode::CREATED);

    let resp = app.get(&format!("/api/recipes/{id}/"), Some(&token)).await;
    assert_eq!(resp.json()["data"]["is_in_shopping_cart"], true);

    let resp = app.post(&uri, Some(&token), json!({})).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_shopping_cart_sums_ingredients() {
    let app = TestApp::new();
    let (_, token) = app.register("anna").await;
    let flour = app.ingredient("flour", "g");
    let milk = app.ingredient("milk", "ml");

    let pancakes = app
        .recipe(
            &token,
            recipe_body("Pancakes", &[], &[(flour.id, 200.0), (milk.id, 300.0)]),
        )
        .await;
    let bread = app
        .recipe(&token, recipe_body("Bread", &[], &[(flour.id, 500.0)]))
        .await;

    for id in [pancakes, bread] {
        let resp = app
            .get(&format!("/api/recipes/{id}/shopping_cart/"), Some(&token))
            .await;
        assert_eq!(resp.status, StatusCode::CREATED);
    }

    let resp = app
        .get("/api/recipes/download_shopping_cart/", Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.header(header::CONTENT_TYPE).starts_with("text/plain"));
    assert_eq!(
        resp.header(header::CONTENT_DISPOSITION),
        "attachment; filename=\"shopping_list.txt\""
    );
    assert_eq!(
        resp.text(),
        "Shopping list\nflour (g) - 700\nmilk (ml) - 300\n"
    );
}

#[tokio::test]
async fn test_download_empty_cart() {
    let app = TestApp::new();
    let (_, token) = app.register("anna").await;

    let resp = app
        .get("/api/recipes/download_shopping_cart/", Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.text(), "Shopping list\n");
}

#[tokio::test]
async fn test_list_filters_and_pagination() {
    let app = TestApp::new();
    let (anna_id, anna) = app.register("anna").await;
    let (_, boris) = app.register("boris").await;
    let breakfast = app.tag("Breakfast", "#E26C2D", "breakfast");
    let quick = app.tag("Quick", "#49B64E", "quick");

    let both = app
        .recipe(&anna, recipe_body("Toast", &[breakfast.id, quick.id], &[]))
        .await;
    app.recipe(&anna, recipe_body("Porridge", &[breakfast.id], &[]))
        .await;
    let borscht = app.recipe(&boris, recipe_body("Borscht", &[], &[])).await;

    let resp = app.get("/api/recipes/", None).await;
    let body = resp.json();
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"][0]["id"], borscht);

    let resp = app
        .get("/api/recipes/?tags=breakfast&tags=quick", None)
        .await;
    let body = resp.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["id"], both);

    let resp = app
        .get(&format!("/api/recipes/?author={anna_id}"), None)
        .await;
    assert_eq!(resp.json()["count"], 2);

    let resp = app.get("/api/recipes/?author=ANN", None).await;
    let body = resp.json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["author"]["username"], "anna");

    let resp = app.get("/api/recipes/?author=nobody", None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["count"], 0);

    let resp = app.get("/api/recipes/?page=2&limit=2", None).await;
    let body = resp.json();
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["previous"], 1);
    assert!(body.get("next").is_none());

    app.get(&format!("/api/recipes/{borscht}/favorite/"), Some(&anna))
        .await;
    let resp = app
        .get("/api/recipes/?is_favorited=1", Some(&anna))
        .await;
    let body = resp.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["is_favorited"], true);

    // Relation filters are ignored for anonymous callers.
    let resp = app.get("/api/recipes/?is_favorited=1", None).await;
    assert_eq!(resp.json()["count"], 3);
}

#[tokio::test]
async fn test_subscribe_toggle_and_feed() {
    let app = TestApp::new();
    let (_, reader) = app.register("reader").await;
    let (author_id, author) = app.register("author").await;

    for name in ["One", "Two", "Three"] {
        app.recipe(&author, recipe_body(name, &[], &[])).await;
    }

    let uri = format!("/api/users/{author_id}/subscribe/?recipes_limit=2");
    let resp = app.get(&uri, Some(&reader)).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let data = &resp.json()["data"];
    assert_eq!(data["id"], author_id);
    assert_eq!(data["is_subscribed"], true);
    assert_eq!(data["recipes"].as_array().unwrap().len(), 2);
    assert_eq!(data["recipes_count"], 3);

    let resp = app.get(&uri, Some(&reader)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .get("/api/users/subscriptions/?recipes_limit=1", Some(&reader))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let body = resp.json();
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["username"], "author");
    assert_eq!(body["results"][0]["recipes"][0]["name"], "Three");
    assert_eq!(body["results"][0]["recipes"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["recipes_count"], 3);

    let resp = app
        .get("/api/users/subscriptions/?recipes_limit=abc", Some(&reader))
        .await;
    assert_eq!(
        resp.json()["results"][0]["recipes"].as_array().unwrap().len(),
        3
    );

    let resp = app
        .get(&format!("/api/users/{author_id}/"), Some(&reader))
        .await;
    assert_eq!(resp.json()["data"]["is_subscribed"], true);

    let unsubscribe = format!("/api/users/{author_id}/subscribe/");
    let resp = app.delete(&unsubscribe, Some(&reader)).await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);
    let resp = app.delete(&unsubscribe, Some(&reader)).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_subscribe_edge_cases() {
    let app = TestApp::new();
    let (me, token) = app.register("anna").await;

    let resp = app
        .get(&format!("/api/users/{me}/subscribe/"), Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app.get("/api/users/999/subscribe/", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tags_and_ingredient_search() {
    let app = TestApp::new();
    app.tag("Breakfast", "#E26C2D", "breakfast");
    app.ingredient("Sugar", "g");
    app.ingredient("Brown sugar", "g");
    app.ingredient("Salt", "g");

    let resp = app.get("/api/tags/", None).await;
    assert_eq!(resp.json()["data"].as_array().unwrap().len(), 1);

    let resp = app.get("/api/ingredients/?name=su", None).await;
    let names: Vec<String> = resp.json()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Sugar", "Brown sugar"]);

    let resp = app.get("/api/ingredients/12345/", None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_list_paginates() {
    let app = TestApp::new();
    for name in ["a1", "a2", "a3"] {
        app.register(name).await;
    }

    let resp = app.get("/api/users/?limit=2", None).await;
    let body = resp.json();
    assert_eq!(body["count"], 3);
    assert_eq!(body["next"], 2);
    assert_eq!(body["results"][0]["is_subscribed"], false);

    let resp = app.get("/api/users/?page=0", None).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}
