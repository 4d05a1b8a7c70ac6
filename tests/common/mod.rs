//! In-process HTTP helpers: requests go straight into the router with
//! `tower::ServiceExt::oneshot`, against a fresh database per test.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, Bytes, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use foodgram::server::{AppState, create_router};
use foodgram::store::{SqliteStore, Store};
use foodgram::types::{Ingredient, Tag};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

pub const PAGE_SIZE: i64 = 6;

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("response body is UTF-8")
    }

    pub fn header(&self, name: header::HeaderName) -> &str {
        self.headers
            .get(name)
            .expect("header present")
            .to_str()
            .expect("header is ASCII")
    }
}

pub struct TestApp {
    _temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = Arc::new(SqliteStore::new(temp_dir.path().join("test.db")).expect("open db"));
        store.initialize().expect("initialize db");

        let state = Arc::new(AppState::new(store.clone(), PAGE_SIZE));
        let router = create_router(state);

        Self {
            _temp_dir: temp_dir,
            store,
            router,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
        }

        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).expect("build request"))
            .await
            .expect("execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Registers a user through the API and logs in. Returns (user id, token key).
    pub async fn register(&self, username: &str) -> (i64, String) {
        let email = format!("{username}@example.com");
        let resp = self
            .post(
                "/api/users/",
                None,
                json!({
                    "email": email,
                    "username": username,
                    "first_name": "Test",
                    "last_name": "Cook",
                    "password": "secret-password",
                }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "register: {}", resp.text());
        let id = resp.json()["data"]["id"].as_i64().expect("user id");

        let resp = self
            .post(
                "/api/auth/token/login/",
                None,
                json!({ "email": email, "password": "secret-password" }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK, "login: {}", resp.text());
        let token = resp.json()["data"]["auth_token"]
            .as_str()
            .expect("auth token")
            .to_string();

        (id, token)
    }

    pub fn tag(&self, name: &str, color: &str, slug: &str) -> Tag {
        self.store.create_tag(name, color, slug).expect("create tag")
    }

    pub fn ingredient(&self, name: &str, unit: &str) -> Ingredient {
        self.store
            .create_ingredient(name, unit)
            .expect("create ingredient")
    }

    /// Creates a recipe through the API and returns its id.
    pub async fn recipe(&self, token: &str, body: Value) -> i64 {
        let resp = self.post("/api/recipes/", Some(token), body).await;
        assert_eq!(resp.status, StatusCode::CREATED, "create recipe: {}", resp.text());
        resp.json()["data"]["id"].as_i64().expect("recipe id")
    }
}

pub fn recipe_body(name: &str, tags: &[i64], ingredients: &[(i64, f64)]) -> Value {
    let ingredients: Vec<Value> = ingredients
        .iter()
        .map(|(id, amount)| json!({ "id": id, "amount": amount }))
        .collect();

    json!({
        "name": name,
        "text": "Mix everything and cook.",
        "image": "recipes/images/dish.png",
        "cooking_time": 20,
        "tags": tags,
        "ingredients": ingredients,
    })
}
