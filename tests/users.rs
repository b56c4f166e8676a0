//! User Tests
//!
//! Covers signup (validation, uniqueness, verification task) and profile
//! lookups.

mod common;

use axum::http::StatusCode;
use common::app;
use serde_json::json;

fn signup_body(suffix: &str) -> serde_json::Value {
    json!({
        "email": format!("signup_{}@example.com", suffix),
        "password": "secret123",
        "username": format!("signup_{}", suffix),
        "first_name": "Ada",
        "last_name": "Lovelace",
    })
}

// ===========================================================================
// Signup
// ===========================================================================

#[tokio::test]
async fn signup_valid_data() {
    let app = app().await;

    let resp = app
        .post_json("/v1/auth/signup", signup_body("valid"), None)
        .await;

    assert_eq!(resp.status, StatusCode::CREATED);
    let data = resp.data();
    assert_eq!(data["message"], "User created successfully.");
    let user_id = data["user_id"].as_i64().unwrap();
    assert!(user_id >= 1);

    let (activated, hash): (bool, String) =
        sqlx::query_as("SELECT activated, password_hash FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(app.pool())
            .await
            .unwrap();
    assert!(!activated);
    assert!(hash.starts_with("$argon2"));
    assert_ne!(hash, "secret123");
}

#[tokio::test]
async fn signup_then_login_and_fetch_me() {
    let app = app().await;
    let body = signup_body("e2e");

    let resp = app.post_json("/v1/auth/signup", body.clone(), None).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let user_id = resp.data()["user_id"].as_i64().unwrap();

    let resp = app
        .login(body["email"].as_str().unwrap(), "secret123")
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let token = resp.auth_cookie().unwrap();

    let resp = app.get("/v1/user/me", Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let me = resp.data();
    assert_eq!(me["id"].as_i64().unwrap(), user_id);
    assert_eq!(me["email"], body["email"]);
    assert_eq!(me["activated"], false);
    assert!(me.get("password").is_none());
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn signup_duplicate_email() {
    let app = app().await;
    let existing = app.create_user("dup_email").await;

    let mut body = signup_body("dup_email_other");
    body["email"] = json!(existing.email);

    let resp = app.post_json("/v1/auth/signup", body, None).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "duplicate email");
}

#[tokio::test]
async fn signup_duplicate_username() {
    let app = app().await;
    let existing = app.create_user("dup_name").await;

    let mut body = signup_body("dup_name_other");
    body["username"] = json!(existing.username);

    let resp = app.post_json("/v1/auth/signup", body, None).await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_message(), "duplicate username");
}

#[tokio::test]
async fn signup_missing_fields() {
    let app = app().await;

    let resp = app
        .post_json(
            "/v1/auth/signup",
            json!({ "email": "partial@example.com" }),
            None,
        )
        .await;

    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    let errors = resp.json()["error"].as_array().unwrap().clone();
    let keys: Vec<&str> = errors.iter().map(|e| e["key"].as_str().unwrap()).collect();
    assert_eq!(keys, vec!["first_name", "last_name", "password", "username"]);
    assert!(errors
        .iter()
        .all(|e| e["message"] == "This field is required"));
}

#[tokio::test]
async fn signup_password_too_short() {
    let app = app().await;
    let mut body = signup_body("short_pw");
    body["password"] = json!("abc");

    let resp = app.post_json("/v1/auth/signup", body, None).await;

    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.json()["error"][0]["key"], "password");
}

#[tokio::test]
async fn signup_invalid_email() {
    let app = app().await;
    let mut body = signup_body("bad_email");
    body["email"] = json!("nope");

    let resp = app.post_json("/v1/auth/signup", body, None).await;

    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        resp.json()["error"],
        json!([{ "key": "email", "message": "Invalid email" }])
    );
}

// ===========================================================================
// Profiles
// ===========================================================================

#[tokio::test]
async fn get_user_by_username() {
    let app = app().await;
    let user = app.create_user("profile_public").await;

    let resp = app
        .get(&format!("/v1/user/{}", user.username), None)
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    let data = resp.data();
    assert_eq!(data["id"].as_i64().unwrap(), user.id);
    assert_eq!(data["username"], user.username.as_str());
    assert!(data.get("email").is_none());
    assert!(data.get("activated").is_none());
}

#[tokio::test]
async fn get_unknown_username() {
    let app = app().await;

    let resp = app.get("/v1/user/no_such_user_here", None).await;

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.error_message(), "the requested resource was not found");
    assert_eq!(resp.json()["code"], 404);
}
