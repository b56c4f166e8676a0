use axum::{routing::delete, routing::get, routing::post, Router};

use crate::AppState;
use crate::http::handlers;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(handlers::signup))
        .route("/auth/login", post(handlers::login))
        .route("/auth/logout", post(handlers::logout))
}

pub fn users() -> Router<AppState> {
    Router::new().route("/user/:username", get(handlers::get_user))
}

// Everything below requires a session.

pub fn me() -> Router<AppState> {
    Router::new().route("/user/me", get(handlers::get_me))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route("/posts", post(handlers::create_post))
        .route("/posts/:id", delete(handlers::delete_post))
        .route(
            "/posts/:id/like",
            post(handlers::like_post).delete(handlers::remove_like),
        )
        .route("/posts/:id/comment", post(handlers::comment_post))
        .route(
            "/posts/:id/comment/:comment_id",
            delete(handlers::remove_comment),
        )
}

pub fn followers() -> Router<AppState> {
    Router::new().route(
        "/follow/:id",
        post(handlers::follow_user).delete(handlers::unfollow_user),
    )
}

pub fn feed() -> Router<AppState> {
    Router::new().route("/feed", get(handlers::get_feed))
}
