use axum::extract::DefaultBodyLimit;
use axum::http::HeaderName;
use axum::{middleware, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod payload;
mod routes;

pub use auth::{session_token, SessionUser, AUTH_COOKIE};
pub use error::{AppError, FieldError};

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(routes::me())
        .merge(routes::posts())
        .merge(routes::followers())
        .merge(routes::feed())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let v1 = Router::new()
        .merge(routes::health())
        .merge(routes::auth())
        .merge(routes::users())
        .merge(protected);

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .nest("/v1", v1)
        .layer(DefaultBodyLimit::max(state.upload_max_bytes))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .with_state(state)
}
