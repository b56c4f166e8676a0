use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::session::Session;
use crate::http::AppError;
use crate::AppState;

pub const AUTH_COOKIE: &str = "auth_token";

/// The authenticated caller, placed in request extensions by
/// [`require_session`].
#[derive(Debug, Clone, Copy)]
pub struct SessionUser {
    pub user_id: i64,
}

/// Resolves the `auth_token` cookie to a cached session. A missing cookie is
/// rejected with 403; a cookie that does not resolve to a live session with
/// 401.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(request.headers())
        .ok_or_else(|| AppError::forbidden("session cookie not found"))?
        .to_string();

    let session: Session = state.cache.get_json(&token).await.map_err(|err| {
        tracing::debug!(error = %err, "session lookup failed");
        AppError::unauthorized("unauthorized")
    })?;

    if session.user_id < 1 {
        return Err(AppError::unauthorized("unauthorized"));
    }

    request.extensions_mut().insert(SessionUser {
        user_id: session.user_id,
    });
    Ok(next.run(request).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionUser>()
            .copied()
            .ok_or_else(|| AppError::unauthorized("unauthorized"))
    }
}

pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .map(|cookie| cookie.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let value = split.next()?.trim();
            if key == AUTH_COOKIE && !value.is_empty() {
                Some(value)
            } else {
                None
            }
        })
}

pub fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
        AUTH_COOKIE, token, max_age_seconds
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
