use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use validator::Validate;

use crate::app::password::{generate_auth_token, MAX_PASSWORD_BYTES};
use crate::app::posts::PostService;
use crate::app::social::FollowerService;
use crate::app::users::{NewUser, UserService};
use crate::domain::engagement::Comment;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::post::Post;
use crate::domain::session::Session;
use crate::domain::user::{PublicUser, User};
use crate::http::auth::{session_cookie, SessionUser};
use crate::http::error::FieldError;
use crate::http::payload::{ok, Data};
use crate::http::AppError;
use crate::infra::storage::UploadFile;
use crate::AppState;

const REQUEST_DEADLINE: Duration = Duration::from_secs(5);
const UPLOAD_DEADLINE: Duration = Duration::from_secs(10);

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 20;
const MIN_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 50;

/// Runs a service call under a deadline. An elapsed deadline drops the call
/// and is reported as an internal error.
async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, AppError>
where
    F: Future<Output = DomainResult<T>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => {
            tracing::error!(deadline_ms = deadline.as_millis() as u64, "request deadline exceeded");
            Err(AppError::internal())
        }
    }
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(AppError::bad_request("invalid id parameter")),
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db = state.db.ping().await.is_ok();
    let redis = state.cache.ping().await.is_ok();
    let status = if db && redis { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(required, email)]
    pub email: Option<String>,
    #[validate(required, length(min = 6, max = 128))]
    pub password: Option<String>,
    #[validate(required, length(min = 3, max = 32))]
    pub username: Option<String>,
    #[validate(required, length(min = 1, max = 64))]
    pub first_name: Option<String>,
    #[validate(required, length(min = 1, max = 64))]
    pub last_name: Option<String>,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub user_id: i64,
}

fn check_password_bytes(password: &str) -> Result<(), AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::validation(vec![FieldError {
            key: "password".to_string(),
            message: format!("This field must be at most {} bytes long", MAX_PASSWORD_BYTES),
        }]));
    }
    Ok(())
}

pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Data<SignupResponse>>), AppError> {
    let payload = json_body(payload)?;
    payload.validate()?;

    let new_user = NewUser {
        email: payload.email.unwrap_or_default(),
        password: payload.password.unwrap_or_default(),
        first_name: payload.first_name.unwrap_or_default(),
        last_name: payload.last_name.unwrap_or_default(),
        username: payload.username.unwrap_or_default(),
    };
    check_password_bytes(&new_user.password)?;

    let service = UserService::new(state.db.clone(), state.queue.clone());
    let user = with_deadline(REQUEST_DEADLINE, service.create(new_user)).await?;

    Ok((
        StatusCode::CREATED,
        Json(Data::new(SignupResponse {
            message: "User created successfully.",
            user_id: user.id,
        })),
    ))
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(required, email)]
    pub email: Option<String>,
    #[validate(required, length(min = 6))]
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub auth_token: crate::app::password::AuthToken,
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let payload = json_body(payload)?;
    payload.validate()?;
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    check_password_bytes(&password)?;

    let service = UserService::new(state.db.clone(), state.queue.clone());
    let user = match with_deadline(REQUEST_DEADLINE, service.find_by_email(&email)).await {
        Ok(user) => user,
        Err(err) if err.status() == StatusCode::NOT_FOUND => {
            return Err(AppError::invalid_credentials())
        }
        Err(err) => return Err(err),
    };

    if !service.check_password(&user, &password).map_err(AppError::from)? {
        return Err(AppError::invalid_credentials());
    }

    let user_id = user.id;
    let token_ttl = time::Duration::hours(state.auth_token_ttl_hours as i64);
    let token = generate_auth_token(user_id, token_ttl);

    let session_ttl = Duration::from_secs(state.session_ttl_hours * 3600);
    let cache = state.cache.clone();
    let key = token.plaintext.clone();
    with_deadline(REQUEST_DEADLINE, async move {
        cache
            .set_json(&key, &Session { user_id }, session_ttl)
            .await
            .map_err(|err| DomainError::Other(err.into()))
    })
    .await?;

    tracing::info!(user_id = %user_id, "user logged in");

    let cookie = session_cookie(
        &token.plaintext,
        token_ttl.whole_seconds(),
        state.cookie_secure,
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(Data::new(LoginResponse { auth_token: token })),
    ))
}

pub async fn logout() -> Result<StatusCode, AppError> {
    Err(AppError::not_implemented("logout is not implemented"))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Data<PublicUser>>, AppError> {
    let service = UserService::new(state.db.clone(), state.queue.clone());
    let user = with_deadline(REQUEST_DEADLINE, service.find_by_username(&username)).await?;
    Ok(Json(Data::new(user)))
}

pub async fn get_me(
    State(state): State<AppState>,
    session: SessionUser,
) -> Result<Json<Data<User>>, AppError> {
    let service = UserService::new(state.db.clone(), state.queue.clone());
    let user = with_deadline(REQUEST_DEADLINE, service.find_by_id(session.user_id)).await?;
    Ok(Json(Data::new(user)))
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[derive(Validate)]
struct CreatePostForm {
    #[validate(required, length(min = 1))]
    body: Option<String>,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::payload_too_large("request body is too large")
    } else {
        AppError::bad_request(err.body_text())
    }
}

pub async fn create_post(
    State(state): State<AppState>,
    session: SessionUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Data<Post>>), AppError> {
    let mut multipart = multipart.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

    let mut form = CreatePostForm { body: None };
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("body") => form.body = Some(field.text().await.map_err(multipart_error)?),
            Some("images") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                if data.is_empty() {
                    continue;
                }
                files.push(UploadFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }
    form.validate()?;

    let service = PostService::new(
        state.db.clone(),
        state.storage.clone(),
        state.upload_folder.clone(),
    );
    let body = form.body.unwrap_or_default();
    let post = with_deadline(UPLOAD_DEADLINE, service.create_post(files, body, session.user_id)).await?;

    Ok((StatusCode::CREATED, Json(Data::new(post))))
}

pub async fn delete_post(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<Data<&'static str>>, AppError> {
    let post_id = parse_id(&id)?;
    let service = PostService::new(
        state.db.clone(),
        state.storage.clone(),
        state.upload_folder.clone(),
    );
    with_deadline(REQUEST_DEADLINE, service.delete_post(post_id, session.user_id)).await?;
    Ok(Json(ok()))
}

pub async fn like_post(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Data<&'static str>>), AppError> {
    let post_id = parse_id(&id)?;
    let service = PostService::new(
        state.db.clone(),
        state.storage.clone(),
        state.upload_folder.clone(),
    );
    with_deadline(REQUEST_DEADLINE, service.like(post_id, session.user_id)).await?;
    Ok((StatusCode::CREATED, Json(ok())))
}

pub async fn remove_like(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<Data<&'static str>>, AppError> {
    let post_id = parse_id(&id)?;
    let service = PostService::new(
        state.db.clone(),
        state.storage.clone(),
        state.upload_folder.clone(),
    );
    with_deadline(REQUEST_DEADLINE, service.remove_like(post_id, session.user_id)).await?;
    Ok(Json(ok()))
}

#[derive(Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(required, length(min = 1, max = 1000))]
    pub body: Option<String>,
}

pub async fn comment_post(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<String>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Data<Comment>>), AppError> {
    let post_id = parse_id(&id)?;
    let payload = json_body(payload)?;
    payload.validate()?;

    let service = PostService::new(
        state.db.clone(),
        state.storage.clone(),
        state.upload_folder.clone(),
    );
    let body = payload.body.unwrap_or_default();
    let comment = with_deadline(REQUEST_DEADLINE, service.comment(post_id, session.user_id, body)).await?;

    Ok((StatusCode::CREATED, Json(Data::new(comment))))
}

pub async fn remove_comment(
    State(state): State<AppState>,
    session: SessionUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<Json<Data<&'static str>>, AppError> {
    let post_id = parse_id(&id)?;
    let comment_id = parse_id(&comment_id)?;
    let service = PostService::new(
        state.db.clone(),
        state.storage.clone(),
        state.upload_folder.clone(),
    );
    with_deadline(
        REQUEST_DEADLINE,
        service.remove_comment(comment_id, post_id, session.user_id),
    )
    .await?;
    Ok(Json(ok()))
}

// ---------------------------------------------------------------------------
// Followers
// ---------------------------------------------------------------------------

pub async fn follow_user(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<Data<&'static str>>, AppError> {
    let user_id = parse_id(&id)?;
    let service = FollowerService::new(state.db.clone());
    with_deadline(REQUEST_DEADLINE, service.follow(user_id, session.user_id)).await?;
    Ok(Json(ok()))
}

pub async fn unfollow_user(
    State(state): State<AppState>,
    session: SessionUser,
    Path(id): Path<String>,
) -> Result<Json<Data<&'static str>>, AppError> {
    let user_id = parse_id(&id)?;
    let service = FollowerService::new(state.db.clone());
    with_deadline(REQUEST_DEADLINE, service.unfollow(user_id, session.user_id)).await?;
    Ok(Json(ok()))
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct FeedQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Parses feed pagination. `page` defaults to 1 and must be positive;
/// `limit` defaults to 20 and must lie in 10..=50.
fn parse_pagination(page: Option<&str>, limit: Option<&str>) -> Result<(i64, i64), AppError> {
    let page = match page {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::bad_request("page must be an integer"))?,
        None => DEFAULT_PAGE,
    };
    if page < 1 {
        return Err(AppError::bad_request("page must be greater than zero"));
    }

    let limit = match limit {
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::bad_request("limit must be an integer"))?,
        None => DEFAULT_LIMIT,
    };
    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::bad_request(format!(
            "limit must be between {} and {}",
            MIN_LIMIT, MAX_LIMIT
        )));
    }

    Ok((page, limit))
}

pub async fn get_feed(
    State(state): State<AppState>,
    session: SessionUser,
    query: Result<Query<FeedQuery>, QueryRejection>,
) -> Result<Json<Data<Vec<Post>>>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let (page, limit) = parse_pagination(query.page.as_deref(), query.limit.as_deref())?;

    let service = PostService::new(
        state.db.clone(),
        state.storage.clone(),
        state.upload_folder.clone(),
    );
    let posts = with_deadline(REQUEST_DEADLINE, service.get_feed(session.user_id, page, limit)).await?;
    Ok(Json(Data::new(posts)))
}
