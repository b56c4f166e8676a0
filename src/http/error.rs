use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::domain::error::DomainError;

const NOT_FOUND_MESSAGE: &str = "the requested resource was not found";
const INTERNAL_MESSAGE: &str = "the server encountered a problem and could not process your request";

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    body: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub key: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ErrorBody {
    Message(String),
    Fields(Vec<FieldError>),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
    code: u16,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody::Message(message.into()),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_IMPLEMENTED, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }

    pub fn invalid_credentials() -> Self {
        Self::forbidden("invalid credentials")
    }

    pub fn validation(fields: Vec<FieldError>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: ErrorBody::Fields(fields),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.body,
            code: self.status.as_u16(),
        });
        (self.status, body).into_response()
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::RecordNotFound => AppError::not_found(),
            DomainError::EditConflict => {
                AppError::conflict("unable to update the record due to an edit conflict, please try again")
            }
            DomainError::DuplicateEmail
            | DomainError::DuplicateUsername
            | DomainError::UploadFailed
            | DomainError::AlreadyFollowed
            | DomainError::NotFollowed
            | DomainError::CannotFollowYourself
            | DomainError::AlreadyLiked
            | DomainError::NotLiked => AppError::bad_request(err.to_string()),
            DomainError::Other(err) => {
                tracing::error!(error = ?err, "unhandled service error");
                AppError::internal()
            }
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::validation(field_errors(&errors))
    }
}

/// Flattens validator output into `{key, message}` pairs, sorted by key so
/// responses are stable.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields = Vec::new();
    for (key, kind) in errors.errors() {
        if let ValidationErrorsKind::Field(errors) = kind {
            for error in errors {
                fields.push(FieldError {
                    key: key.to_string(),
                    message: field_message(error),
                });
            }
        }
    }
    fields.sort_by(|a, b| a.key.cmp(&b.key));
    fields
}

fn field_message(error: &validator::ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    let param = |name: &str| {
        error
            .params
            .get(name)
            .map(|value| value.to_string())
            .unwrap_or_default()
    };
    match &*error.code {
        "required" => "This field is required".to_string(),
        "email" => "Invalid email".to_string(),
        "length" if error.params.contains_key("min") && !error.params.contains_key("max") => {
            format!("This field must be at least {} characters long", param("min"))
        }
        "length" if error.params.contains_key("max") && !error.params.contains_key("min") => {
            format!("This field must be at most {} characters long", param("max"))
        }
        "length" => format!(
            "This field must be between {} and {} characters long",
            param("min"),
            param("max")
        ),
        other => format!("This field is invalid ({})", other),
    }
}
