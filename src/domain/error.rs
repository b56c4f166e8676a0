use thiserror::Error;

/// Failure categories shared by repositories and services. Handlers pick a
/// status code and a user-facing message from the variant.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("record not found")]
    RecordNotFound,

    #[error("edit conflict")]
    EditConflict,

    #[error("duplicate email")]
    DuplicateEmail,

    #[error("duplicate username")]
    DuplicateUsername,

    #[error("file upload has failed")]
    UploadFailed,

    #[error("already followed")]
    AlreadyFollowed,

    #[error("not followed")]
    NotFollowed,

    #[error("cannot follow yourself")]
    CannotFollowYourself,

    #[error("already liked")]
    AlreadyLiked,

    #[error("not liked")]
    NotLiked,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DomainError::RecordNotFound,
            other => DomainError::Other(other.into()),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
