pub mod followers;
pub mod posts;
pub mod users;

use crate::domain::error::DomainError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Name of the unique constraint a failed statement tripped over, if any.
pub(crate) fn unique_violation(err: &sqlx::Error) -> Option<String> {
    let db_err = err.as_database_error()?;
    if db_err.code().as_deref() != Some(UNIQUE_VIOLATION) {
        return None;
    }
    Some(db_err.constraint().unwrap_or_default().to_string())
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code == FOREIGN_KEY_VIOLATION)
        .unwrap_or(false)
}

/// Maps a foreign-key violation (the referenced row is gone) to
/// `RecordNotFound`; everything else goes through the usual conversion.
pub(crate) fn not_found_on_fk(err: sqlx::Error) -> DomainError {
    if is_foreign_key_violation(&err) {
        DomainError::RecordNotFound
    } else {
        DomainError::from(err)
    }
}
