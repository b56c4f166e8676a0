use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::app::password::Password;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip)]
    pub password: Password,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub avatar: Option<String>,
    pub activated: bool,
    pub birthdate: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Profile fields visible to anyone, returned by the username lookup.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub avatar: Option<String>,
    pub birthdate: Option<Date>,
}
