use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::app::password::Password;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::user::{PublicUser, User};
use crate::infra::db::Db;
use crate::infra::repositories::unique_violation;

/// Fields persisted at signup. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct UserInsert {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

#[derive(Clone)]
pub struct UserRepository {
    db: Db,
}

impl UserRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn insert(&self, user: &UserInsert) -> DomainResult<User> {
        let row = sqlx::query(
            "INSERT INTO users (email, password_hash, first_name, last_name, username, activated) \
             VALUES ($1, $2, $3, $4, $5, FALSE) \
             RETURNING id, email, password_hash, first_name, last_name, username, avatar, \
                       birthdate, activated, created_at",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .fetch_one(self.db.pool())
        .await
        .map_err(|err| match unique_violation(&err).as_deref() {
            Some("users_email_key") => DomainError::DuplicateEmail,
            Some("users_username_key") => DomainError::DuplicateUsername,
            _ => DomainError::from(err),
        })?;

        Ok(user_from_row(&row, true))
    }

    pub async fn email_exists(&self, email: &str) -> DomainResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(self.db.pool())
            .await?;
        Ok(exists)
    }

    pub async fn username_exists(&self, username: &str) -> DomainResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(self.db.pool())
                .await?;
        Ok(exists)
    }

    pub async fn exists(&self, id: i64) -> DomainResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(exists)
    }

    /// Includes the password hash; used by login.
    pub async fn find_by_email(&self, email: &str) -> DomainResult<User> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, first_name, last_name, username, avatar, \
                    birthdate, activated, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(self.db.pool())
        .await?;

        Ok(user_from_row(&row, true))
    }

    pub async fn find_by_username(&self, username: &str) -> DomainResult<PublicUser> {
        let row = sqlx::query(
            "SELECT id, first_name, last_name, username, avatar, birthdate \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_one(self.db.pool())
        .await?;

        Ok(PublicUser {
            id: row.get("id"),
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            username: row.get("username"),
            avatar: row.get("avatar"),
            birthdate: row.get("birthdate"),
        })
    }

    pub async fn find_by_id(&self, id: i64) -> DomainResult<User> {
        let row = sqlx::query(
            "SELECT id, email, first_name, last_name, username, avatar, \
                    birthdate, activated, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(user_from_row(&row, false))
    }
}

fn user_from_row(row: &PgRow, with_hash: bool) -> User {
    let password = if with_hash {
        Password::from_hash(row.get("password_hash"))
    } else {
        Password::default()
    };

    User {
        id: row.get("id"),
        email: row.get("email"),
        password,
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        username: row.get("username"),
        avatar: row.get("avatar"),
        activated: row.get("activated"),
        birthdate: row.get("birthdate"),
        created_at: row.get("created_at"),
    }
}
