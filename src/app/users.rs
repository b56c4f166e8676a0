use tracing::info;

use crate::app::password::hash_password;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::user::{PublicUser, User};
use crate::infra::db::Db;
use crate::infra::queue::{QueueClient, VerifyEmailPayload};
use crate::infra::repositories::users::{UserInsert, UserRepository};

/// Signup input with the plaintext password.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
    queue: QueueClient,
}

impl UserService {
    pub fn new(db: Db, queue: QueueClient) -> Self {
        Self {
            users: UserRepository::new(db),
            queue,
        }
    }

    /// Registers an inactive account and publishes its verification task.
    /// The pre-checks give friendly errors; the unique constraints still
    /// decide races between concurrent signups.
    pub async fn create(&self, new_user: NewUser) -> DomainResult<User> {
        if self.users.email_exists(&new_user.email).await? {
            return Err(DomainError::DuplicateEmail);
        }
        if self.users.username_exists(&new_user.username).await? {
            return Err(DomainError::DuplicateUsername);
        }

        let password_hash = hash_password(&new_user.password)?;
        let user = self
            .users
            .insert(&UserInsert {
                email: new_user.email,
                password_hash,
                first_name: new_user.first_name,
                last_name: new_user.last_name,
                username: new_user.username,
            })
            .await?;

        self.queue
            .send_verify_email_task(&VerifyEmailPayload {
                username: user.username.clone(),
                email: user.email.clone(),
            })
            .await?;

        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> DomainResult<User> {
        self.users.find_by_email(email).await
    }

    pub async fn find_by_username(&self, username: &str) -> DomainResult<PublicUser> {
        self.users.find_by_username(username).await
    }

    pub async fn find_by_id(&self, id: i64) -> DomainResult<User> {
        self.users.find_by_id(id).await
    }

    pub fn check_password(&self, user: &User, candidate: &str) -> DomainResult<bool> {
        Ok(user.password.matches(candidate)?)
    }
}
