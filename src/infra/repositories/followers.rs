use crate::domain::error::{DomainError, DomainResult};
use crate::domain::social_graph::Follow;
use crate::infra::db::Db;
use crate::infra::repositories::not_found_on_fk;

#[derive(Clone)]
pub struct FollowerRepository {
    db: Db,
}

impl FollowerRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn insert(&self, follow: Follow) -> DomainResult<()> {
        let result = sqlx::query(
            "INSERT INTO followers (user_id, follower_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(follow.user_id)
        .bind(follow.follower_id)
        .execute(self.db.pool())
        .await
        .map_err(not_found_on_fk)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AlreadyFollowed);
        }
        Ok(())
    }

    pub async fn delete(&self, follow: Follow) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM followers WHERE user_id = $1 AND follower_id = $2")
            .bind(follow.user_id)
            .bind(follow.follower_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFollowed);
        }
        Ok(())
    }
}
