use crate::domain::error::{DomainError, DomainResult};
use crate::domain::social_graph::Follow;
use crate::infra::db::Db;
use crate::infra::repositories::followers::FollowerRepository;
use crate::infra::repositories::users::UserRepository;

#[derive(Clone)]
pub struct FollowerService {
    followers: FollowerRepository,
    users: UserRepository,
}

impl FollowerService {
    pub fn new(db: Db) -> Self {
        Self {
            followers: FollowerRepository::new(db.clone()),
            users: UserRepository::new(db),
        }
    }

    /// `follower_id` starts following `user_id`.
    pub async fn follow(&self, user_id: i64, follower_id: i64) -> DomainResult<()> {
        let follow = self.checked_edge(user_id, follower_id).await?;
        self.followers.insert(follow).await
    }

    pub async fn unfollow(&self, user_id: i64, follower_id: i64) -> DomainResult<()> {
        let follow = self.checked_edge(user_id, follower_id).await?;
        self.followers.delete(follow).await
    }

    async fn checked_edge(&self, user_id: i64, follower_id: i64) -> DomainResult<Follow> {
        let follow = Follow {
            user_id,
            follower_id,
        };
        if follow.is_self_follow() {
            return Err(DomainError::CannotFollowYourself);
        }
        if !self.users.exists(user_id).await? {
            return Err(DomainError::RecordNotFound);
        }
        Ok(follow)
    }
}
