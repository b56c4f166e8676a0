use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};

use crate::domain::engagement::Comment;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::media::{Media, NewMedia};
use crate::domain::post::{Post, PostAuthor};
use crate::infra::db::Db;
use crate::infra::repositories::not_found_on_fk;

#[derive(Clone)]
pub struct PostRepository {
    db: Db,
}

impl PostRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Writes the post and all of its media rows in one transaction.
    pub async fn insert(&self, user_id: i64, body: &str, media: &[NewMedia]) -> DomainResult<Post> {
        let mut tx = self.db.pool().begin().await?;

        let row = sqlx::query(
            "WITH inserted_post AS ( \
                INSERT INTO posts (user_id, body) VALUES ($1, $2) \
                RETURNING id, user_id, body, created_at \
             ) \
             SELECT p.id, p.body, p.created_at, u.id AS author_id, u.username, u.avatar \
             FROM inserted_post p \
             JOIN users u ON u.id = p.user_id",
        )
        .bind(user_id)
        .bind(body)
        .fetch_one(&mut *tx)
        .await
        .map_err(not_found_on_fk)?;

        let post_id: i64 = row.get("id");

        if !media.is_empty() {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new("INSERT INTO post_images (post_id, url, external_ref) ");
            builder.push_values(media, |mut values, item| {
                values
                    .push_bind(post_id)
                    .push_bind(&item.url)
                    .push_bind(&item.external_ref);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;

        Ok(Post {
            id: post_id,
            user: author_from_row(&row),
            body: row.get("body"),
            media: media
                .iter()
                .map(|item| Media {
                    url: item.url.clone(),
                })
                .collect(),
            created_at: row.get("created_at"),
        })
    }

    pub async fn delete(&self, post_id: i64, user_id: i64) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::RecordNotFound);
        }
        Ok(())
    }

    pub async fn like(&self, post_id: i64, user_id: i64) -> DomainResult<()> {
        let result = sqlx::query(
            "INSERT INTO post_like (post_id, user_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(post_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await
        .map_err(not_found_on_fk)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AlreadyLiked);
        }
        Ok(())
    }

    pub async fn remove_like(&self, post_id: i64, user_id: i64) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM post_like WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotLiked);
        }
        Ok(())
    }

    pub async fn comment(&self, post_id: i64, user_id: i64, body: &str) -> DomainResult<Comment> {
        let row = sqlx::query(
            "INSERT INTO comments (post_id, user_id, body) VALUES ($1, $2, $3) \
             RETURNING id, post_id, user_id, body, created_at",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(body)
        .fetch_one(self.db.pool())
        .await
        .map_err(not_found_on_fk)?;

        Ok(Comment {
            id: row.get("id"),
            post_id: row.get("post_id"),
            user_id: row.get("user_id"),
            body: row.get("body"),
            created_at: row.get("created_at"),
        })
    }

    pub async fn remove_comment(&self, comment_id: i64, post_id: i64, user_id: i64) -> DomainResult<()> {
        let result = sqlx::query(
            "DELETE FROM comments WHERE id = $1 AND post_id = $2 AND user_id = $3",
        )
        .bind(comment_id)
        .bind(post_id)
        .bind(user_id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::RecordNotFound);
        }
        Ok(())
    }

    /// Posts by `user_id` and by everyone `user_id` follows, newest first.
    pub async fn feed(&self, user_id: i64, limit: i64, offset: i64) -> DomainResult<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT p.id, p.body, p.created_at, u.id AS author_id, u.username, u.avatar, \
                    COALESCE( \
                        array_agg(pi.url ORDER BY pi.id) FILTER (WHERE pi.id IS NOT NULL), \
                        '{}' \
                    ) AS media \
             FROM posts p \
             JOIN users u ON u.id = p.user_id \
             LEFT JOIN post_images pi ON pi.post_id = p.id \
             WHERE p.user_id = $1 \
                OR p.user_id IN (SELECT f.user_id FROM followers f WHERE f.follower_id = $1) \
             GROUP BY p.id, u.id \
             ORDER BY p.created_at DESC, p.id DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.pool())
        .await?;

        let posts = rows
            .into_iter()
            .map(|row| {
                let urls: Vec<String> = row.get("media");
                Post {
                    id: row.get("id"),
                    user: author_from_row(&row),
                    body: row.get("body"),
                    media: urls.into_iter().map(|url| Media { url }).collect(),
                    created_at: row.get("created_at"),
                }
            })
            .collect();

        Ok(posts)
    }
}

fn author_from_row(row: &PgRow) -> PostAuthor {
    PostAuthor {
        id: row.get("author_id"),
        username: row.get("username"),
        avatar: row.get("avatar"),
    }
}

