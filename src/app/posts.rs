use tracing::{error, warn};

use crate::domain::engagement::Comment;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::media::NewMedia;
use crate::domain::post::Post;
use crate::infra::db::Db;
use crate::infra::repositories::posts::PostRepository;
use crate::infra::storage::{ObjectStorage, UploadFile};

#[derive(Clone)]
pub struct PostService {
    posts: PostRepository,
    storage: ObjectStorage,
    upload_folder: String,
}

impl PostService {
    pub fn new(db: Db, storage: ObjectStorage, upload_folder: String) -> Self {
        Self {
            posts: PostRepository::new(db),
            storage,
            upload_folder,
        }
    }

    /// Uploads `files` one after another, then persists the post with its
    /// media. Objects already uploaded are removed again if a later upload or
    /// the insert fails.
    pub async fn create_post(&self, files: Vec<UploadFile>, body: String, user_id: i64) -> DomainResult<Post> {
        let mut media = Vec::with_capacity(files.len());
        for file in &files {
            match self.storage.upload(&self.upload_folder, file).await {
                Ok(uploaded) => media.push(NewMedia {
                    url: uploaded.public_link,
                    external_ref: uploaded.external_ref,
                }),
                Err(err) => {
                    error!(error = ?err, user_id = %user_id, file_name = ?file.file_name, "failed to upload post media");
                    self.discard_uploads(&media).await;
                    return Err(DomainError::UploadFailed);
                }
            }
        }

        match self.posts.insert(user_id, &body, &media).await {
            Ok(post) => Ok(post),
            Err(err) => {
                self.discard_uploads(&media).await;
                Err(err)
            }
        }
    }

    async fn discard_uploads(&self, media: &[NewMedia]) {
        for item in media {
            if let Err(err) = self.storage.delete(&item.external_ref).await {
                warn!(error = ?err, key = %item.external_ref, "failed to delete orphaned upload");
            }
        }
    }

    pub async fn delete_post(&self, post_id: i64, user_id: i64) -> DomainResult<()> {
        self.posts.delete(post_id, user_id).await
    }

    pub async fn like(&self, post_id: i64, user_id: i64) -> DomainResult<()> {
        self.posts.like(post_id, user_id).await
    }

    pub async fn remove_like(&self, post_id: i64, user_id: i64) -> DomainResult<()> {
        self.posts.remove_like(post_id, user_id).await
    }

    pub async fn comment(&self, post_id: i64, user_id: i64, body: String) -> DomainResult<Comment> {
        self.posts.comment(post_id, user_id, &body).await
    }

    pub async fn remove_comment(&self, comment_id: i64, post_id: i64, user_id: i64) -> DomainResult<()> {
        self.posts.remove_comment(comment_id, post_id, user_id).await
    }

    /// `page` is 1-based. Inputs are validated by the caller.
    pub async fn get_feed(&self, user_id: i64, page: i64, limit: i64) -> DomainResult<Vec<Post>> {
        self.posts.feed(user_id, limit, feed_offset(page, limit)).await
    }
}

fn feed_offset(page: i64, limit: i64) -> i64 {
    (page - 1) * limit
}
