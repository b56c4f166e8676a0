use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::media::Media;

#[derive(Debug, Clone, Serialize)]
pub struct PostAuthor {
    pub id: i64,
    pub username: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    pub user: PostAuthor,
    pub body: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<Media>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
