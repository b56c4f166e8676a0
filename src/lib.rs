pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;
pub mod jobs;

use crate::infra::{cache::RedisCache, db::Db, queue::QueueClient, storage::ObjectStorage};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub cache: RedisCache,
    pub storage: ObjectStorage,
    pub queue: QueueClient,
    pub session_ttl_hours: u64,
    pub auth_token_ttl_hours: u64,
    pub upload_max_bytes: usize,
    pub upload_folder: String,
    pub cookie_secure: bool,
}
