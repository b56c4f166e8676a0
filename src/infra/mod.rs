pub mod cache;
pub mod db;
pub mod mailer;
pub mod queue;
pub mod repositories;
pub mod storage;
