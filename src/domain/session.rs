use serde::{Deserialize, Serialize};

/// Value stored in the cache under a session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i64,
}
