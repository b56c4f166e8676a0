/// Directed follow edge: `follower_id` follows `user_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Follow {
    pub user_id: i64,
    pub follower_id: i64,
}

impl Follow {
    pub fn is_self_follow(&self) -> bool {
        self.user_id == self.follower_id
    }
}
