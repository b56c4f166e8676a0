pub mod password;
pub mod posts;
pub mod social;
pub mod users;
