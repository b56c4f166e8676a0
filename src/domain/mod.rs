pub mod engagement;
pub mod error;
pub mod media;
pub mod post;
pub mod session;
pub mod social_graph;
pub mod user;
