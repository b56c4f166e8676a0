use serde::Serialize;

/// An image attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Media {
    pub url: String,
}

/// Media row as written alongside a new post. `external_ref` is the object
/// store reference used to delete the remote file.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub url: String,
    pub external_ref: String,
}
