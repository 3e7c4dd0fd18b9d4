pub mod document;
pub mod feed;
pub mod post;

pub use document::{FetchedDocument, FetchedEntry};
pub use feed::Feed;
pub use post::{NewPost, Post};
