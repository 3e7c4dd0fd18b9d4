use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A stored entry of a feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub feed_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub link: String,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Insert request for a post that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub feed_id: i64,
    pub feed_url: String,
    pub title: String,
    pub description: Option<String>,
    pub link: String,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
}

impl NewPost {
    /// Deterministic ID from the owning feed's URL and the post link.
    pub fn id(&self) -> String {
        generate_id(&self.feed_url, &self.link)
    }
}

pub fn generate_id(feed_url: &str, link: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(feed_url.as_bytes());
    hasher.update(link.as_bytes());
    hex::encode(hasher.finalize())
}

impl Post {
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}
