pub mod sqlite;

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::{Feed, NewPost};

pub use sqlite::SqliteStore;

/// Feed metadata shared by every worker of a cycle.
pub trait FeedStore {
    /// Register a feed; fails with `FeedExists` when the URL is taken.
    fn add_feed(&self, feed: &Feed) -> Result<i64>;
    /// Up to `limit` feeds, never-fetched first, then oldest fetch first.
    fn select_least_recently_fetched(&self, limit: usize) -> Result<Vec<Feed>>;
    fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>>;
    /// Move the last-fetch timestamp forward to `at`. Never moves it back.
    fn advance_last_fetched_at(&self, url: &str, at: DateTime<Utc>) -> Result<()>;
}

/// Ingested posts, unique per `(feed_id, link)`.
pub trait PostStore {
    fn known_links(&self, feed_id: i64) -> Result<HashSet<String>>;
    /// Fails with `DuplicatePost` when the link is already stored for the feed.
    fn insert_post(&self, post: &NewPost) -> Result<()>;
}
