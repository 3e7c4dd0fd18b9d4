//! Merges a freshly fetched feed into the stores.

pub mod registrar;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::app::{Result, TributaryError};
use crate::datetime::{format_build_date, parse_rss_date, Clock};
use crate::domain::{Feed, FetchedDocument, NewPost};
use crate::fetcher::Fetcher;
use crate::store::{FeedStore, PostStore};

pub use registrar::{Registrar, Registration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The channel build date is not newer than our last fetch.
    Unchanged,
    /// The document had no entries.
    Empty,
    Updated { inserted: usize, skipped: usize },
}

pub struct UpdateEngine {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    feeds: Arc<dyn FeedStore + Send + Sync>,
    posts: Arc<dyn PostStore + Send + Sync>,
    clock: Arc<dyn Clock>,
}

impl UpdateEngine {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        feeds: Arc<dyn FeedStore + Send + Sync>,
        posts: Arc<dyn PostStore + Send + Sync>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fetcher,
            feeds,
            posts,
            clock,
        }
    }

    /// Fetch `feed` and store entries not seen before.
    ///
    /// The last-fetch timestamp moves only once every new entry has been
    /// written. If an insert fails, the entries before it stay stored and
    /// the next cycle retries the rest.
    pub async fn update(&self, feed: &Feed) -> Result<UpdateOutcome> {
        let stored = self
            .feeds
            .get_feed_by_url(&feed.url)?
            .ok_or_else(|| TributaryError::FeedNotFound(feed.url.clone()))?;

        let document = self.fetcher.fetch(&stored.url).await?;

        if !has_newer_build(&stored, &document) {
            info!(feed = %stored.url, "No new updates for feed");
            return Ok(UpdateOutcome::Unchanged);
        }

        if document.entries.is_empty() {
            info!(feed = %stored.url, "No items found in feed");
            return Ok(UpdateOutcome::Empty);
        }

        let known = self.posts.known_links(stored.id)?;
        let mut inserted = 0;
        let mut skipped = 0;

        for entry in &document.entries {
            if known.contains(&entry.link) {
                skipped += 1;
                continue;
            }

            let post = NewPost {
                feed_id: stored.id,
                feed_url: stored.url.clone(),
                title: entry.title.clone(),
                description: entry.description.clone(),
                link: entry.link.clone(),
                author: entry.author.clone(),
                published_at: published_at_or(
                    entry.published_at.as_deref(),
                    &entry.link,
                    self.clock.now(),
                ),
            };

            match self.posts.insert_post(&post) {
                Ok(()) => inserted += 1,
                // Another writer stored it since `known_links` was read.
                Err(TributaryError::DuplicatePost { .. }) => {
                    debug!(feed = %stored.url, link = %entry.link, "Post already exists");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        self.feeds
            .advance_last_fetched_at(&stored.url, self.clock.now())?;

        info!(
            feed = %stored.url,
            inserted,
            skipped,
            "Updated feed {}",
            document.title
        );
        Ok(UpdateOutcome::Updated { inserted, skipped })
    }
}

/// Entry date in UTC, or `now` when it is missing or unreadable.
fn published_at_or(raw: Option<&str>, link: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    match raw.map(str::trim) {
        None | Some("") => now,
        Some(text) => parse_rss_date(text).unwrap_or_else(|e| {
            warn!(link = %link, error = %e, "Falling back to current time");
            now
        }),
    }
}

/// Cheap freshness check on the raw build-date text.
///
/// The stored side is the last fetch time rendered in RSS date style, and the
/// comparison is lexical, not chronological. A feed that was never fetched,
/// or a channel without `lastBuildDate`, always counts as newer.
fn has_newer_build(stored: &Feed, document: &FetchedDocument) -> bool {
    match (&stored.last_fetched_at, document.last_build_date.as_deref()) {
        (Some(last_fetched_at), Some(fetched)) if !fetched.is_empty() => {
            is_lexically_newer(&format_build_date(last_fetched_at), fetched)
        }
        _ => true,
    }
}

fn is_lexically_newer(stored_build_date: &str, fetched_build_date: &str) -> bool {
    fetched_build_date > stored_build_date
}
