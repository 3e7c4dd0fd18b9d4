use std::sync::Arc;

use tracing::info;

use crate::app::{Result, TributaryError};
use crate::datetime::Clock;
use crate::domain::{Feed, NewPost};
use crate::fetcher::{validate_url, Fetcher};
use crate::store::{FeedStore, PostStore};
use crate::updater::published_at_or;

/// Adds new feeds to the store, seeded with whatever the feed serves today.
pub struct Registrar {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    feeds: Arc<dyn FeedStore + Send + Sync>,
    posts: Arc<dyn PostStore + Send + Sync>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub feed: Feed,
    pub inserted: usize,
}

impl Registrar {
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

    pub async fn add_feed(&self, url: &str) -> Result<Registration> {
        let url = url.trim();
        validate_url(url)?;

        if self.feeds.get_feed_by_url(url)?.is_some() {
            return Err(TributaryError::FeedExists(url.to_string()));
        }

        // Nothing is stored unless the feed can actually be read.
        let document = self.fetcher.fetch(url).await?;

        let mut feed = Feed::new(url.to_string());
        feed.title = document.title.clone();
        feed.description = Some(document.description.clone()).filter(|d| !d.is_empty());
        feed.language = document.language.clone().unwrap_or_default();
        feed.id = self.feeds.add_feed(&feed)?;
        info!(feed = %url, "Added feed {}", feed.display_title());

        let now = self.clock.now();
        let mut inserted = 0;
        for entry in &document.entries {
            let post = NewPost {
                feed_id: feed.id,
                feed_url: feed.url.clone(),
                title: entry.title.clone(),
                description: entry.description.clone(),
                link: entry.link.clone(),
                author: entry.author.clone(),
                published_at: published_at_or(entry.published_at.as_deref(), &entry.link, now),
            };

            match self.posts.insert_post(&post) {
                Ok(()) => inserted += 1,
                // Feeds do repeat links within one document.
                Err(TributaryError::DuplicatePost { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        self.feeds.advance_last_fetched_at(&feed.url, now)?;
        feed.last_fetched_at = Some(now);
        info!(feed = %url, inserted, "Fetched {} posts", inserted);

        Ok(Registration { feed, inserted })
    }
}
