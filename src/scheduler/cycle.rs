//! One scrape cycle over a bounded worker pool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::app::{Result, TributaryError};
use crate::domain::Feed;
use crate::store::FeedStore;
use crate::updater::{UpdateEngine, UpdateOutcome};

pub const DEFAULT_FEEDS_PER_CYCLE: usize = 10;

/// What one cycle did, tallied by the coordinator after all workers joined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub selected: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub empty: usize,
    pub failed: usize,
    pub inserted: usize,
    pub elapsed: Duration,
}

impl CycleSummary {
    fn record(&mut self, feed: &Feed, result: Result<UpdateOutcome>) {
        match result {
            Ok(UpdateOutcome::Updated { inserted, .. }) => {
                self.updated += 1;
                self.inserted += inserted;
                if inserted > 0 {
                    info!(feed = %feed.url, "{} new posts from {}", inserted, feed.display_title());
                }
            }
            Ok(UpdateOutcome::Unchanged) => self.unchanged += 1,
            Ok(UpdateOutcome::Empty) => self.empty += 1,
            Err(e) => {
                self.failed += 1;
                warn!(
                    feed = %feed.url,
                    error = %e,
                    retryable = e.is_retryable(),
                    "Error updating {}",
                    feed.display_title()
                );
            }
        }
    }
}

/// Runs one scrape cycle: pick the stalest feeds and update them through a
/// bounded worker pool.
pub struct CycleRunner {
    engine: Arc<UpdateEngine>,
    feeds: Arc<dyn FeedStore + Send + Sync>,
    batch_size: usize,
    semaphore: Arc<Semaphore>,
}

impl CycleRunner {
    /// `feeds_per_cycle` is both the batch size and the worker pool size.
    pub fn new(
        engine: Arc<UpdateEngine>,
        feeds: Arc<dyn FeedStore + Send + Sync>,
        feeds_per_cycle: usize,
    ) -> Self {
        Self::with_workers(engine, feeds, feeds_per_cycle, feeds_per_cycle)
    }

    pub(crate) fn with_workers(
        engine: Arc<UpdateEngine>,
        feeds: Arc<dyn FeedStore + Send + Sync>,
        batch_size: usize,
        workers: usize,
    ) -> Self {
        Self {
            engine,
            feeds,
            batch_size,
            semaphore: Arc::new(Semaphore::new(workers)),
        }
    }

    pub async fn run(&self) -> CycleSummary {
        let start = Instant::now();
        let mut summary = CycleSummary::default();

        let feeds = match self.feeds.select_least_recently_fetched(self.batch_size) {
            Ok(feeds) => feeds,
            Err(e) => {
                error!(error = %e, "Failed to select feeds");
                summary.elapsed = start.elapsed();
                return summary;
            }
        };

        if feeds.is_empty() {
            info!("No feeds to update");
            summary.elapsed = start.elapsed();
            return summary;
        }

        summary.selected = feeds.len();
        info!(feeds = feeds.len(), "Starting scrape cycle");

        let handles = feeds.into_iter().map(|feed| {
            let engine = self.engine.clone();
            let semaphore = self.semaphore.clone();

            tokio::spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => engine.update(&feed).await,
                    Err(e) => Err(TributaryError::Scheduler(format!(
                        "worker pool closed: {}",
                        e
                    ))),
                };
                (feed, result)
            })
        });

        for joined in join_all(handles).await {
            match joined {
                Ok((feed, result)) => summary.record(&feed, result),
                Err(e) => {
                    summary.failed += 1;
                    error!("Task join error: {}", e);
                }
            }
        }

        summary.elapsed = start.elapsed();
        info!(
            selected = summary.selected,
            updated = summary.updated,
            unchanged = summary.unchanged,
            empty = summary.empty,
            "Update complete: {} new posts, {} errors ({:.1}s)",
            summary.inserted,
            summary.failed,
            summary.elapsed.as_secs_f64()
        );

        summary
    }
}
