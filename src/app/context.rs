use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, TributaryError};
use crate::config::{Config, ConfigError};
use crate::datetime::{Clock, SystemClock};
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::scheduler::Scheduler;
use crate::store::sqlite::SqliteStore;
use crate::updater::{Registrar, UpdateEngine};

/// Wires the store, fetcher, engine and scheduler together.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub engine: Arc<UpdateEngine>,
    pub registrar: Registrar,
    pub scheduler: Scheduler,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match &config.storage.database_path {
            Some(p) => p.clone(),
            None => Self::default_db_path()?,
        };
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new()?);
        Self::assemble(config, store, fetcher)
    }

    pub fn in_memory(config: Config, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::assemble(config, store, fetcher)
    }

    fn assemble(
        config: Config,
        store: Arc<SqliteStore>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let engine = Arc::new(UpdateEngine::new(
            fetcher.clone(),
            store.clone(),
            store.clone(),
            clock.clone(),
        ));
        let registrar = Registrar::new(fetcher.clone(), store.clone(), store.clone(), clock);
        let scheduler = Scheduler::new(
            engine.clone(),
            store.clone(),
            config.scraper.feeds_per_cycle,
        )?;

        Ok(Self {
            config,
            store,
            fetcher,
            engine,
            registrar,
            scheduler,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir().ok_or(TributaryError::Config(ConfigError::Invalid {
            key: "storage.database_path".into(),
            message: "could not find data directory".into(),
        }))?;
        Ok(data_dir.join("tributary").join("tributary.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::SchedulerState;
    use crate::store::FeedStore;
    use crate::updater::tests::{document, entry, StubFetcher};

    #[tokio::test]
    async fn test_context_registers_then_scrapes() {
        let fetcher = Arc::new(StubFetcher::default());
        let url = "https://example.com/feed.xml";
        fetcher.serve(url, document(None, vec![entry("https://example.com/1", None)]));

        let ctx = AppContext::in_memory(Config::default(), fetcher.clone()).unwrap();
        ctx.registrar.add_feed(url).await.unwrap();

        fetcher.serve(
            url,
            document(
                None,
                vec![
                    entry("https://example.com/1", None),
                    entry("https://example.com/2", None),
                ],
            ),
        );
        let summary = ctx.scheduler.scrape_once().await;

        assert_eq!(summary.selected, 1);
        assert_eq!(summary.inserted, 1);
        let feed = ctx.store.get_feed_by_url(url).unwrap().unwrap();
        assert_eq!(ctx.store.get_posts_by_feed(feed.id).unwrap().len(), 2);
        assert_eq!(ctx.scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_on_disk_store_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.database_path = Some(dir.path().join("nested").join("t.db"));

        let ctx = AppContext::new(config).unwrap();

        assert!(ctx.store.get_all_feeds().unwrap().is_empty());
        assert!(dir.path().join("nested").join("t.db").exists());
    }
}
