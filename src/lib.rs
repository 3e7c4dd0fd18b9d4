//! # Tributary
//!
//! A periodic RSS scraper that merges only new entries into a local store.
//!
//! ## Architecture
//!
//! Tributary follows a pipeline architecture driven by a scheduler:
//!
//! ```text
//! Scheduler → worker pool → Fetcher → Normalizer → Update Engine → Store
//! ```
//!
//! Each cycle picks the feeds that were fetched least recently, updates them
//! through a bounded pool, and records per-feed outcomes in a summary.
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a feed
//! tributary add https://blog.rust-lang.org/feed.xml
//!
//! # Scrape every 30 minutes until Ctrl-C
//! tributary run --interval 30m
//!
//! # One cycle, then exit
//! tributary once
//!
//! # List feeds, or the posts of one feed
//! tributary list
//! tributary list --posts https://blog.rust-lang.org/feed.xml
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// store, fetcher, update engine, scheduler.
pub mod app;

/// Command-line interface using clap.
///
/// - `run [--interval 1h]` - Scrape on a schedule until interrupted
/// - `once` - Run one cycle
/// - `add <url>` - Add a new feed
/// - `list [--posts <url>]` - List feeds or posts
pub mod cli;

/// Layered configuration: defaults, TOML file, `.env` and environment.
pub mod config;

/// RSS date parsing and the injectable [`Clock`](datetime::Clock).
pub mod datetime;

/// Core domain models.
///
/// - [`Feed`](domain::Feed): Feed metadata and last-fetch time
/// - [`Post`](domain::Post): Stored entries with SHA256 IDs
/// - [`FetchedDocument`](domain::FetchedDocument): A parsed channel before merging
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

pub mod logging;

/// RSS 2.0 parsing into [`FetchedDocument`](domain::FetchedDocument).
pub mod normalizer;

/// Scrape loop and bounded worker pool.
pub mod scheduler;

/// SQLite persistence layer.
///
/// - [`FeedStore`](store::FeedStore) and [`PostStore`](store::PostStore): storage contracts
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Merging fetched entries into the stores, and feed registration.
pub mod updater;
