use std::future::Future;
use std::time::Duration;

use tracing::info;

use crate::app::{AppContext, Result, TributaryError};
use crate::config::{format_interval, parse_interval};
use crate::store::FeedStore;

pub async fn add_feed(ctx: &AppContext, url: &str) -> Result<()> {
    match ctx.registrar.add_feed(url).await {
        Ok(registration) => {
            println!("Added feed: {}", registration.feed.url);
            if !registration.feed.title.is_empty() {
                println!("Feed title: {}", registration.feed.title);
            }
            println!("Fetched {} posts", registration.inserted);
            Ok(())
        }
        Err(TributaryError::FeedExists(url)) => {
            println!("Feed already exists: {}", url);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

pub async fn scrape_once(ctx: &AppContext) -> Result<()> {
    let summary = ctx.scheduler.scrape_once().await;

    if summary.selected == 0 {
        println!("No feeds to update");
        return Ok(());
    }

    println!(
        "Update complete: {} feeds, {} new posts, {} unchanged, {} errors ({:.1}s)",
        summary.selected,
        summary.inserted,
        summary.unchanged,
        summary.failed,
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}

/// Scrape on a schedule until SIGINT/SIGTERM, then stop the scheduler.
pub async fn run(ctx: &AppContext, interval: Option<&str>, skip_initial: bool) -> Result<()> {
    let interval = match interval {
        Some(raw) => Duration::from_secs(parse_interval(raw)?),
        None => ctx.config.interval(),
    };

    // Registered before the first cycle so an early signal is not lost.
    let shutdown = shutdown_signal()?;

    info!(
        "Tributary started (update interval: {}, feeds per cycle: {}, PID: {})",
        format_interval(interval.as_secs()),
        ctx.config.scraper.feeds_per_cycle,
        std::process::id()
    );

    if ctx.config.scraper.initial_scrape && !skip_initial {
        info!("Running initial scrape...");
        ctx.scheduler.scrape_once().await;
    }

    ctx.scheduler.start(interval)?;
    shutdown.await;

    info!("Shutting down...");
    ctx.scheduler.stop().await
}

#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        let _ = tokio::signal::ctrl_c().await;
    })
}

pub fn list_feeds(ctx: &AppContext) -> Result<()> {
    let feeds = ctx.store.get_all_feeds()?;

    if feeds.is_empty() {
        println!("No feeds");
        return Ok(());
    }

    for feed in feeds {
        let fetched = feed
            .last_fetched_at
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{} (last fetched: {})\n  {}",
            feed.display_title(),
            fetched,
            feed.url
        );
    }

    Ok(())
}

pub fn list_posts(ctx: &AppContext, url: &str) -> Result<()> {
    let feed = ctx
        .store
        .get_feed_by_url(url)?
        .ok_or_else(|| TributaryError::FeedNotFound(url.to_string()))?;
    let posts = ctx.store.get_posts_by_feed(feed.id)?;

    if posts.is_empty() {
        println!("No posts");
        return Ok(());
    }

    for post in posts {
        println!(
            "{} {}\n  {}",
            post.published_at.format("%Y-%m-%d"),
            post.display_title(),
            post.link
        );
    }

    Ok(())
}
