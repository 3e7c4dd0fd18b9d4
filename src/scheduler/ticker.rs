//! Tick sources for the scheduler loop.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Longest accepted scrape interval.
pub const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Source of "run a cycle now" events for the scheduler loop.
#[async_trait]
pub trait Ticker: Send {
    async fn tick(&mut self);
}

/// Fires every `period`, starting one period from now.
pub struct IntervalTicker {
    inner: Interval,
}

impl IntervalTicker {
    /// `period` is clamped to [`MAX_PERIOD`].
    pub fn new(period: Duration) -> Self {
        let period = period.min(MAX_PERIOD);
        // Skip the immediate tick; the initial scrape is a separate step.
        let mut inner = interval_at(Instant::now() + period, period);
        inner.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { inner }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.inner.tick().await;
    }
}

/// Fires once per message. Never fires again once every sender is gone.
pub struct ChannelTicker {
    rx: mpsc::Receiver<()>,
}

impl ChannelTicker {
    pub fn new(rx: mpsc::Receiver<()>) -> Self {
        Self { rx }
    }

    pub fn channel(buffer: usize) -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl Ticker for ChannelTicker {
    async fn tick(&mut self) {
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}
