//! Periodic scrape loop.
//!
//! A [`Scheduler`] owns one background task that waits on a [`Ticker`] and
//! runs a [`CycleRunner`] cycle per tick. Cycles never overlap: the next tick
//! is awaited only after the current cycle has joined every worker.

pub mod cycle;
pub mod ticker;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::{Result, TributaryError};
use crate::store::FeedStore;
use crate::updater::UpdateEngine;

pub use cycle::{CycleRunner, CycleSummary, DEFAULT_FEEDS_PER_CYCLE};
pub use ticker::{ChannelTicker, IntervalTicker, Ticker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

struct Lifecycle {
    state: SchedulerState,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

pub struct Scheduler {
    runner: Arc<CycleRunner>,
    lifecycle: Mutex<Lifecycle>,
    /// Flips to `true` once the loop has exited.
    stopped: watch::Sender<bool>,
}

impl Scheduler {
    pub fn new(
        engine: Arc<UpdateEngine>,
        feeds: Arc<dyn FeedStore + Send + Sync>,
        feeds_per_cycle: usize,
    ) -> Result<Self> {
        if feeds_per_cycle == 0 {
            return Err(TributaryError::Scheduler(
                "feeds per cycle must be greater than zero".into(),
            ));
        }

        let (stopped, _) = watch::channel(false);
        Ok(Self {
            runner: Arc::new(CycleRunner::new(engine, feeds, feeds_per_cycle)),
            lifecycle: Mutex::new(Lifecycle {
                state: SchedulerState::Idle,
                shutdown: None,
                handle: None,
            }),
            stopped,
        })
    }

    pub fn state(&self) -> SchedulerState {
        self.lifecycle
            .lock()
            .map(|l| l.state)
            .unwrap_or_else(|poisoned| poisoned.into_inner().state)
    }

    /// Start cycling every `interval`, first cycle one interval from now.
    pub fn start(&self, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(TributaryError::Scheduler(
                "interval must be greater than zero".into(),
            ));
        }
        self.start_with_ticker(IntervalTicker::new(interval))
    }

    pub fn start_with_ticker<T: Ticker + 'static>(&self, ticker: T) -> Result<()> {
        let mut lifecycle = self.lifecycle()?;
        if lifecycle.state != SchedulerState::Idle {
            return Err(TributaryError::Scheduler(format!(
                "scheduler cannot start from state {:?}",
                lifecycle.state
            )));
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_loop(
            self.runner.clone(),
            Box::new(ticker),
            shutdown_rx,
        ));

        lifecycle.shutdown = Some(shutdown_tx);
        lifecycle.handle = Some(handle);
        lifecycle.state = SchedulerState::Running;
        info!("Scheduler started");
        Ok(())
    }

    /// Run one cycle right away, outside the ticker.
    pub async fn scrape_once(&self) -> CycleSummary {
        self.runner.run().await
    }

    /// Signal the loop and wait for it to exit, including any cycle in flight.
    ///
    /// Concurrent callers all wait for the same exit. Returns immediately if
    /// the scheduler never started or already stopped.
    pub async fn stop(&self) -> Result<()> {
        let (shutdown, handle) = {
            let mut lifecycle = self.lifecycle()?;
            match lifecycle.state {
                SchedulerState::Idle | SchedulerState::Stopped => return Ok(()),
                SchedulerState::Stopping => (None, None),
                SchedulerState::Running => {
                    lifecycle.state = SchedulerState::Stopping;
                    (lifecycle.shutdown.take(), lifecycle.handle.take())
                }
            }
        };

        let Some(handle) = handle else {
            let mut stopped = self.stopped.subscribe();
            // The sender lives in `self`, so this only ends on exit.
            let _ = stopped.wait_for(|done| *done).await;
            return Ok(());
        };

        if let Some(shutdown) = shutdown {
            // The loop may already be gone; nothing to signal then.
            let _ = shutdown.send(());
        }
        if let Err(e) = handle.await {
            error!("Scheduler loop join error: {}", e);
        }

        self.lifecycle()?.state = SchedulerState::Stopped;
        self.stopped.send_replace(true);
        info!("Scheduler stopped");
        Ok(())
    }

    fn lifecycle(&self) -> Result<MutexGuard<'_, Lifecycle>> {
        self.lifecycle
            .lock()
            .map_err(|e| TributaryError::LockPoisoned(e.to_string()))
    }
}

async fn run_loop(
    runner: Arc<CycleRunner>,
    mut ticker: Box<dyn Ticker>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                info!("Running scheduled update");
                runner.run().await;
            }
        }
    }
    info!("Scheduler loop exiting");
}
