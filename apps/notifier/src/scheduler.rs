//! Daily scheduler for due-date notices

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::{client::ClientError, dispatcher::NoticeDispatcher};

/// Source of the addresses that need a notice.
#[async_trait]
pub trait NoticeSource: Send + Sync {
    async fn fetch_notices(&self) -> Result<Vec<String>, ClientError>;
}

/// Outcome of a single notice run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Addresses returned by the server
    pub found: usize,
    /// Addresses the dispatcher accepted
    pub delivered: usize,
}

/// Returns the first midnight strictly after `now` in `now`'s time zone.
///
/// Falls back to `now + 24h` when that midnight does not exist locally.
pub fn next_run_after<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    now.date_naive()
        .succ_opt()
        .and_then(|day| {
            now.timezone()
                .from_local_datetime(&day.and_time(NaiveTime::MIN))
                .earliest()
        })
        .unwrap_or_else(|| now.clone() + TimeDelta::days(1))
}

/// Returns the first midnight after both `previous` and `now`.
pub fn following_run<Tz: TimeZone>(previous: &DateTime<Tz>, now: &DateTime<Tz>) -> DateTime<Tz> {
    if now > previous {
        next_run_after(now)
    } else {
        next_run_after(previous)
    }
}

/// Notice scheduler: one run at start-up, then one run every midnight
pub struct NoticeScheduler<S, D> {
    /// Where due-soon addresses come from
    source: S,
    /// Where notices go
    dispatcher: D,
    /// Whether to run before waiting for the first midnight
    run_on_startup: bool,
    /// Shutdown signal receiver
    shutdown_rx: watch::Receiver<bool>,
}

impl<S: NoticeSource, D: NoticeDispatcher> NoticeScheduler<S, D> {
    /// Create a new notice scheduler
    pub fn new(source: S, dispatcher: D, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            source,
            dispatcher,
            run_on_startup: true,
            shutdown_rx,
        }
    }

    /// Sets whether a run happens immediately on start-up.
    pub fn with_run_on_startup(mut self, run_on_startup: bool) -> Self {
        self.run_on_startup = run_on_startup;
        self
    }

    /// Run the scheduler until shutdown is signalled
    pub async fn run(mut self) {
        info!(run_on_startup = self.run_on_startup, "Starting notice scheduler");

        if *self.shutdown_rx.borrow() {
            return;
        }
        if self.run_on_startup {
            self.run_once().await;
        }

        let mut next = next_run_after(&Local::now());
        loop {
            let delay = next
                .clone()
                .signed_duration_since(Local::now())
                .to_std()
                .unwrap_or(Duration::ZERO);

            debug!(next_run = %next, delay_secs = delay.as_secs(), "Next notice run scheduled");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    self.run_once().await;
                    next = following_run(&next, &Local::now());
                }

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("Notice scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// Fetch due-soon addresses and dispatch a notice to each one.
    ///
    /// Failures are logged; the scheduler keeps its cadence regardless.
    pub async fn run_once(&self) -> RunReport {
        let emails = match self.source.fetch_notices().await {
            Ok(emails) => emails,
            Err(e) => {
                error!(error = %e, "Failed to fetch due-date notices");
                return RunReport::default();
            }
        };

        info!(count = emails.len(), "Fetched due-date notices");

        let mut report = RunReport {
            found: emails.len(),
            delivered: 0,
        };
        for email in &emails {
            match self.dispatcher.dispatch(email).await {
                Ok(()) => report.delivered += 1,
                Err(e) => warn!(error = %e, "Failed to dispatch notice"),
            }
        }

        report
    }
}
