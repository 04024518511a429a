//! Timers that drive conversions
//!
//! [`Debouncer`] delays amount-edit conversions until input goes quiet.
//! [`RefreshScheduler`] owns the periodic forced refresh and the
//! "last updated" tick. Neither ever fails; outcomes reach the
//! presentation port through the converter.

use crate::converter::CurrencyConverter;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

/// Runs the most recently scheduled action once a quiet period has passed
///
/// Scheduling again before the delay elapses cancels the pending action.
/// Once the delay has elapsed the action is detached, so an in-flight
/// conversion is never cut short.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Replaces any pending action with `action`
    pub fn schedule<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            tokio::spawn(action);
        }));
    }

    /// Cancels the pending action, if any
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }

    /// True while an action is waiting out its delay
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Background tasks for the forced refresh and the label tick
///
/// Dropping the scheduler stops both tasks.
pub struct RefreshScheduler {
    tasks: Vec<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Spawns both periodic tasks; the first run of each is one period out
    pub fn start(
        converter: Arc<CurrencyConverter>,
        refresh_every: Duration,
        tick_every: Duration,
    ) -> Self {
        tracing::info!(
            refresh_interval_secs = refresh_every.as_secs(),
            tick_interval_secs = tick_every.as_secs(),
            "Starting refresh scheduler"
        );

        let refresh = {
            let converter = converter.clone();
            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + refresh_every, refresh_every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if converter.refresh().await.is_none() {
                        tracing::debug!("Forced refresh skipped, conversion in flight");
                    }
                }
            })
        };

        let tick = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + tick_every, tick_every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                converter.tick().await;
            }
        });

        Self {
            tasks: vec![refresh, tick],
        }
    }

    /// Stops both tasks
    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
