use log::{debug, info};
use serde::Deserialize;
use std::future::Future;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

pub const DEFAULT_FAST_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_NORMAL_INTERVAL_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshRate {
    Fast,
    #[default]
    Normal,
}

impl RefreshRate {
    pub fn toggled(self) -> Self {
        match self {
            RefreshRate::Fast => RefreshRate::Normal,
            RefreshRate::Normal => RefreshRate::Fast,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RefreshRate::Fast => "fast",
            RefreshRate::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPresets {
    pub fast: Duration,
    pub normal: Duration,
}

impl Default for RefreshPresets {
    fn default() -> Self {
        Self {
            fast: Duration::from_millis(DEFAULT_FAST_INTERVAL_MS),
            normal: Duration::from_millis(DEFAULT_NORMAL_INTERVAL_MS),
        }
    }
}

impl RefreshPresets {
    pub fn interval(&self, rate: RefreshRate) -> Duration {
        match rate {
            RefreshRate::Fast => self.fast,
            RefreshRate::Normal => self.normal,
        }
    }
}

/// Owned repeating timer. Dropping it cancels future ticks.
#[derive(Debug)]
struct TimerHandle(JoinHandle<()>);

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Drives the auto-refresh cycle of one log view.
///
/// At most one timer exists at a time. Each tick spawns its cycle as an
/// independent task, so a slow fetch never delays the next tick and
/// stopping does not cancel cycles that are already in flight.
#[derive(Debug)]
pub struct PollScheduler {
    rate: RefreshRate,
    presets: RefreshPresets,
    timer: Option<TimerHandle>,
}

impl PollScheduler {
    pub fn new(rate: RefreshRate, presets: RefreshPresets) -> Self {
        Self {
            rate,
            presets,
            timer: None,
        }
    }

    pub fn rate(&self) -> RefreshRate {
        self.rate
    }

    pub fn interval(&self) -> Duration {
        self.presets.interval(self.rate)
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Changes the cadence used by the next `start`. A running timer keeps
    /// its old cadence until restarted.
    pub fn set_rate(&mut self, rate: RefreshRate) {
        self.rate = rate;
    }

    /// Fires `cycle` immediately and then every `interval()`, replacing any
    /// timer that is already running.
    pub fn start<F, Fut>(&mut self, cycle: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();

        let period = self.interval();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                // first tick completes immediately
                ticker.tick().await;
                tokio::spawn(cycle());
            }
        });

        self.timer = Some(TimerHandle(handle));
        info!("Log auto-refresh started ({}, every {:?})", self.rate.label(), period);
    }

    pub fn stop(&mut self) {
        if self.timer.take().is_some() {
            info!("Log auto-refresh stopped");
        } else {
            debug!("Log auto-refresh already idle");
        }
    }
}
